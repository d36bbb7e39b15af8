use anyhow::{bail, Context, Result};
use clap::Parser;
use louvain_hierarchy::community::metrics::{size_distribution, summarize_communities};
use louvain_hierarchy::config::{LouvainConfig, MoveOrder};
use louvain_hierarchy::data::{self, LoadedGraph};
use louvain_hierarchy::graph::GraphKind;
use louvain_hierarchy::{storage, Louvain, LouvainError};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "louvain-hierarchy",
    about = "Multilevel Louvain community detection on edge-list graphs"
)]
struct Cli {
    /// Path to input edge list (or binary graph with --binary-in)
    #[clap(long)]
    input: PathBuf,

    /// Read a third column as edge weight
    #[clap(long)]
    weighted: bool,

    /// Renumber node labels densely and write the `new old` relation here
    #[clap(long)]
    renumber: Option<PathBuf>,

    /// Output directory for results
    #[clap(long, default_value = "louvain_results")]
    output_dir: PathBuf,

    /// Write the loaded graph to this binary cache file
    #[clap(long)]
    binary_out: Option<PathBuf>,

    /// Treat the input as a binary cache file
    #[clap(long)]
    binary_in: bool,

    /// Minimum quality gain for a pass or level to count as improving
    #[clap(long)]
    precision: Option<f64>,

    /// Maximum number of levels to record
    #[clap(long)]
    max_levels: Option<usize>,

    /// Maximum number of passes per level
    #[clap(long)]
    max_passes: Option<usize>,

    /// Node visiting order within a pass
    #[clap(long, value_enum)]
    order: Option<MoveOrder>,

    /// Seed for the random visiting order
    #[clap(long)]
    seed: Option<u64>,

    /// Modularity resolution parameter
    #[clap(long)]
    resolution: Option<f64>,

    /// JSON configuration file; command-line values take precedence
    #[clap(long)]
    config: Option<PathBuf>,

    /// Print the graph of this level to stdout
    #[clap(long, short = 'l')]
    display_level: Option<usize>,

    /// Print the partition of every level to stdout
    #[clap(long)]
    print_partitions: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    /// Configuration file values overridden by any explicit flags
    fn louvain_config(&self) -> Result<LouvainConfig> {
        let mut config = match &self.config {
            Some(path) => LouvainConfig::from_json_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => LouvainConfig::default(),
        };

        if let Some(precision) = self.precision {
            config = config.with_precision(precision);
        }
        if let Some(resolution) = self.resolution {
            config = config.with_resolution(resolution);
        }
        if let Some(max_levels) = self.max_levels {
            config = config.with_max_levels(max_levels);
        }
        if let Some(max_passes) = self.max_passes {
            config = config.with_max_passes(max_passes);
        }
        if let Some(order) = self.order {
            config = config.with_move_order(order);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.display_level.is_some() {
            config = config.with_retained_graphs(true);
        }

        config.validate()?;
        Ok(config)
    }

    fn load_graph(&self) -> Result<LoadedGraph> {
        if self.binary_in {
            if self.renumber.is_some() {
                bail!("--renumber cannot be combined with --binary-in");
            }
            let graph = storage::load_graph_binary(&self.input)?;
            return Ok(LoadedGraph { graph, labels: None });
        }

        let kind = if self.weighted {
            GraphKind::Weighted
        } else {
            GraphKind::Unweighted
        };
        let edges = data::load_edge_list(&self.input, kind)
            .with_context(|| format!("reading {}", self.input.display()))?;
        let loaded = data::build_graph(&edges, self.renumber.is_some())?;

        if let (Some(path), Some(labels)) = (&self.renumber, &loaded.labels) {
            storage::save_relation(labels, path)?;
            log::info!("Wrote label relation to {}", path.display());
        }

        Ok(loaded)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = args.louvain_config()?;

    log::info!("Starting community detection");
    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output_dir.display());

    // 1. Load data
    let loaded = args.load_graph()?;

    if let Some(path) = &args.binary_out {
        storage::save_graph_binary(&loaded.graph, path)?;
    }

    // 2. Run Louvain
    let louvain = Louvain::new(config)?;
    let result = match louvain.run(&loaded.graph) {
        Ok(result) => result,
        Err(LouvainError::Aborted { level, partial, source }) => {
            log::error!(
                "Run aborted at level {} after {} recorded levels",
                level,
                partial.level_count()
            );
            return Err(LouvainError::Aborted { level, partial, source }.into());
        }
        Err(err) => return Err(err.into()),
    };

    log::info!(
        "Found {} levels, {} top-level communities",
        result.dendrogram.level_count(),
        result.dendrogram.top_community_count()
    );

    // 3. Requested stdout output
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(level) = args.display_level {
        match result.graphs.get(level) {
            Some(graph) => write!(out, "{}", graph)?,
            None => bail!(
                "display level {} out of range, run has {} levels",
                level,
                result.graphs.len()
            ),
        }
    }

    if args.print_partitions {
        storage::write_partitions(&result.dendrogram, &mut out)?;
    }

    // 4. Summarize and save results
    let summaries = summarize_communities(&loaded.graph, &result.final_assignment());
    let sizes = size_distribution(&summaries);
    log::info!(
        "Community sizes: min {}, max {}, mean {:.2}, {} singletons",
        sizes.min,
        sizes.max,
        sizes.mean,
        sizes.singletons
    );

    storage::save_results(&result, &loaded, &summaries, &args.output_dir)?;

    writeln!(out, "{}", result.quality)?;

    log::info!("Analysis complete. Results saved to {}", args.output_dir.display());

    Ok(())
}
