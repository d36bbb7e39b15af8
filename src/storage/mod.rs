//! Results persistence and the binary graph cache

use anyhow::{Context, Result};
use crate::community::metrics::size_distribution;
use crate::community::{CommunitySummary, Dendrogram, LouvainResult};
use crate::data::LoadedGraph;
use crate::graph::WeightedGraph;
use memmap2::Mmap;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Save analysis results to the specified directory
pub fn save_results(
    result: &LouvainResult,
    loaded: &LoadedGraph,
    summaries: &[CommunitySummary],
    output_dir: &Path,
) -> Result<()> {
    log::info!("Saving results to {}", output_dir.display());

    // Ensure output directory exists
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    save_summary(result, &loaded.graph, summaries, output_dir)?;
    save_levels(&result.dendrogram, output_dir)?;
    save_hierarchy(&result.dendrogram, loaded, output_dir)?;
    save_communities(summaries, loaded, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save summary information
fn save_summary(
    result: &LouvainResult,
    graph: &WeightedGraph,
    summaries: &[CommunitySummary],
    output_dir: &Path,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = output_dir.join("summary.json");
    let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let summary = json!({
        "graph_stats": {
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "total_weight": graph.total_weight(),
        },
        "quality": result.quality,
        "level_count": result.dendrogram.level_count(),
        "levels": result.levels,
        "community_sizes": size_distribution(summaries),
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Save the partition of every level
fn save_levels(dendrogram: &Dendrogram, output_dir: &Path) -> Result<()> {
    log::info!("Saving {} level partitions", dendrogram.level_count());

    let path = output_dir.join("levels.json");
    let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let levels = json!({
        "levels": dendrogram.levels().iter().enumerate().map(|(level, partition)| {
            json!({
                "level": level,
                "node_count": partition.len(),
                "community_count": partition.community_count(),
                "assignment": partition.assignment(),
            })
        }).collect::<Vec<_>>()
    });

    file.write_all(to_string_pretty(&levels)?.as_bytes())?;

    Ok(())
}

/// Save the cluster tree as JSON and CSV
fn save_hierarchy(dendrogram: &Dendrogram, loaded: &LoadedGraph, output_dir: &Path) -> Result<()> {
    log::info!("Saving cluster hierarchy");

    let tree = dendrogram.cluster_tree();

    let json_path = output_dir.join("hierarchy.json");
    let mut json_file =
        File::create(&json_path).with_context(|| format!("creating {}", json_path.display()))?;
    json_file.write_all(to_string_pretty(&json!({ "clusters": tree }))?.as_bytes())?;

    let csv_path = output_dir.join("hierarchy.csv");
    let mut csv_file = BufWriter::new(
        File::create(&csv_path).with_context(|| format!("creating {}", csv_path.display()))?,
    );

    writeln!(csv_file, "id,height,parent,label")?;
    for cluster in &tree {
        let parent = cluster.parent.map(|p| p.to_string()).unwrap_or_default();
        let label = cluster
            .node
            .map(|node| loaded.label(node as usize).to_string())
            .unwrap_or_default();
        writeln!(csv_file, "{},{},{},{}", cluster.id, cluster.height, parent, label)?;
    }
    csv_file.flush()?;

    Ok(())
}

/// Save individual community information
fn save_communities(
    summaries: &[CommunitySummary],
    loaded: &LoadedGraph,
    output_dir: &Path,
) -> Result<()> {
    log::info!("Saving {} community summaries", summaries.len());

    let path = output_dir.join("communities.json");
    let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let resolve = |nodes: &[u32]| -> Vec<u64> {
        nodes.iter().map(|&n| loaded.label(n as usize)).collect()
    };

    let communities = json!({
        "communities": summaries.iter().map(|c| {
            json!({
                "id": c.id,
                "size": c.size,
                "internal_weight": c.internal_weight,
                "total_degree": c.total_degree,
                "density": c.density,
                "central_nodes": resolve(&c.central_nodes),
                "members": resolve(&c.members),
            })
        }).collect::<Vec<_>>()
    });

    file.write_all(to_string_pretty(&communities)?.as_bytes())?;

    Ok(())
}

/// Write the `new old` label relation of a renumbered graph
pub fn save_relation(labels: &[u64], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut file = BufWriter::new(file);
    for (node, label) in labels.iter().enumerate() {
        writeln!(file, "{} {}", node, label)?;
    }
    file.flush()?;
    Ok(())
}

/// Write every level as `node community` lines, levels separated by a header
pub fn write_partitions<W: Write>(dendrogram: &Dendrogram, mut out: W) -> Result<()> {
    for (level, partition) in dendrogram.levels().iter().enumerate() {
        writeln!(out, "# level {}", level)?;
        for (node, community) in partition.assignment().iter().enumerate() {
            writeln!(out, "{} {}", node, community)?;
        }
    }
    Ok(())
}

/// Serialize a graph to the binary cache format
pub fn save_graph_binary(graph: &WeightedGraph, path: &Path) -> Result<()> {
    log::info!("Writing binary graph to {}", path.display());

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, graph).context("encoding graph")?;
    writer.flush()?;

    Ok(())
}

/// Load a graph from the binary cache format and re-check its invariants
pub fn load_graph_binary(path: &Path) -> Result<WeightedGraph> {
    log::info!("Reading binary graph from {}", path.display());

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    // Safety: the mapping is read-only and dropped before returning.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mapping {}", path.display()))?;

    let graph: WeightedGraph = bincode::deserialize(&mmap[..])
        .map_err(crate::error::LouvainError::from)
        .with_context(|| format!("decoding {}", path.display()))?;
    graph
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;

    Ok(graph)
}
