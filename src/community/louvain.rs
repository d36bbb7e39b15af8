//! Multi-level Louvain driver
//!
//! Each level optimizes the current graph locally, then collapses its
//! communities into the next, coarser graph. The loop stops when a level no
//! longer improves the partition, the graph has shrunk to a single node, or
//! the level cap is reached.

use crate::community::{aggregate, one_level, Dendrogram, Partition, QualityFunction, RunContext};
use crate::config::LouvainConfig;
use crate::error::{LouvainError, Result};
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};

/// Statistics of one recorded level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    pub level: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub total_weight: f64,
    pub community_count: usize,
    /// Quality of this level's partition
    pub quality: f64,
    pub passes: usize,
    pub moves: usize,
}

/// Output of a complete run
#[derive(Debug, Clone)]
pub struct LouvainResult {
    pub dendrogram: Dendrogram,
    /// Quality of the top-level partition
    pub quality: f64,
    pub levels: Vec<LevelStats>,
    /// Graph of every recorded level, when retention is enabled
    pub graphs: Vec<WeightedGraph>,
}

impl LouvainResult {
    /// Top-level community of every original node
    pub fn final_assignment(&self) -> Vec<u32> {
        self.dendrogram.final_assignment()
    }
}

/// Louvain community detection
#[derive(Debug, Clone)]
pub struct Louvain {
    config: LouvainConfig,
}

impl Louvain {
    pub fn new(config: LouvainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LouvainConfig {
        &self.config
    }

    /// Run every level on `graph` with a fresh context
    pub fn run(&self, graph: &WeightedGraph) -> Result<LouvainResult> {
        let mut ctx = RunContext::new(&self.config)?;
        self.run_with(&mut ctx, graph)
    }

    /// Run every level on `graph` using a caller supplied context
    pub fn run_with(&self, ctx: &mut RunContext, graph: &WeightedGraph) -> Result<LouvainResult> {
        log::info!(
            "Computing communities with {} on {} nodes, {} edges, total weight {}",
            ctx.quality().name(),
            graph.node_count(),
            graph.edge_count(),
            graph.total_weight()
        );

        let mut dendrogram = Dendrogram::new();
        let mut levels = Vec::new();
        let mut graphs = Vec::new();
        let mut quality = ctx
            .quality()
            .global_quality(graph, &Partition::singletons(graph.node_count()));

        let mut coarse: Option<WeightedGraph> = None;

        loop {
            let current = coarse.as_ref().unwrap_or(graph);
            let level = dendrogram.level_count();
            ctx.set_level(level);

            log::debug!(
                "level {}: {} nodes, {} edges, total weight {}",
                level,
                current.node_count(),
                current.edge_count(),
                current.total_weight()
            );

            let initial = Partition::singletons(current.node_count());
            let outcome = match one_level(ctx, current, &initial) {
                Ok(outcome) => outcome,
                Err(err) => return Err(abort(level, dendrogram, err)),
            };

            let stats = LevelStats {
                level,
                node_count: current.node_count(),
                edge_count: current.edge_count(),
                total_weight: current.total_weight(),
                community_count: outcome.partition.community_count(),
                quality: outcome.quality_after,
                passes: outcome.passes,
                moves: outcome.moves,
            };

            let collapsed = outcome.partition.community_count() < current.node_count();
            let gained = outcome.quality_after - outcome.quality_before >= ctx.precision();

            if !outcome.improved || !(collapsed || gained) {
                // Keep a trivial level so every run yields a hierarchy.
                if dendrogram.is_empty() {
                    quality = outcome.quality_after;
                    dendrogram.push(outcome.partition)?;
                    levels.push(stats);
                    if self.config.retain_graphs {
                        graphs.push(current.clone());
                    }
                }
                log::info!("level {}: no further improvement", level);
                break;
            }

            let next = match aggregate(current, &outcome.partition, level) {
                Ok(next) => next,
                Err(err) => return Err(abort(level, dendrogram, err)),
            };

            log::info!(
                "level {}: {} nodes -> {} communities, quality {:.6} -> {:.6}",
                level,
                current.node_count(),
                outcome.partition.community_count(),
                outcome.quality_before,
                outcome.quality_after
            );

            quality = outcome.quality_after;
            dendrogram.push(outcome.partition)?;
            levels.push(stats);
            if self.config.retain_graphs {
                graphs.push(current.clone());
            }
            coarse = Some(next);

            if coarse.as_ref().map_or(true, |g| g.node_count() <= 1) {
                log::info!("graph collapsed to a single community");
                break;
            }
            if self.config.max_levels.map_or(false, |max| dendrogram.level_count() >= max) {
                log::info!("reached the level cap of {}", dendrogram.level_count());
                break;
            }
        }

        log::info!(
            "Finished with {} levels, {} top-level communities, quality {:.6}",
            dendrogram.level_count(),
            dendrogram.top_community_count(),
            quality
        );

        Ok(LouvainResult {
            dendrogram,
            quality,
            levels,
            graphs,
        })
    }
}

fn abort(level: usize, partial: Dendrogram, err: LouvainError) -> LouvainError {
    log::error!("level {} failed: {}", level, err);
    LouvainError::Aborted {
        level,
        partial,
        source: Box::new(err),
    }
}
