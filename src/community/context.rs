//! State shared by every level of one run

use crate::community::Quality;
use crate::config::{LouvainConfig, MoveOrder};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Run context threaded through the optimizer
///
/// Owns the selected quality function and the random source, so levels can be
/// optimized independently and runs are reproducible given a seed.
#[derive(Debug, Clone)]
pub struct RunContext {
    quality: Quality,
    precision: f64,
    max_passes: Option<usize>,
    move_order: MoveOrder,
    rng: StdRng,
    level: usize,
}

impl RunContext {
    pub fn new(config: &LouvainConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            quality: Quality::from_kind(config.quality_function, config.resolution),
            precision: config.precision,
            max_passes: config.max_passes,
            move_order: config.move_order,
            rng,
            level: 0,
        })
    }

    pub fn quality(&self) -> &Quality {
        &self.quality
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn max_passes(&self) -> Option<usize> {
        self.max_passes
    }

    /// Level currently being optimized, used in diagnostics
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn set_level(&mut self, level: usize) {
        self.level = level;
    }

    /// Node visitation order for one level
    pub fn visit_order(&mut self, node_count: usize) -> Vec<u32> {
        let mut order: Vec<u32> = (0..node_count as u32).collect();
        if self.move_order == MoveOrder::Random {
            order.shuffle(&mut self.rng);
        }
        order
    }
}
