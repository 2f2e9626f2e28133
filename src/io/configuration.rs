//! Generation constants and runtime configuration defaults

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algorithm::selection::OrderingPolicy;
use crate::io::error::{DungeonError, Result, invalid_parameter};
use crate::spatial::position::BoundingBox;

// Default values for configurable parameters
/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;
/// Default grid width in cells
pub const DEFAULT_GRID_WIDTH: usize = 40;
/// Default grid height in cells
pub const DEFAULT_GRID_HEIGHT: usize = 40;
/// Default number of walkers per run
pub const DEFAULT_WALKER_COUNT: usize = 3;
/// Default total room limit per run, including the start room
pub const DEFAULT_MAX_ROOMS: usize = 60;
/// Default room limit per walker
pub const DEFAULT_ROOMS_PER_WALKER: usize = 30;
/// Default number of rollbacks and abandoned frontiers tolerated per run
pub const DEFAULT_RETRY_BUDGET: usize = 1000;
/// Default number of consecutive seeds processed by the CLI
pub const DEFAULT_RUNS: usize = 1;

// Safety limits to prevent excessive memory allocation
/// Maximum allowed grid dimension
pub const MAX_GRID_DIMENSION: usize = 4096;
/// Largest coordinate magnitude allowed for grid bounds
///
/// Leaves headroom for facing cells and template offsets next to the bounds.
pub const MAX_COORDINATE: u32 = 1 << 30;
/// Maximum number of walkers per run
pub const MAX_WALKERS: usize = 64;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Parameters for one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed for every stochastic choice in the run
    pub seed: u64,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Number of walkers started from the first room
    pub walker_count: usize,
    /// Total room limit, including the start room
    pub max_rooms: usize,
    /// Room limit for a single walker
    pub rooms_per_walker: usize,
    /// Rollbacks plus abandoned frontiers tolerated before giving up
    pub retry_budget: usize,
    /// Order in which matching templates are tried
    pub ordering: OrderingPolicy,
    /// Name of the first room's template; weighted pick among templates
    /// without required connections when absent
    pub start_template: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            walker_count: DEFAULT_WALKER_COUNT,
            max_rooms: DEFAULT_MAX_ROOMS,
            rooms_per_walker: DEFAULT_ROOMS_PER_WALKER,
            retry_budget: DEFAULT_RETRY_BUDGET,
            ordering: OrderingPolicy::default(),
            start_template: None,
        }
    }
}

impl GenerationConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| DungeonError::FileSystem {
            path: path.to_path_buf(),
            operation: "read configuration",
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| DungeonError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every parameter against its limits
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "width",
                &self.width,
                &format!("must be between 1 and {MAX_GRID_DIMENSION}"),
            ));
        }
        if self.height == 0 || self.height > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "height",
                &self.height,
                &format!("must be between 1 and {MAX_GRID_DIMENSION}"),
            ));
        }
        if self.walker_count == 0 || self.walker_count > MAX_WALKERS {
            return Err(invalid_parameter(
                "walker_count",
                &self.walker_count,
                &format!("must be between 1 and {MAX_WALKERS}"),
            ));
        }
        if self.max_rooms == 0 {
            return Err(invalid_parameter(
                "max_rooms",
                &self.max_rooms,
                &"must allow at least the start room",
            ));
        }
        if self.rooms_per_walker == 0 {
            return Err(invalid_parameter(
                "rooms_per_walker",
                &self.rooms_per_walker,
                &"must be positive",
            ));
        }
        Ok(())
    }

    /// Grid bounds covering `width` x `height` cells from the origin
    pub const fn bounds(&self) -> BoundingBox {
        BoundingBox::from_size(self.width, self.height)
    }
}
