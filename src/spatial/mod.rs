//! Spatial data structures
//!
//! This module contains spatial-related functionality including:
//! - Positions, directions and rotations
//! - The occupancy and reservation grid

/// Occupancy and reservation grid
pub mod grid;
/// Positions, directions, rotations and bounds
pub mod position;

pub use grid::DungeonGrid;
