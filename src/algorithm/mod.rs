/// Generation driver and run reports
pub mod generator;
/// Shared placement path for walkers and external edits
pub mod placement;
/// Seeded randomness and candidate ordering strategies
pub mod selection;
/// Atomic placement of connector rooms
pub mod transaction;
/// Structural checks over finished grids
pub mod validation;
/// Depth-first walkers
pub mod walker;
