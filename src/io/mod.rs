/// Command-line interface and batch runner
pub mod cli;
/// Constants and generation configuration
pub mod configuration;
/// Error types and result alias
pub mod error;
/// Progress display for batches
pub mod progress;
