//! Error types for grid, template and generation operations

use std::fmt;
use std::path::PathBuf;

use crate::spatial::grid::{RoomId, TransactionId};
use crate::spatial::position::{Direction, GridPosition};

/// Main error type for all dungeon operations
#[derive(Debug)]
pub enum DungeonError {
    /// Candidate footprint leaves the configured grid bounds
    OutOfBounds {
        /// First footprint cell found outside the bounds
        position: GridPosition,
    },

    /// Target cell already belongs to a committed room
    CellOccupied {
        /// The occupied cell
        position: GridPosition,
        /// Room holding the cell
        room: RoomId,
    },

    /// Target cell is held by an in-flight transaction
    CellReserved {
        /// The reserved cell
        position: GridPosition,
        /// Transaction holding the reservation
        transaction: TransactionId,
    },

    /// Reservation requested on a cell that is not free
    CellConflict {
        /// The conflicting cell
        position: GridPosition,
    },

    /// No template or rotation fits a frontier connection point
    NoMatchingTemplate {
        /// Cell the new room would have to cover
        position: GridPosition,
        /// Direction the new room's opening would have to face
        direction: Direction,
    },

    /// A connector's required connection could not be filled
    RequiredConnectionUnsatisfiable {
        /// Name of the connector template
        template: String,
        /// Cell carrying the required connection
        position: GridPosition,
        /// Direction of the required connection
        direction: Direction,
    },

    /// Template lookup by name or id failed
    UnknownTemplate {
        /// Name or id that was requested
        name: String,
    },

    /// Template definition is malformed
    InvalidTemplate {
        /// Template name
        name: String,
        /// Explanation of what is wrong
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// The first room of a run could not be placed
    StartPlacementFailed {
        /// Name of the start template
        template: String,
    },

    /// Too many rollbacks and abandoned frontiers in a single run
    ///
    /// The grid keeps whatever was placed before the budget ran out.
    RetryBudgetExhausted {
        /// Failed attempts counted when generation stopped
        failed_attempts: usize,
        /// Rooms committed before generation stopped
        rooms_placed: usize,
    },

    /// Generation was cancelled by the caller
    Cancelled {
        /// Rooms committed before cancellation
        rooms_placed: usize,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Template registry or configuration file could not be parsed
    Parse {
        /// Path of the file being parsed
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },
}

impl DungeonError {
    /// Whether the engine recovers from this error locally
    ///
    /// Placement and fill failures only roll back the current transaction or
    /// abandon the current frontier; everything else ends the operation.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. }
                | Self::CellOccupied { .. }
                | Self::CellReserved { .. }
                | Self::CellConflict { .. }
                | Self::NoMatchingTemplate { .. }
                | Self::RequiredConnectionUnsatisfiable { .. }
        )
    }
}

impl fmt::Display for DungeonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { position } => {
                write!(f, "Position {position} is outside the grid bounds")
            }
            Self::CellOccupied { position, room } => {
                write!(f, "Position {position} is occupied by {room}")
            }
            Self::CellReserved {
                position,
                transaction,
            } => {
                write!(
                    f,
                    "Position {position} is reserved by {transaction}"
                )
            }
            Self::CellConflict { position } => {
                write!(f, "Cannot reserve position {position}: cell is not free")
            }
            Self::NoMatchingTemplate {
                position,
                direction,
            } => {
                write!(
                    f,
                    "No template fits at {position} with an opening facing {direction}"
                )
            }
            Self::RequiredConnectionUnsatisfiable {
                template,
                position,
                direction,
            } => {
                write!(
                    f,
                    "Required {direction} connection of '{template}' at {position} cannot be satisfied"
                )
            }
            Self::UnknownTemplate { name } => write!(f, "Unknown template '{name}'"),
            Self::InvalidTemplate { name, reason } => {
                write!(f, "Invalid template '{name}': {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::StartPlacementFailed { template } => {
                write!(f, "Start room '{template}' could not be placed")
            }
            Self::RetryBudgetExhausted {
                failed_attempts,
                rooms_placed,
            } => {
                write!(
                    f,
                    "Retry budget exhausted after {failed_attempts} failed attempts ({rooms_placed} rooms placed)"
                )
            }
            Self::Cancelled { rooms_placed } => {
                write!(f, "Generation cancelled ({rooms_placed} rooms placed)")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Parse { path, source } => {
                write!(f, "Failed to parse '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DungeonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileSystem { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for dungeon results
pub type Result<T> = std::result::Result<T, DungeonError>;

impl From<std::io::Error> for DungeonError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> DungeonError {
    DungeonError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
