//! Shared placement path for walkers and external edits
//!
//! Connector rooms go through an `AtomicPlacementTransaction`; every other
//! room is committed directly once its footprint is legal and its required
//! connections, if any, already meet a matching opening.

use log::debug;

use crate::algorithm::selection::{CandidateOrdering, RandomSelector};
use crate::algorithm::transaction::{AtomicPlacementTransaction, TransactionOutcome};
use crate::io::error::{DungeonError, Result};
use crate::rooms::instance::{PlacedRoomInstance, WorldConnection};
use crate::rooms::registry::TemplateRegistry;
use crate::spatial::grid::{DungeonGrid, ReservedCells, RoomId, TransactionId};

/// Hands out transaction ids in increasing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionCounter {
    next: u64,
}

impl TransactionCounter {
    /// Allocate the next id
    pub const fn next_id(&mut self) -> TransactionId {
        let id = TransactionId(self.next);
        self.next += 1;
        id
    }

    /// Restart numbering from zero
    pub const fn reset(&mut self) {
        self.next = 0;
    }
}

/// Tallies of placement attempts within a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStats {
    /// Non-connector rooms committed directly
    pub direct_placements: usize,
    /// Transactions that reached `Committed`
    pub connectors_committed: usize,
    /// Neighbor rooms committed as part of a connector transaction
    pub rooms_filled: usize,
    /// Transactions that reached `RolledBack`
    pub transactions_rolled_back: usize,
}

/// Collaborators needed to place a room
pub struct PlacementContext<'a> {
    /// Grid receiving the rooms
    pub grid: &'a mut DungeonGrid,
    /// Templates available for connector fills
    pub registry: &'a TemplateRegistry,
    /// Order in which fill candidates are tried
    pub ordering: &'a dyn CandidateOrdering,
    /// Random source for the ordering
    pub selector: &'a mut RandomSelector,
    /// Transaction id source
    pub transactions: &'a mut TransactionCounter,
    /// Running tallies
    pub stats: &'a mut PlacementStats,
}

/// Rooms created by one successful placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The room that was asked for
    pub primary: RoomId,
    /// Neighbors committed to satisfy its required connections
    pub filled: Vec<RoomId>,
}

impl Placement {
    /// Total number of rooms created
    pub fn len(&self) -> usize {
        1 + self.filled.len()
    }

    /// Always false: a placement creates at least its primary room
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// All created room ids, primary first
    pub fn rooms(&self) -> Vec<RoomId> {
        std::iter::once(self.primary)
            .chain(self.filled.iter().copied())
            .collect()
    }
}

/// First required connection of `room` that `is_matched` rejects
pub fn first_unmatched_required<'r>(
    room: &'r PlacedRoomInstance,
    is_matched: impl Fn(&WorldConnection) -> bool,
) -> Option<&'r WorldConnection> {
    room.required_connections()
        .find(|connection| !is_matched(connection))
}

/// Place a room, atomically filling required connections for connectors
///
/// # Errors
///
/// Returns the placement conflict, the unmet required connection of a
/// non-connector, or the reason a connector transaction rolled back
pub fn place_room(ctx: &mut PlacementContext<'_>, room: PlacedRoomInstance) -> Result<Placement> {
    if room.is_connector() {
        let transaction = AtomicPlacementTransaction::new(ctx.transactions.next_id(), room);
        return match transaction.execute(ctx.grid, ctx.registry, ctx.ordering, ctx.selector) {
            TransactionOutcome::Committed {
                connector,
                neighbors,
                ..
            } => {
                ctx.stats.connectors_committed += 1;
                ctx.stats.rooms_filled += neighbors.len();
                Ok(Placement {
                    primary: connector,
                    filled: neighbors,
                })
            }
            TransactionOutcome::RolledBack { reason, .. } => {
                ctx.stats.transactions_rolled_back += 1;
                Err(reason)
            }
        };
    }

    ctx.grid
        .check_cells(room.cells().iter().copied(), ReservedCells::Reject)?;

    let grid = &*ctx.grid;
    if let Some(unmet) = first_unmatched_required(&room, |c| grid.has_matching_opening(c)) {
        return Err(DungeonError::RequiredConnectionUnsatisfiable {
            template: template_name(ctx.registry, &room),
            position: unmet.position,
            direction: unmet.direction,
        });
    }

    let origin = room.origin();
    let primary = ctx.grid.commit(room)?;
    ctx.stats.direct_placements += 1;
    debug!("Placed {primary} at {origin}");
    Ok(Placement {
        primary,
        filled: Vec::new(),
    })
}

/// Name of a room's template for diagnostics
pub fn template_name(registry: &TemplateRegistry, room: &PlacedRoomInstance) -> String {
    registry
        .get(room.template())
        .map_or_else(|| room.template().to_string(), |t| t.name().to_string())
}
