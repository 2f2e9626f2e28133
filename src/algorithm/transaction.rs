//! All-or-nothing placement of connector rooms
//!
//! A connector only makes sense together with the neighbors on its required
//! connections. The transaction reserves the connector's footprint, finds and
//! reserves a neighbor for every required connection that is still open, and
//! then commits everything at once. Any failure releases every reservation
//! it made, so the grid is left exactly as it was found.

use log::{debug, trace};
use std::collections::HashSet;
use std::fmt;

use crate::algorithm::placement::{first_unmatched_required, template_name};
use crate::algorithm::selection::{CandidateOrdering, RandomSelector};
use crate::io::error::{DungeonError, Result, invalid_parameter};
use crate::rooms::instance::{PlacedRoomInstance, WorldConnection};
use crate::rooms::registry::TemplateRegistry;
use crate::spatial::grid::{DungeonGrid, ReservedCells, RoomId, TransactionId};
use crate::spatial::position::GridPosition;

/// Lifecycle of a placement transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Created, nothing reserved yet
    Pending,
    /// Connector footprint reserved
    Reserved,
    /// Required neighbors being searched and reserved
    Filling,
    /// All rooms committed
    Committed,
    /// All reservations released
    RolledBack,
}

impl TransactionStatus {
    /// Whether the transaction can make no further progress
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Reserved => "reserved",
            Self::Filling => "filling",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        };
        f.write_str(name)
    }
}

/// Final result of running a transaction
#[derive(Debug)]
pub enum TransactionOutcome {
    /// The connector and its neighbors are on the grid
    Committed {
        /// Transaction that ran
        transaction: TransactionId,
        /// The connector room
        connector: RoomId,
        /// Neighbors placed for required connections, in fill order
        neighbors: Vec<RoomId>,
    },
    /// Nothing was placed and every reservation was released
    RolledBack {
        /// Transaction that ran
        transaction: TransactionId,
        /// Why the transaction failed
        reason: DungeonError,
    },
}

impl TransactionOutcome {
    /// Terminal status of the transaction
    pub const fn status(&self) -> TransactionStatus {
        match self {
            Self::Committed { .. } => TransactionStatus::Committed,
            Self::RolledBack { .. } => TransactionStatus::RolledBack,
        }
    }

    /// Whether the transaction committed
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Committed room ids, connector first; empty after a rollback
    pub fn rooms(&self) -> Vec<RoomId> {
        match self {
            Self::Committed {
                connector,
                neighbors,
                ..
            } => std::iter::once(*connector)
                .chain(neighbors.iter().copied())
                .collect(),
            Self::RolledBack { .. } => Vec::new(),
        }
    }
}

/// Atomic placement of a connector room and its required neighbors
#[derive(Debug, Clone)]
pub struct AtomicPlacementTransaction {
    id: TransactionId,
    connector: PlacedRoomInstance,
    /// Cells reserved so far, in reservation order
    held: Vec<GridPosition>,
    held_set: HashSet<GridPosition>,
    provisional: Vec<PlacedRoomInstance>,
    status: TransactionStatus,
}

impl AtomicPlacementTransaction {
    /// Create a pending transaction for `connector`
    pub fn new(id: TransactionId, connector: PlacedRoomInstance) -> Self {
        Self {
            id,
            connector,
            held: Vec::new(),
            held_set: HashSet::new(),
            provisional: Vec::new(),
            status: TransactionStatus::Pending,
        }
    }

    /// Transaction id used to tag reservations
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// Current lifecycle status
    pub const fn status(&self) -> TransactionStatus {
        self.status
    }

    /// The connector being placed
    pub const fn connector(&self) -> &PlacedRoomInstance {
        &self.connector
    }

    /// Neighbors chosen so far, in fill order
    pub fn provisional(&self) -> &[PlacedRoomInstance] {
        &self.provisional
    }

    /// Cells this transaction holds, in reservation order
    pub fn held_positions(&self) -> &[GridPosition] {
        &self.held
    }

    fn expect_status(&self, expected: TransactionStatus, step: &'static str) -> Result<()> {
        if self.status == expected {
            return Ok(());
        }
        Err(invalid_parameter(
            "status",
            &self.status,
            &format!("{step} requires a {expected} transaction"),
        ))
    }

    fn hold(&mut self, positions: &[GridPosition]) {
        for &position in positions {
            if self.held_set.insert(position) {
                self.held.push(position);
            }
        }
    }

    /// Reserve the connector's footprint
    ///
    /// # Errors
    ///
    /// Returns `CellConflict` if any footprint cell is not free, or
    /// `InvalidParameter` if the transaction is not pending
    pub fn reserve(&mut self, grid: &mut DungeonGrid) -> Result<()> {
        self.expect_status(TransactionStatus::Pending, "reserve")?;
        grid.reserve(self.connector.cells(), self.id)?;
        let cells = self.connector.cells().to_vec();
        self.hold(&cells);
        self.status = TransactionStatus::Reserved;
        trace!("{} reserved {} connector cells", self.id, cells.len());
        Ok(())
    }

    /// Whether an opening is matched by a committed room or by a room of
    /// this transaction
    fn is_matched(&self, grid: &DungeonGrid, connection: &WorldConnection) -> bool {
        grid.has_matching_opening(connection)
            || self.connector.accepts(connection)
            || self.provisional.iter().any(|room| room.accepts(connection))
    }

    /// Find and reserve a neighbor for every unmatched required connection
    ///
    /// Required connections are handled in declaration order; ones already
    /// matched by a committed or provisional room are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RequiredConnectionUnsatisfiable` for the first required
    /// connection no candidate can fill, or `InvalidParameter` if the
    /// connector has not been reserved
    pub fn fill(
        &mut self,
        grid: &mut DungeonGrid,
        registry: &TemplateRegistry,
        ordering: &dyn CandidateOrdering,
        selector: &mut RandomSelector,
    ) -> Result<()> {
        self.expect_status(TransactionStatus::Reserved, "fill")?;
        self.status = TransactionStatus::Filling;

        let required: Vec<WorldConnection> =
            self.connector.required_connections().copied().collect();
        for connection in required {
            if self.is_matched(grid, &connection) {
                continue;
            }

            let neighbor = self
                .find_neighbor(grid, registry, ordering, selector, &connection)
                .ok_or_else(|| DungeonError::RequiredConnectionUnsatisfiable {
                    template: template_name(registry, &self.connector),
                    position: connection.position,
                    direction: connection.direction,
                })?;

            grid.reserve(neighbor.cells(), self.id)?;
            let cells = neighbor.cells().to_vec();
            self.hold(&cells);
            trace!(
                "{} filled {} {} with {} at {}",
                self.id,
                connection.direction,
                connection.position,
                template_name(registry, &neighbor),
                neighbor.origin()
            );
            self.provisional.push(neighbor);
        }
        Ok(())
    }

    /// First candidate that attaches to `connection` legally
    ///
    /// A candidate must fit the grid, stay clear of cells this transaction
    /// already holds, and have each of its own required connections matched
    /// by a committed room or a room of this transaction.
    fn find_neighbor(
        &self,
        grid: &DungeonGrid,
        registry: &TemplateRegistry,
        ordering: &dyn CandidateOrdering,
        selector: &mut RandomSelector,
        connection: &WorldConnection,
    ) -> Option<PlacedRoomInstance> {
        let candidates = registry.candidates_facing(connection.direction.opposite());
        let ordered = ordering.arrange(candidates, registry, selector);

        ordered.into_iter().find_map(|candidate| {
            let (variant, point) = registry.resolve(&candidate)?;
            let origin = connection.facing_cell() - point.position;
            if !grid.can_place(variant, origin, ReservedCells::IgnoreOwnedBy(self.id)) {
                return None;
            }

            let neighbor =
                PlacedRoomInstance::new(candidate.template, variant, origin, candidate.rotation);
            if neighbor.cells().iter().any(|cell| self.held_set.contains(cell)) {
                return None;
            }
            if first_unmatched_required(&neighbor, |c| self.is_matched(grid, c)).is_some() {
                return None;
            }
            Some(neighbor)
        })
    }

    /// Commit the connector and its neighbors
    ///
    /// Reservations are turned into occupied cells and any leftover
    /// reservation is released. Should a commit fail part way, rooms already
    /// committed are removed and the transaction rolls back instead.
    pub fn commit(self, grid: &mut DungeonGrid) -> TransactionOutcome {
        if let Err(reason) = self.expect_status(TransactionStatus::Filling, "commit") {
            return self.rollback(grid, reason);
        }

        let Self {
            id,
            connector,
            held,
            provisional,
            ..
        } = self;

        let mut committed = Vec::with_capacity(provisional.len() + 1);
        for room in std::iter::once(connector).chain(provisional) {
            match grid.commit(room) {
                Ok(room_id) => committed.push(room_id),
                Err(reason) => {
                    for room_id in committed {
                        grid.remove(room_id);
                    }
                    grid.unreserve(&held);
                    debug!("{id} rolled back during commit: {reason}");
                    return TransactionOutcome::RolledBack {
                        transaction: id,
                        reason,
                    };
                }
            }
        }
        grid.unreserve(&held);

        let mut rooms = committed.into_iter();
        match rooms.next() {
            Some(connector) => {
                let neighbors: Vec<RoomId> = rooms.collect();
                debug!(
                    "{id} committed {connector} with {} neighbors",
                    neighbors.len()
                );
                TransactionOutcome::Committed {
                    transaction: id,
                    connector,
                    neighbors,
                }
            }
            None => TransactionOutcome::RolledBack {
                transaction: id,
                reason: invalid_parameter("rooms", &0, &"commit placed no rooms"),
            },
        }
    }

    /// Release every reservation and discard provisional rooms
    pub fn rollback(self, grid: &mut DungeonGrid, reason: DungeonError) -> TransactionOutcome {
        let released = grid.unreserve(&self.held);
        debug!(
            "{} rolled back, released {released} cells: {reason}",
            self.id
        );
        TransactionOutcome::RolledBack {
            transaction: self.id,
            reason,
        }
    }

    /// Reserve, fill and commit, rolling back on the first failure
    pub fn execute(
        mut self,
        grid: &mut DungeonGrid,
        registry: &TemplateRegistry,
        ordering: &dyn CandidateOrdering,
        selector: &mut RandomSelector,
    ) -> TransactionOutcome {
        if let Err(reason) = self.reserve(grid) {
            return self.rollback(grid, reason);
        }
        if let Err(reason) = self.fill(grid, registry, ordering, selector) {
            return self.rollback(grid, reason);
        }
        self.commit(grid)
    }
}
