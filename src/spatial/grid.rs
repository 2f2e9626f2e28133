//! Shared occupancy and reservation store for the dungeon
//!
//! Every cell inside the bounds is `Free`, `Occupied` by one committed room,
//! or `Reserved` by one in-flight transaction. Cells are stored in a dense
//! array offset from world coordinates by the minimum bounds corner.

use ndarray::Array2;
use std::collections::BTreeMap;
use std::fmt;

use crate::io::configuration::{MAX_COORDINATE, MAX_GRID_DIMENSION};
use crate::io::error::{DungeonError, Result, invalid_parameter};
use crate::rooms::instance::{PlacedRoomInstance, WorldConnection};
use crate::rooms::template::RoomTemplate;
use crate::spatial::position::{BoundingBox, GridPosition};

/// Identifier of a committed room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// Identifier of a placement transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// State of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    /// Available for placement
    #[default]
    Free,
    /// Covered by a committed room
    Occupied(RoomId),
    /// Held by an in-flight transaction
    Reserved(TransactionId),
}

/// How placement checks treat reserved cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedCells {
    /// Any reserved cell rejects the placement
    Reject,
    /// Cells reserved by this transaction are accepted
    IgnoreOwnedBy(TransactionId),
}

/// Dungeon grid holding committed rooms and transaction reservations
#[derive(Debug, Clone, PartialEq)]
pub struct DungeonGrid {
    bounds: BoundingBox,
    /// Indexed by `(y - min.y, x - min.x)`
    cells: Array2<CellState>,
    rooms: BTreeMap<RoomId, PlacedRoomInstance>,
    next_room: u32,
}

impl DungeonGrid {
    /// Create an empty grid covering `bounds`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the bounds are inverted, reach beyond
    /// `MAX_COORDINATE`, or exceed `MAX_GRID_DIMENSION` along either axis
    pub fn new(bounds: BoundingBox) -> Result<Self> {
        if bounds.max.x < bounds.min.x || bounds.max.y < bounds.min.y {
            return Err(invalid_parameter(
                "bounds",
                &format!("{}..={}", bounds.min, bounds.max),
                &"maximum corner must not precede minimum corner",
            ));
        }
        let corners = [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y];
        if corners.iter().any(|c| c.unsigned_abs() > MAX_COORDINATE) {
            return Err(invalid_parameter(
                "bounds",
                &format!("{}..={}", bounds.min, bounds.max),
                &format!("coordinates are limited to +/-{MAX_COORDINATE}"),
            ));
        }
        let (width, height) = (bounds.width(), bounds.height());
        if width > MAX_GRID_DIMENSION || height > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "bounds",
                &format!("{width}x{height}"),
                &format!("dimensions are limited to {MAX_GRID_DIMENSION}"),
            ));
        }

        Ok(Self {
            bounds,
            cells: Array2::from_elem((height, width), CellState::Free),
            rooms: BTreeMap::new(),
            next_room: 0,
        })
    }

    /// Create an empty `width` x `height` grid with its minimum corner at the origin
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if either dimension is zero or too large
    pub fn with_size(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "dimensions",
                &format!("{width}x{height}"),
                &"grid needs at least one cell",
            ));
        }
        if width > MAX_GRID_DIMENSION || height > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "dimensions",
                &format!("{width}x{height}"),
                &format!("dimensions are limited to {MAX_GRID_DIMENSION}"),
            ));
        }
        Self::new(BoundingBox::from_size(width, height))
    }

    /// Configured closed bounds
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn index(&self, pos: GridPosition) -> Option<(usize, usize)> {
        if !self.bounds.contains(pos) {
            return None;
        }
        Some((
            (pos.y - self.bounds.min.y) as usize,
            (pos.x - self.bounds.min.x) as usize,
        ))
    }

    /// Cell state, `None` outside the bounds
    pub fn state(&self, pos: GridPosition) -> Option<CellState> {
        self.index(pos)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Whether a cell is inside the bounds and free
    pub fn is_free(&self, pos: GridPosition) -> bool {
        self.state(pos) == Some(CellState::Free)
    }

    /// Check that every cell can take a new room
    ///
    /// # Errors
    ///
    /// Returns the first `OutOfBounds`, `CellOccupied` or `CellReserved` found
    pub fn check_cells(
        &self,
        positions: impl IntoIterator<Item = GridPosition>,
        reserved: ReservedCells,
    ) -> Result<()> {
        for position in positions {
            match self.state(position) {
                None => return Err(DungeonError::OutOfBounds { position }),
                Some(CellState::Free) => {}
                Some(CellState::Occupied(room)) => {
                    return Err(DungeonError::CellOccupied { position, room });
                }
                Some(CellState::Reserved(transaction)) => {
                    if reserved != ReservedCells::IgnoreOwnedBy(transaction) {
                        return Err(DungeonError::CellReserved {
                            position,
                            transaction,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Check whether an oriented template fits at `origin`
    ///
    /// # Errors
    ///
    /// Returns the reason the placement is illegal
    pub fn check_placement(
        &self,
        template: &RoomTemplate,
        origin: GridPosition,
        reserved: ReservedCells,
    ) -> Result<()> {
        self.check_cells(template.footprint().map(|local| origin + local), reserved)
    }

    /// Whether an oriented template fits at `origin`
    pub fn can_place(
        &self,
        template: &RoomTemplate,
        origin: GridPosition,
        reserved: ReservedCells,
    ) -> bool {
        self.check_placement(template, origin, reserved).is_ok()
    }

    /// Reserve cells for a transaction, all or nothing
    ///
    /// # Errors
    ///
    /// Returns `CellConflict` if any cell is outside the bounds or not free;
    /// no cell is changed in that case
    pub fn reserve(&mut self, positions: &[GridPosition], transaction: TransactionId) -> Result<()> {
        if let Some(&position) = positions.iter().find(|&&pos| !self.is_free(pos)) {
            return Err(DungeonError::CellConflict { position });
        }
        for &position in positions {
            if let Some(index) = self.index(position) {
                if let Some(cell) = self.cells.get_mut(index) {
                    *cell = CellState::Reserved(transaction);
                }
            }
        }
        Ok(())
    }

    /// Return reserved cells to free, leaving any other cell untouched
    ///
    /// Returns the number of cells released.
    pub fn unreserve(&mut self, positions: &[GridPosition]) -> usize {
        let mut released = 0;
        for &position in positions {
            let Some(index) = self.index(position) else {
                continue;
            };
            if let Some(cell) = self.cells.get_mut(index) {
                if matches!(cell, CellState::Reserved(_)) {
                    *cell = CellState::Free;
                    released += 1;
                }
            }
        }
        released
    }

    /// Cells currently reserved by a transaction, in row-major order
    pub fn reserved_by(&self, transaction: TransactionId) -> Vec<GridPosition> {
        self.positions_matching(|state| state == CellState::Reserved(transaction))
    }

    /// All reserved cells, in row-major order
    pub fn reserved_positions(&self) -> Vec<GridPosition> {
        self.positions_matching(|state| matches!(state, CellState::Reserved(_)))
    }

    fn positions_matching(&self, predicate: impl Fn(CellState) -> bool) -> Vec<GridPosition> {
        self.cells
            .indexed_iter()
            .filter(|&(_, &state)| predicate(state))
            .map(|((row, col), _)| {
                GridPosition::new(
                    self.bounds.min.x + col as i32,
                    self.bounds.min.y + row as i32,
                )
            })
            .collect()
    }

    /// Make a room permanent
    ///
    /// Cells may be free or reserved; reserved cells are taken over.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` or `CellOccupied` without changing any cell
    pub fn commit(&mut self, instance: PlacedRoomInstance) -> Result<RoomId> {
        for &position in instance.cells() {
            match self.state(position) {
                None => return Err(DungeonError::OutOfBounds { position }),
                Some(CellState::Occupied(room)) => {
                    return Err(DungeonError::CellOccupied { position, room });
                }
                Some(CellState::Free | CellState::Reserved(_)) => {}
            }
        }

        let id = RoomId(self.next_room);
        self.next_room += 1;
        for &position in instance.cells() {
            if let Some(index) = self.index(position) {
                if let Some(cell) = self.cells.get_mut(index) {
                    *cell = CellState::Occupied(id);
                }
            }
        }
        self.rooms.insert(id, instance);
        Ok(id)
    }

    /// Remove a committed room, returning its cells to free
    pub fn remove(&mut self, id: RoomId) -> Option<PlacedRoomInstance> {
        let instance = self.rooms.remove(&id)?;
        for &position in instance.cells() {
            if let Some(index) = self.index(position) {
                if let Some(cell) = self.cells.get_mut(index) {
                    if *cell == CellState::Occupied(id) {
                        *cell = CellState::Free;
                    }
                }
            }
        }
        Some(instance)
    }

    /// Committed room by id
    pub fn room(&self, id: RoomId) -> Option<&PlacedRoomInstance> {
        self.rooms.get(&id)
    }

    /// Committed room covering a cell
    pub fn room_at(&self, pos: GridPosition) -> Option<(RoomId, &PlacedRoomInstance)> {
        match self.state(pos)? {
            CellState::Occupied(id) => self.rooms.get(&id).map(|room| (id, room)),
            CellState::Free | CellState::Reserved(_) => None,
        }
    }

    /// All committed rooms in commit order
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &PlacedRoomInstance)> + '_ {
        self.rooms.iter().map(|(&id, room)| (id, room))
    }

    /// Number of committed rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Mapping from every occupied cell to its room
    pub fn layout(&self) -> BTreeMap<GridPosition, RoomId> {
        self.rooms
            .iter()
            .flat_map(|(&id, room)| room.cells().iter().map(move |&pos| (pos, id)))
            .collect()
    }

    /// Whether a committed room has the opening that pairs with `connection`
    pub fn has_matching_opening(&self, connection: &WorldConnection) -> bool {
        self.room_at(connection.facing_cell())
            .is_some_and(|(_, room)| room.accepts(connection))
    }

    /// Remove all rooms and reservations
    ///
    /// The grid is indistinguishable from a freshly created one afterwards.
    pub fn clear(&mut self) {
        self.cells.fill(CellState::Free);
        self.rooms.clear();
        self.next_room = 0;
    }
}
