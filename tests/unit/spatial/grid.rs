//! Tests for the occupancy and reservation grid

#[cfg(test)]
mod tests {

    use dungeonweave::DungeonError;
    use dungeonweave::io::configuration::MAX_COORDINATE;
    use dungeonweave::rooms::instance::{PlacedRoomInstance, WorldConnection};
    use dungeonweave::rooms::registry::TemplateId;
    use dungeonweave::rooms::template::{ConnectionPoint, RoomTemplate};
    use dungeonweave::spatial::grid::{CellState, DungeonGrid, ReservedCells, RoomId, TransactionId};
    use dungeonweave::spatial::position::{BoundingBox, Direction, GridPosition, Rotation};

    fn corridor() -> Option<RoomTemplate> {
        RoomTemplate::from_layout(
            "corridor",
            &["+", ".", "+"],
            vec![
                ConnectionPoint::new(0, 0, Direction::North, false),
                ConnectionPoint::new(0, 2, Direction::South, false),
            ],
        )
        .ok()
    }

    fn corridor_at(x: i32, y: i32) -> Option<PlacedRoomInstance> {
        let template = corridor()?;
        Some(PlacedRoomInstance::new(
            TemplateId(0),
            &template,
            GridPosition::new(x, y),
            Rotation::None,
        ))
    }

    // Tests zero and oversized dimensions are rejected
    #[test]
    fn test_with_size_rejects_bad_dimensions() {
        assert!(DungeonGrid::with_size(0, 5).is_err());
        assert!(DungeonGrid::with_size(5, 0).is_err());
        assert!(DungeonGrid::with_size(100_000, 5).is_err());
        assert!(DungeonGrid::with_size(5, 5).is_ok());
    }

    // Tests bounds whose extent or edges overflow coordinates are rejected
    // Verified by computing the extent before checking the corners
    #[test]
    fn test_new_rejects_bounds_at_coordinate_limits() {
        let huge = BoundingBox {
            min: GridPosition::new(0, 0),
            max: GridPosition::new(i32::MAX, 3),
        };
        assert!(matches!(
            DungeonGrid::new(huge),
            Err(DungeonError::InvalidParameter { .. })
        ));

        let east_edge = BoundingBox {
            min: GridPosition::new(i32::MAX - 19, 0),
            max: GridPosition::new(i32::MAX, 3),
        };
        assert!(DungeonGrid::new(east_edge).is_err());

        let west_edge = BoundingBox {
            min: GridPosition::new(i32::MIN, i32::MIN),
            max: GridPosition::new(i32::MIN + 3, i32::MIN + 3),
        };
        assert!(DungeonGrid::new(west_edge).is_err());
    }

    // Tests openings at the outermost accepted cells can be checked
    #[test]
    fn test_edge_openings_at_coordinate_limit() {
        let limit = MAX_COORDINATE as i32;
        let bounds = BoundingBox {
            min: GridPosition::new(limit - 19, -limit),
            max: GridPosition::new(limit, -limit + 3),
        };
        let grid = DungeonGrid::new(bounds).expect("bounds within the coordinate limit");
        assert_eq!(grid.bounds().width(), 20);
        assert_eq!(grid.bounds().height(), 4);

        let east = WorldConnection {
            position: GridPosition::new(limit, -limit),
            direction: Direction::East,
            required: true,
        };
        let north = WorldConnection {
            position: GridPosition::new(limit, -limit),
            direction: Direction::North,
            required: true,
        };
        assert!(!grid.has_matching_opening(&east));
        assert!(!grid.has_matching_opening(&north));
        assert!(!grid.is_free(east.facing_cell()));
    }

    // Tests cells outside the bounds have no state
    #[test]
    fn test_state_outside_bounds_is_none() {
        let grid = DungeonGrid::with_size(3, 3).expect("grid creation failed");
        assert_eq!(grid.state(GridPosition::new(0, 0)), Some(CellState::Free));
        assert_eq!(grid.state(GridPosition::new(3, 0)), None);
        assert_eq!(grid.state(GridPosition::new(0, -1)), None);
        assert!(!grid.is_free(GridPosition::new(-1, 0)));
    }

    // Tests reservation is all or nothing
    // Verified by writing reservations before checking every cell
    #[test]
    fn test_reserve_is_atomic() {
        let mut grid = DungeonGrid::with_size(3, 3).expect("grid creation failed");
        let before = grid.clone();

        let cells = [
            GridPosition::new(0, 0),
            GridPosition::new(1, 0),
            GridPosition::new(3, 0),
        ];
        let result = grid.reserve(&cells, TransactionId(1));
        assert!(matches!(result, Err(DungeonError::CellConflict { .. })));
        assert_eq!(grid, before);

        assert!(grid.reserve(&cells[..2], TransactionId(1)).is_ok());
        assert_eq!(grid.reserved_by(TransactionId(1)).len(), 2);

        let overlap = grid.reserve(&[GridPosition::new(1, 0)], TransactionId(2));
        assert!(matches!(overlap, Err(DungeonError::CellConflict { .. })));
    }

    // Tests reserved cells block placement unless owned by the asking transaction
    #[test]
    fn test_reserved_cells_reject_other_placements() {
        let mut grid = DungeonGrid::with_size(3, 5).expect("grid creation failed");
        let template = corridor().expect("template creation failed");
        let reserved = GridPosition::new(1, 2);
        assert!(grid.reserve(&[reserved], TransactionId(4)).is_ok());

        let origin = GridPosition::new(1, 1);
        let result = grid.check_placement(&template, origin, ReservedCells::Reject);
        assert!(matches!(
            result,
            Err(DungeonError::CellReserved {
                transaction: TransactionId(4),
                ..
            })
        ));
        assert!(!grid.can_place(&template, origin, ReservedCells::IgnoreOwnedBy(TransactionId(5))));
        assert!(grid.can_place(&template, origin, ReservedCells::IgnoreOwnedBy(TransactionId(4))));
    }

    // Tests unreserve only releases reserved cells
    #[test]
    fn test_unreserve_leaves_occupied_cells() {
        let mut grid = DungeonGrid::with_size(3, 5).expect("grid creation failed");
        let room = corridor_at(0, 0).expect("room creation failed");
        let id = grid.commit(room).expect("commit failed");
        assert!(grid.reserve(&[GridPosition::new(2, 2)], TransactionId(0)).is_ok());

        let released = grid.unreserve(&[GridPosition::new(0, 0), GridPosition::new(2, 2)]);
        assert_eq!(released, 1);
        assert_eq!(grid.state(GridPosition::new(0, 0)), Some(CellState::Occupied(id)));
        assert!(grid.reserved_positions().is_empty());
    }

    // Tests commit takes over reserved cells and assigns sequential ids
    #[test]
    fn test_commit_over_reservation() {
        let mut grid = DungeonGrid::with_size(3, 5).expect("grid creation failed");
        let room = corridor_at(1, 1).expect("room creation failed");
        assert!(grid.reserve(room.cells(), TransactionId(9)).is_ok());

        let id = grid.commit(room).expect("commit failed");
        assert_eq!(id, RoomId(0));
        assert!(grid.reserved_positions().is_empty());
        assert_eq!(grid.room_count(), 1);
        assert_eq!(grid.room_at(GridPosition::new(1, 3)).map(|(found, _)| found), Some(id));

        let overlapping = corridor_at(1, 0).expect("room creation failed");
        assert!(matches!(
            grid.commit(overlapping),
            Err(DungeonError::CellOccupied { room: RoomId(0), .. })
        ));
        assert_eq!(grid.room_count(), 1);
    }

    // Tests out-of-bounds commits change nothing
    #[test]
    fn test_commit_out_of_bounds_is_rejected() {
        let mut grid = DungeonGrid::with_size(3, 3).expect("grid creation failed");
        let before = grid.clone();
        let room = corridor_at(1, 1).expect("room creation failed");
        assert!(matches!(
            grid.commit(room),
            Err(DungeonError::OutOfBounds { .. })
        ));
        assert_eq!(grid, before);
    }

    // Tests the layout map and matching-opening lookup
    #[test]
    fn test_layout_and_matching_openings() {
        let mut grid = DungeonGrid::with_size(3, 6).expect("grid creation failed");
        let upper = corridor_at(1, 0).expect("room creation failed");
        let lower = corridor_at(1, 3).expect("room creation failed");
        let south = upper.connections().get(1).copied();
        assert!(grid.commit(upper).is_ok());

        let south = south.expect("corridor has two connections");
        assert!(!grid.has_matching_opening(&south));

        assert!(grid.commit(lower).is_ok());
        assert!(grid.has_matching_opening(&south));

        let layout = grid.layout();
        assert_eq!(layout.len(), 6);
        assert_eq!(layout.get(&GridPosition::new(1, 4)), Some(&RoomId(1)));
    }

    // Tests removal frees cells and clear restores a fresh grid
    // Verified by leaving the room counter untouched in clear
    #[test]
    fn test_remove_and_clear() {
        let mut grid = DungeonGrid::with_size(3, 5).expect("grid creation failed");
        let fresh = grid.clone();
        let room = corridor_at(0, 0).expect("room creation failed");
        let id = grid.commit(room).expect("commit failed");
        assert!(grid.reserve(&[GridPosition::new(2, 4)], TransactionId(3)).is_ok());

        assert!(grid.remove(id).is_some());
        assert!(grid.remove(id).is_none());
        assert!(grid.is_free(GridPosition::new(0, 1)));

        grid.clear();
        assert_eq!(grid, fresh);
    }
}
