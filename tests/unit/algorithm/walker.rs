//! Tests for depth-first walker steps

#[cfg(test)]
mod tests {

    use dungeonweave::DungeonError;
    use dungeonweave::algorithm::placement::{PlacementContext, PlacementStats, TransactionCounter};
    use dungeonweave::algorithm::selection::{DeclarationOrder, RandomSelector};
    use dungeonweave::algorithm::walker::{Walker, WalkerStatus, WalkerStep, extend};
    use dungeonweave::rooms::instance::PlacedRoomInstance;
    use dungeonweave::rooms::registry::{TemplateId, TemplateRegistry};
    use dungeonweave::rooms::template::{ConnectionPoint, RoomTemplate};
    use dungeonweave::spatial::grid::{DungeonGrid, RoomId};
    use dungeonweave::spatial::position::{Direction, GridPosition, Rotation};

    fn hall() -> RoomTemplate {
        RoomTemplate::from_layout(
            "hall",
            &["#+#", "+.+", "#+#"],
            vec![
                ConnectionPoint::new(1, 0, Direction::North, false),
                ConnectionPoint::new(2, 1, Direction::East, false),
                ConnectionPoint::new(1, 2, Direction::South, false),
                ConnectionPoint::new(0, 1, Direction::West, false),
            ],
        )
        .expect("hall layout is valid")
    }

    fn cap() -> RoomTemplate {
        RoomTemplate::from_layout(
            "cap",
            &["+"],
            vec![ConnectionPoint::new(0, 0, Direction::South, false)],
        )
        .expect("cap layout is valid")
    }

    /// Grid with a hall committed at `origin`
    fn grid_with_hall(width: usize, height: usize, origin: GridPosition) -> (DungeonGrid, RoomId) {
        let mut grid = DungeonGrid::with_size(width, height).expect("grid creation failed");
        let room = PlacedRoomInstance::new(TemplateId(0), &hall(), origin, Rotation::None);
        let id = grid.commit(room).expect("hall fits");
        (grid, id)
    }

    // Tests walker status follows its stack and budget
    #[test]
    fn test_new_walker_status() {
        let walker = Walker::new(2, RoomId(0), 5);
        assert_eq!(walker.id(), 2);
        assert_eq!(walker.current(), Some(RoomId(0)));
        assert_eq!(walker.rooms_placed(), 0);
        assert_eq!(walker.status(), WalkerStatus::Active);

        let spent = Walker::new(0, RoomId(0), 0);
        assert_eq!(spent.status(), WalkerStatus::Finished);
    }

    // Tests open connections exclude facing cells outside the grid
    #[test]
    fn test_open_connections_respect_bounds() {
        let (grid, id) = grid_with_hall(5, 3, GridPosition::new(1, 0));
        let walker = Walker::new(0, id, 10);
        let room = grid.room(id).expect("hall committed");
        let open = walker.open_connections(&grid, room);
        let directions: Vec<Direction> = open.iter().map(|c| c.direction).collect();
        assert_eq!(directions, vec![Direction::East, Direction::West]);
    }

    // Tests a successful step pushes the new room and counts it
    #[test]
    fn test_step_extends_from_current_room() {
        let (mut grid, id) = grid_with_hall(9, 9, GridPosition::new(3, 3));
        let registry = TemplateRegistry::new(vec![hall(), cap()]).expect("registry is valid");
        let mut selector = RandomSelector::new(4);
        let mut transactions = TransactionCounter::default();
        let mut stats = PlacementStats::default();
        let mut ctx = PlacementContext {
            grid: &mut grid,
            registry: &registry,
            ordering: &DeclarationOrder,
            selector: &mut selector,
            transactions: &mut transactions,
            stats: &mut stats,
        };

        let mut walker = Walker::new(0, id, 10);
        let step = walker.step(&mut ctx);
        assert!(matches!(step, WalkerStep::Extended(_)));
        assert_eq!(walker.rooms_placed(), 1);
        assert_eq!(walker.current(), Some(RoomId(1)));
        assert_eq!(ctx.grid.room_count(), 2);
    }

    // Tests unplaceable frontiers are abandoned once and then the walker backtracks
    // Verified by not recording abandoned connections
    #[test]
    fn test_abandon_then_backtrack() {
        let (mut grid, id) = grid_with_hall(5, 3, GridPosition::new(1, 0));
        let registry = TemplateRegistry::new(vec![hall()]).expect("registry is valid");
        let mut selector = RandomSelector::new(0);
        let mut transactions = TransactionCounter::default();
        let mut stats = PlacementStats::default();
        let mut ctx = PlacementContext {
            grid: &mut grid,
            registry: &registry,
            ordering: &DeclarationOrder,
            selector: &mut selector,
            transactions: &mut transactions,
            stats: &mut stats,
        };

        let mut walker = Walker::new(0, id, 10);
        for _ in 0..2 {
            assert!(matches!(
                walker.step(&mut ctx),
                WalkerStep::Abandoned {
                    reason: DungeonError::NoMatchingTemplate { .. },
                    ..
                }
            ));
        }
        assert!(matches!(walker.step(&mut ctx), WalkerStep::Backtracked(room) if room == id));
        assert_eq!(walker.status(), WalkerStatus::Finished);
        assert!(matches!(walker.step(&mut ctx), WalkerStep::Finished));
        assert_eq!(ctx.grid.room_count(), 1);
    }

    // Tests extend reports the cell and facing that nothing could fill
    #[test]
    fn test_extend_without_candidates() {
        let (mut grid, id) = grid_with_hall(5, 3, GridPosition::new(1, 0));
        let registry = TemplateRegistry::new(vec![hall()]).expect("registry is valid");
        let east = grid
            .room(id)
            .and_then(|room| room.opening(GridPosition::new(3, 1), Direction::East))
            .copied()
            .expect("hall has an east opening");
        let mut selector = RandomSelector::new(0);
        let mut transactions = TransactionCounter::default();
        let mut stats = PlacementStats::default();
        let mut ctx = PlacementContext {
            grid: &mut grid,
            registry: &registry,
            ordering: &DeclarationOrder,
            selector: &mut selector,
            transactions: &mut transactions,
            stats: &mut stats,
        };

        let result = extend(&mut ctx, &east);
        assert!(matches!(
            result,
            Err(DungeonError::NoMatchingTemplate {
                position: GridPosition { x: 4, y: 1 },
                direction: Direction::West,
            })
        ));
    }
}
