//! Tests for the generation driver and its editing operations

#[cfg(test)]
mod tests {

    use dungeonweave::DungeonError;
    use dungeonweave::algorithm::generator::DungeonGenerator;
    use dungeonweave::algorithm::validation::{find_orphaned_connectors, is_connected};
    use dungeonweave::io::configuration::GenerationConfig;
    use dungeonweave::rooms::registry::TemplateRegistry;
    use dungeonweave::spatial::grid::DungeonGrid;
    use dungeonweave::spatial::position::{BoundingBox, GridPosition, Rotation};
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn generator(width: usize, height: usize) -> DungeonGenerator {
        let registry = Arc::new(TemplateRegistry::builtin().expect("built-in templates are valid"));
        DungeonGenerator::new(registry, BoundingBox::from_size(width, height))
            .expect("generator creation failed")
    }

    /// A 5x3 grid fits the hall and nothing next to it
    fn cramped_config(retry_budget: usize) -> GenerationConfig {
        GenerationConfig {
            width: 5,
            height: 3,
            walker_count: 1,
            retry_budget,
            start_template: Some("hall".to_string()),
            ..GenerationConfig::default()
        }
    }

    // Tests a default run grows a connected dungeon with no orphans or leaks
    #[test]
    fn test_default_generation() {
        let config = GenerationConfig::default();
        let mut generator = generator(config.width, config.height);
        let report = generator.generate(&config).expect("generation succeeds");

        assert_eq!(report.seed, config.seed);
        assert!(report.rooms_placed > 1);
        assert_eq!(report.rooms_placed, generator.grid().room_count());
        assert_eq!(generator.walkers().len(), config.walker_count);
        assert!(find_orphaned_connectors(generator.grid()).is_empty());
        assert!(generator.grid().reserved_positions().is_empty());
        assert!(is_connected(generator.grid()));
    }

    // Tests the same seed reproduces the same layout
    // Verified by seeding the selector from the clock
    #[test]
    fn test_generation_is_deterministic() {
        let config = GenerationConfig {
            seed: 1234,
            ..GenerationConfig::default()
        };
        let mut first = generator(config.width, config.height);
        let mut second = generator(config.width, config.height);
        let a = first.generate(&config).expect("generation succeeds");
        let b = second.generate(&config).expect("generation succeeds");
        assert_eq!(a, b);
        assert_eq!(first.layout(), second.layout());

        let again = first.generate(&config).expect("generation succeeds");
        assert_eq!(again, a);
        assert_eq!(first.layout(), second.layout());
    }

    // Tests the room limit counts the start room
    #[test]
    fn test_single_room_limit() {
        let config = GenerationConfig {
            max_rooms: 1,
            ..GenerationConfig::default()
        };
        let mut generator = generator(config.width, config.height);
        let report = generator.generate(&config).expect("generation succeeds");
        assert_eq!(report.rooms_placed, 1);
        assert_eq!(report.walker_steps, 0);
    }

    // Tests failures beyond the retry budget stop the run
    // Verified by comparing the budget with >= instead of >
    #[test]
    fn test_retry_budget_exhaustion() {
        let mut generator = generator(5, 3);
        let result = generator.generate(&cramped_config(0));
        assert!(matches!(
            result,
            Err(DungeonError::RetryBudgetExhausted {
                failed_attempts: 1,
                rooms_placed: 1,
            })
        ));
        assert!(generator.grid().reserved_positions().is_empty());
    }

    // Tests a boxed-in walker abandons both frontiers then backtracks out
    #[test]
    fn test_confined_walker_finishes() {
        let mut generator = generator(5, 3);
        let report = generator
            .generate(&cramped_config(10))
            .expect("generation finishes");
        assert_eq!(report.rooms_placed, 1);
        assert_eq!(report.frontiers_abandoned, 2);
        assert_eq!(report.backtracks, 1);
        assert_eq!(report.walker_steps, 3);
        assert_eq!(report.failed_attempts(), 2);
    }

    // Tests cancellation stops between steps and keeps committed rooms
    #[test]
    fn test_cancellation() {
        let config = GenerationConfig::default();
        let mut generator = generator(config.width, config.height);
        let cancel = AtomicBool::new(true);
        let result = generator.generate_with_cancellation(&config, &cancel);
        assert!(matches!(result, Err(DungeonError::Cancelled { rooms_placed: 1 })));
        assert_eq!(generator.grid().room_count(), 1);
        assert!(generator.grid().reserved_positions().is_empty());
    }

    // Tests start template errors
    #[test]
    fn test_start_template_errors() {
        let mut generator = generator(40, 40);
        let unknown = GenerationConfig {
            start_template: Some("vault".to_string()),
            ..GenerationConfig::default()
        };
        assert!(matches!(
            generator.generate(&unknown),
            Err(DungeonError::UnknownTemplate { .. })
        ));

        let too_small = GenerationConfig {
            width: 2,
            height: 2,
            start_template: Some("hall".to_string()),
            ..GenerationConfig::default()
        };
        assert!(matches!(
            generator.generate(&too_small),
            Err(DungeonError::StartPlacementFailed { .. })
        ));
    }

    // Tests invalid configurations are refused before anything is placed
    #[test]
    fn test_invalid_config() {
        let mut generator = generator(10, 10);
        let config = GenerationConfig {
            walker_count: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            generator.generate(&config),
            Err(DungeonError::InvalidParameter { .. })
        ));
        assert_eq!(generator.grid().room_count(), 0);
    }

    // Tests the editing operations and clearing
    #[test]
    fn test_manual_placement_and_clear() {
        let mut generator = generator(9, 9);
        let fresh = DungeonGrid::new(BoundingBox::from_size(9, 9)).expect("grid creation failed");
        let hall = generator.registry().require("hall").expect("hall exists");
        let bridge = generator.registry().require("bridge").expect("bridge exists");
        let origin = GridPosition::new(3, 5);

        assert!(generator.can_place_room(hall, origin, Rotation::None));
        let rooms = generator
            .place_room(hall, origin, Rotation::None)
            .expect("hall fits");
        assert_eq!(rooms.len(), 1);
        assert!(!generator.can_place_room(hall, origin, Rotation::None));
        assert!(generator.room_at(GridPosition::new(4, 6)).is_some());
        assert_eq!(generator.layout().len(), 9);

        // Bridge north of the hall gets one neighbor at its far end
        let placed = generator
            .place_room(bridge, GridPosition::new(4, 2), Rotation::None)
            .expect("bridge fits between hall and a northern neighbor");
        assert_eq!(placed.len(), 2);
        assert!(find_orphaned_connectors(generator.grid()).is_empty());
        assert_eq!(generator.rooms().count(), 3);

        generator.clear_dungeon();
        assert_eq!(generator.grid(), &fresh);
        assert!(generator.walkers().is_empty());
    }
}
