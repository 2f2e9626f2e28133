//! Tests for the seeded selector and candidate ordering strategies

#[cfg(test)]
mod tests {

    use dungeonweave::algorithm::selection::{
        CandidateOrdering, DeclarationOrder, OrderingPolicy, RandomSelector, WeightedOrder,
    };
    use dungeonweave::rooms::registry::{TemplateId, TemplateRegistry};
    use dungeonweave::rooms::template::{ConnectionPoint, RoomTemplate};
    use dungeonweave::spatial::position::Direction;

    fn corridor(name: &str, weight: f64) -> RoomTemplate {
        RoomTemplate::from_layout(
            name,
            &["+", ".", "+"],
            vec![
                ConnectionPoint::new(0, 0, Direction::North, false),
                ConnectionPoint::new(0, 2, Direction::South, false),
            ],
        )
        .and_then(|template| template.with_weight(weight))
        .expect("corridor layout is valid")
    }

    fn skewed_registry() -> TemplateRegistry {
        TemplateRegistry::new(vec![corridor("light", 0.001), corridor("heavy", 1000.0)])
            .expect("registry is valid")
    }

    // Tests same seed yields the same sequence
    #[test]
    fn test_selector_is_deterministic() {
        let mut a = RandomSelector::new(17);
        let mut b = RandomSelector::new(17);
        for _ in 0..32 {
            assert_eq!(a.index(10), b.index(10));
        }
        assert_eq!(a.index(0), 0);
    }

    // Tests unit samples stay in the half-open interval (0, 1]
    #[test]
    fn test_unit_range() {
        let mut selector = RandomSelector::new(3);
        for _ in 0..1000 {
            let u = selector.unit();
            assert!(u > 0.0 && u <= 1.0);
            assert!(u.ln().is_finite());
        }
    }

    // Tests weighted choice never picks zero-weight entries
    // Verified by returning the first index unconditionally
    #[test]
    fn test_weighted_choice_skips_zero_weights() {
        let mut selector = RandomSelector::new(5);
        for _ in 0..100 {
            assert_eq!(selector.weighted_choice(&[0.0, 2.0, 0.0]), 1);
        }
        assert_eq!(selector.weighted_choice(&[]), 0);
    }

    // Tests declaration order passes candidates through untouched
    #[test]
    fn test_declaration_order_is_identity() {
        let registry = skewed_registry();
        let candidates = registry.candidates_facing(Direction::North);
        let mut selector = RandomSelector::new(0);
        let ordered = DeclarationOrder.arrange(candidates, &registry, &mut selector);
        assert_eq!(ordered, candidates.to_vec());
    }

    // Tests weighted order is a permutation that prefers heavy templates
    // Verified by dividing by the weight's reciprocal
    #[test]
    fn test_weighted_order_prefers_heavy_templates() {
        let registry = skewed_registry();
        let candidates = registry.candidates_facing(Direction::North);
        assert_eq!(candidates.len(), 2);

        for seed in 0..50 {
            let mut selector = RandomSelector::new(seed);
            let ordered = WeightedOrder.arrange(candidates, &registry, &mut selector);
            assert_eq!(ordered.len(), candidates.len());
            assert!(candidates.iter().all(|c| ordered.contains(c)));
            assert_eq!(ordered.first().map(|c| c.template), Some(TemplateId(1)));
        }
    }

    // Tests weighted order replays for a fixed seed
    #[test]
    fn test_weighted_order_is_reproducible() {
        let registry = TemplateRegistry::builtin().expect("built-in templates are valid");
        let candidates = registry.candidates_facing(Direction::East);
        let first = WeightedOrder.arrange(candidates, &registry, &mut RandomSelector::new(99));
        let second = WeightedOrder.arrange(candidates, &registry, &mut RandomSelector::new(99));
        assert_eq!(first, second);
    }

    // Tests policy names parse from configuration JSON
    #[test]
    fn test_ordering_policy_serialization() {
        let policy: OrderingPolicy = serde_json::from_str("\"declaration\"").expect("valid policy");
        assert_eq!(policy, OrderingPolicy::Declaration);
        assert_eq!(OrderingPolicy::default(), OrderingPolicy::Weighted);

        let registry = skewed_registry();
        let candidates = registry.candidates_facing(Direction::South);
        let ordering = policy.ordering();
        let ordered = ordering.arrange(candidates, &registry, &mut RandomSelector::new(1));
        assert_eq!(ordered, candidates.to_vec());
    }
}
