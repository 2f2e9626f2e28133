//! Seeded random source and pluggable candidate ordering
//!
//! Every stochastic decision in a run draws from one `RandomSelector`, so a
//! fixed seed replays the same sequence of choices and the same dungeon.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::rooms::registry::{ConnectionCandidate, TemplateRegistry};

/// Seeded random selector for reproducible stochastic choices
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Create a deterministic random selector
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform index into a collection of `len` items, 0 when empty
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.random_range(0..len)
    }

    /// Uniform sample from the half-open interval `(0, 1]`
    pub fn unit(&mut self) -> f64 {
        1.0 - self.rng.random::<f64>()
    }

    /// Weighted random selection
    ///
    /// Returns index into weights array using cumulative distribution
    pub fn weighted_choice(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0;
        }

        let mut rand_val = self.rng.random::<f64>() * total;
        for (i, &weight) in weights.iter().enumerate() {
            rand_val -= weight;
            if rand_val <= 0.0 {
                return i;
            }
        }
        weights.len() - 1
    }
}

/// Strategy deciding the order in which matching candidates are tried
///
/// Implementations must be deterministic for a given selector state.
pub trait CandidateOrdering {
    /// Return `candidates` in the order they should be tried
    fn arrange(
        &self,
        candidates: &[ConnectionCandidate],
        registry: &TemplateRegistry,
        selector: &mut RandomSelector,
    ) -> Vec<ConnectionCandidate>;
}

/// Registry declaration order; ignores the random source
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationOrder;

impl CandidateOrdering for DeclarationOrder {
    fn arrange(
        &self,
        candidates: &[ConnectionCandidate],
        _registry: &TemplateRegistry,
        _selector: &mut RandomSelector,
    ) -> Vec<ConnectionCandidate> {
        candidates.to_vec()
    }
}

/// Weighted random permutation by template weight
///
/// Each candidate draws `u` from `(0, 1]` and is keyed by `ln(u) / weight`;
/// sorting keys in descending order samples without replacement in
/// proportion to weight. Equal keys keep declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedOrder;

impl CandidateOrdering for WeightedOrder {
    fn arrange(
        &self,
        candidates: &[ConnectionCandidate],
        registry: &TemplateRegistry,
        selector: &mut RandomSelector,
    ) -> Vec<ConnectionCandidate> {
        let mut keyed: Vec<(f64, usize, ConnectionCandidate)> = candidates
            .iter()
            .enumerate()
            .map(|(index, &candidate)| {
                let weight = registry
                    .get(candidate.template)
                    .map_or(1.0, |template| template.weight());
                (selector.unit().ln() / weight, index, candidate)
            })
            .collect();

        keyed.sort_by(|a, b| match b.0.total_cmp(&a.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            ordering => ordering,
        });

        keyed.into_iter().map(|(_, _, candidate)| candidate).collect()
    }
}

/// Named candidate ordering strategies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Try candidates in registry declaration order
    Declaration,
    /// Weighted random permutation by template weight
    #[default]
    Weighted,
}

impl OrderingPolicy {
    /// Strategy implementing this policy
    pub fn ordering(self) -> Box<dyn CandidateOrdering> {
        match self {
            Self::Declaration => Box::new(DeclarationOrder),
            Self::Weighted => Box::new(WeightedOrder),
        }
    }
}
