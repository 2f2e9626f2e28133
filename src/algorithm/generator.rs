//! Generation driver
//!
//! Places the start room in the middle of the grid, spawns walkers on it and
//! steps them round-robin until the room limit is reached, every walker has
//! finished, or the retry budget runs out.

use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::algorithm::placement::{
    Placement, PlacementContext, PlacementStats, TransactionCounter, place_room,
};
use crate::algorithm::selection::{DeclarationOrder, RandomSelector};
use crate::algorithm::validation;
use crate::algorithm::walker::{Walker, WalkerStatus, WalkerStep};
use crate::io::configuration::GenerationConfig;
use crate::io::error::{DungeonError, Result};
use crate::rooms::instance::PlacedRoomInstance;
use crate::rooms::registry::{TemplateId, TemplateRegistry};
use crate::spatial::grid::{DungeonGrid, ReservedCells, RoomId};
use crate::spatial::position::{BoundingBox, GridPosition, Rotation};

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Seed the run used
    pub seed: u64,
    /// Committed rooms, including the start room
    pub rooms_placed: usize,
    /// Connector transactions that committed
    pub connectors_committed: usize,
    /// Connector transactions that rolled back
    pub transactions_rolled_back: usize,
    /// Frontier connections given up on
    pub frontiers_abandoned: usize,
    /// Rooms popped by walkers with nothing left to extend
    pub backtracks: usize,
    /// Walker steps taken
    pub walker_steps: usize,
}

impl GenerationReport {
    /// Rollbacks plus abandoned frontiers
    pub const fn failed_attempts(&self) -> usize {
        self.transactions_rolled_back + self.frontiers_abandoned
    }
}

/// Drives walkers over a grid using a shared template registry
#[derive(Debug)]
pub struct DungeonGenerator {
    registry: Arc<TemplateRegistry>,
    grid: DungeonGrid,
    walkers: Vec<Walker>,
    transactions: TransactionCounter,
}

impl DungeonGenerator {
    /// Create a generator with an empty grid covering `bounds`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the bounds are unusable
    pub fn new(registry: Arc<TemplateRegistry>, bounds: BoundingBox) -> Result<Self> {
        Ok(Self {
            registry,
            grid: DungeonGrid::new(bounds)?,
            walkers: Vec::new(),
            transactions: TransactionCounter::default(),
        })
    }

    /// Template registry shared with other generators
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Current grid
    pub const fn grid(&self) -> &DungeonGrid {
        &self.grid
    }

    /// Walkers of the last run
    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    /// Run generation to completion
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the start room
    /// cannot be placed, or the retry budget is exhausted
    pub fn generate(&mut self, config: &GenerationConfig) -> Result<GenerationReport> {
        self.generate_with_cancellation(config, &AtomicBool::new(false))
    }

    /// Run generation, stopping between walker steps once `cancel` is set
    ///
    /// The grid keeps every room committed before the stop; no reservation
    /// outlives the call.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` when stopped, otherwise as `generate`
    pub fn generate_with_cancellation(
        &mut self,
        config: &GenerationConfig,
        cancel: &AtomicBool,
    ) -> Result<GenerationReport> {
        config.validate()?;
        let bounds = config.bounds();
        if self.grid.bounds() == bounds {
            self.clear_dungeon();
        } else {
            self.grid = DungeonGrid::new(bounds)?;
            self.walkers.clear();
            self.transactions.reset();
        }

        let registry = Arc::clone(&self.registry);
        let ordering = config.ordering.ordering();
        let mut selector = RandomSelector::new(config.seed);
        let mut stats = PlacementStats::default();
        let mut report = GenerationReport {
            seed: config.seed,
            ..GenerationReport::default()
        };

        let start = match &config.start_template {
            Some(name) => registry.require(name)?,
            None => {
                let candidates = registry.start_candidates();
                let weights: Vec<f64> = candidates
                    .iter()
                    .map(|&id| registry.get(id).map_or(1.0, |t| t.weight()))
                    .collect();
                let choice = selector.weighted_choice(&weights);
                candidates.get(choice).copied().unwrap_or(TemplateId(0))
            }
        };

        let mut ctx = PlacementContext {
            grid: &mut self.grid,
            registry: &registry,
            ordering: ordering.as_ref(),
            selector: &mut selector,
            transactions: &mut self.transactions,
            stats: &mut stats,
        };

        let start_room = place_start(&mut ctx, start)?;
        self.walkers = (0..config.walker_count)
            .map(|id| Walker::new(id, start_room.primary, config.rooms_per_walker))
            .collect();

        'generation: loop {
            let mut active = false;
            for walker in &mut self.walkers {
                if cancel.load(Ordering::Relaxed) {
                    warn!(
                        "Generation cancelled after {} rooms",
                        ctx.grid.room_count()
                    );
                    return Err(DungeonError::Cancelled {
                        rooms_placed: ctx.grid.room_count(),
                    });
                }
                if ctx.grid.room_count() >= config.max_rooms {
                    break 'generation;
                }
                if walker.status() == WalkerStatus::Finished {
                    continue;
                }

                active = true;
                report.walker_steps += 1;
                match walker.step(&mut ctx) {
                    WalkerStep::Backtracked(_) => report.backtracks += 1,
                    WalkerStep::Abandoned { .. } => report.frontiers_abandoned += 1,
                    WalkerStep::Extended(_) | WalkerStep::Finished => {}
                }

                let failed = report.frontiers_abandoned + ctx.stats.transactions_rolled_back;
                if failed > config.retry_budget {
                    warn!(
                        "Retry budget of {} exhausted with {} rooms placed",
                        config.retry_budget,
                        ctx.grid.room_count()
                    );
                    return Err(DungeonError::RetryBudgetExhausted {
                        failed_attempts: failed,
                        rooms_placed: ctx.grid.room_count(),
                    });
                }
            }
            if !active {
                break;
            }
        }

        report.rooms_placed = ctx.grid.room_count();
        report.connectors_committed = ctx.stats.connectors_committed;
        report.transactions_rolled_back = ctx.stats.transactions_rolled_back;

        let orphans = validation::find_orphaned_connectors(ctx.grid);
        if !orphans.is_empty() {
            error!("Connectors committed without neighbors: {orphans:?}");
        }
        let leaked = validation::find_reserved_positions(ctx.grid);
        if !leaked.is_empty() {
            error!("{} cells left reserved after generation", leaked.len());
        }

        info!(
            "Seed {}: {} rooms, {} connectors, {} rollbacks, {} abandoned, {} backtracks in {} steps",
            report.seed,
            report.rooms_placed,
            report.connectors_committed,
            report.transactions_rolled_back,
            report.frontiers_abandoned,
            report.backtracks,
            report.walker_steps
        );
        Ok(report)
    }

    /// Whether a template could be placed at `origin` with `rotation`
    ///
    /// Only the footprint is checked; required connections are checked when
    /// the room is placed.
    pub fn can_place_room(&self, template: TemplateId, origin: GridPosition, rotation: Rotation) -> bool {
        self.registry
            .variant(template, rotation)
            .is_some_and(|variant| self.grid.can_place(variant, origin, ReservedCells::Reject))
    }

    /// Place a room outside a generation run
    ///
    /// Connectors are placed atomically with their required neighbors, tried
    /// in registry declaration order. Returns every committed room id, the
    /// requested room first.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTemplate` for an unknown id, otherwise the reason the
    /// placement failed; the grid is unchanged on error
    pub fn place_room(
        &mut self,
        template: TemplateId,
        origin: GridPosition,
        rotation: Rotation,
    ) -> Result<Vec<RoomId>> {
        let registry = Arc::clone(&self.registry);
        let variant = registry
            .variant(template, rotation)
            .ok_or_else(|| DungeonError::UnknownTemplate {
                name: template.to_string(),
            })?;
        let room = PlacedRoomInstance::new(template, variant, origin, rotation);

        let mut selector = RandomSelector::new(0);
        let mut stats = PlacementStats::default();
        let mut ctx = PlacementContext {
            grid: &mut self.grid,
            registry: &registry,
            ordering: &DeclarationOrder,
            selector: &mut selector,
            transactions: &mut self.transactions,
            stats: &mut stats,
        };
        place_room(&mut ctx, room).map(|placement| placement.rooms())
    }

    /// Room covering a cell
    pub fn room_at(&self, position: GridPosition) -> Option<(RoomId, &PlacedRoomInstance)> {
        self.grid.room_at(position)
    }

    /// All committed rooms in commit order
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &PlacedRoomInstance)> + '_ {
        self.grid.rooms()
    }

    /// Mapping from every occupied cell to its room
    pub fn layout(&self) -> BTreeMap<GridPosition, RoomId> {
        self.grid.layout()
    }

    /// Remove every room, reservation and walker
    pub fn clear_dungeon(&mut self) {
        self.grid.clear();
        self.walkers.clear();
        self.transactions.reset();
    }
}

/// Place the start template unrotated, centered on the grid
fn place_start(ctx: &mut PlacementContext<'_>, template: TemplateId) -> Result<Placement> {
    let name = ctx
        .registry
        .get(template)
        .map_or_else(|| template.to_string(), |t| t.name().to_string());
    let variant = ctx
        .registry
        .variant(template, Rotation::None)
        .ok_or_else(|| DungeonError::UnknownTemplate { name: name.clone() })?;

    let center = ctx.grid.bounds().center();
    let origin = GridPosition::new(
        center.x - (variant.width() / 2) as i32,
        center.y - (variant.height() / 2) as i32,
    );
    let room = PlacedRoomInstance::new(template, variant, origin, Rotation::None);

    place_room(ctx, room).map_err(|err| {
        warn!("Start room '{name}' rejected: {err}");
        DungeonError::StartPlacementFailed { template: name }
    })
}
