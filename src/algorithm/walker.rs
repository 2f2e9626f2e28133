//! Depth-first walkers that grow the dungeon one room at a time
//!
//! A walker keeps the rooms it has visited as a stack. Each step it extends
//! the room on top of the stack through one of its open connections, or pops
//! the room when nothing is left to extend from it.

use log::{debug, trace};
use std::collections::HashSet;

use crate::algorithm::placement::{Placement, PlacementContext, place_room};
use crate::io::error::{DungeonError, Result};
use crate::rooms::instance::{PlacedRoomInstance, WorldConnection};
use crate::spatial::grid::{DungeonGrid, ReservedCells, RoomId};
use crate::spatial::position::{Direction, GridPosition};

/// Whether a walker can still take steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkerStatus {
    /// Has rooms to extend and budget left
    Active,
    /// Stack is empty or the room budget is spent
    Finished,
}

/// What a single walker step did
#[derive(Debug)]
pub enum WalkerStep {
    /// New rooms were committed and pushed onto the stack
    Extended(Placement),
    /// No candidate fit the chosen connection; it will not be tried again
    Abandoned {
        /// Room whose connection was abandoned
        room: RoomId,
        /// The abandoned connection
        connection: WorldConnection,
        /// Why the last candidate failed
        reason: DungeonError,
    },
    /// The top room had no open connections and was popped
    Backtracked(RoomId),
    /// The walker had nothing left to do
    Finished,
}

/// A depth-first explorer with its own room budget
#[derive(Debug, Clone)]
pub struct Walker {
    id: usize,
    stack: Vec<RoomId>,
    abandoned: HashSet<(GridPosition, Direction)>,
    rooms_placed: usize,
    room_budget: usize,
}

impl Walker {
    /// Create a walker starting from `start`
    pub fn new(id: usize, start: RoomId, room_budget: usize) -> Self {
        Self {
            id,
            stack: vec![start],
            abandoned: HashSet::new(),
            rooms_placed: 0,
            room_budget,
        }
    }

    /// Walker index within its run
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Room the walker is currently standing in
    pub fn current(&self) -> Option<RoomId> {
        self.stack.last().copied()
    }

    /// Rooms this walker has committed, including connector neighbors
    pub const fn rooms_placed(&self) -> usize {
        self.rooms_placed
    }

    /// Current status
    pub fn status(&self) -> WalkerStatus {
        if self.stack.is_empty() || self.rooms_placed >= self.room_budget {
            WalkerStatus::Finished
        } else {
            WalkerStatus::Active
        }
    }

    /// Connections of `room` whose facing cell is free and not yet abandoned
    pub fn open_connections(&self, grid: &DungeonGrid, room: &PlacedRoomInstance) -> Vec<WorldConnection> {
        room.connections()
            .iter()
            .filter(|connection| grid.is_free(connection.facing_cell()))
            .filter(|connection| {
                !self
                    .abandoned
                    .contains(&(connection.position, connection.direction))
            })
            .copied()
            .collect()
    }

    /// Take one step
    pub fn step(&mut self, ctx: &mut PlacementContext<'_>) -> WalkerStep {
        if self.status() == WalkerStatus::Finished {
            self.stack.clear();
            return WalkerStep::Finished;
        }
        let Some(current) = self.current() else {
            return WalkerStep::Finished;
        };

        let open = match ctx.grid.room(current) {
            Some(room) => self.open_connections(ctx.grid, room),
            None => Vec::new(),
        };
        let choice = ctx.selector.index(open.len());
        let Some(&connection) = open.get(choice) else {
            self.stack.pop();
            trace!("Walker {} backtracked from {current}", self.id);
            return WalkerStep::Backtracked(current);
        };

        match extend(ctx, &connection) {
            Ok(placement) => {
                self.rooms_placed += placement.len();
                // Neighbors go below the new room so the walker continues
                // from the room it asked for
                self.stack.extend(placement.filled.iter().copied());
                self.stack.push(placement.primary);
                WalkerStep::Extended(placement)
            }
            Err(reason) => {
                self.abandoned
                    .insert((connection.position, connection.direction));
                debug!(
                    "Walker {} abandoned {} {} of {current}: {reason}",
                    self.id, connection.direction, connection.position
                );
                WalkerStep::Abandoned {
                    room: current,
                    connection,
                    reason,
                }
            }
        }
    }
}

/// Place the first candidate that attaches to `connection`
///
/// Candidates are tried in the context's ordering. Recoverable failures move
/// on to the next candidate.
///
/// # Errors
///
/// Returns the first unrecoverable error, or `NoMatchingTemplate` when every
/// candidate failed
pub fn extend(ctx: &mut PlacementContext<'_>, connection: &WorldConnection) -> Result<Placement> {
    let registry = ctx.registry;
    let candidates = registry.candidates_facing(connection.direction.opposite());
    let ordered = ctx.ordering.arrange(candidates, registry, ctx.selector);

    for candidate in ordered {
        let Some((variant, point)) = registry.resolve(&candidate) else {
            continue;
        };
        let origin = connection.facing_cell() - point.position;
        if !ctx.grid.can_place(variant, origin, ReservedCells::Reject) {
            continue;
        }

        let room = PlacedRoomInstance::new(candidate.template, variant, origin, candidate.rotation);
        match place_room(ctx, room) {
            Ok(placement) => return Ok(placement),
            Err(err) if err.is_recoverable() => {
                trace!("Candidate {} at {origin} rejected: {err}", candidate.template);
            }
            Err(err) => return Err(err),
        }
    }

    Err(DungeonError::NoMatchingTemplate {
        position: connection.facing_cell(),
        direction: connection.direction.opposite(),
    })
}
