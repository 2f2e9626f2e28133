//! Structural checks over a finished grid

use bitvec::prelude::*;
use std::collections::{BTreeMap, VecDeque};

use crate::spatial::grid::{DungeonGrid, RoomId};
use crate::spatial::position::GridPosition;

/// Connector rooms with a required connection that meets no matching opening
///
/// Always empty after a run; anything returned means a connector was
/// committed without its neighbors.
pub fn find_orphaned_connectors(grid: &DungeonGrid) -> Vec<RoomId> {
    grid.rooms()
        .filter(|(_, room)| room.is_connector())
        .filter(|(_, room)| {
            room.required_connections()
                .any(|connection| !grid.has_matching_opening(connection))
        })
        .map(|(id, _)| id)
        .collect()
}

/// Rooms of any kind with an unmatched required connection
pub fn find_unsatisfied_rooms(grid: &DungeonGrid) -> Vec<RoomId> {
    grid.rooms()
        .filter(|(_, room)| {
            room.required_connections()
                .any(|connection| !grid.has_matching_opening(connection))
        })
        .map(|(id, _)| id)
        .collect()
}

/// Cells still reserved; empty whenever no transaction is in flight
pub fn find_reserved_positions(grid: &DungeonGrid) -> Vec<GridPosition> {
    grid.reserved_positions()
}

/// Committed rooms directly joined to `id` through paired openings
pub fn linked_rooms(grid: &DungeonGrid, id: RoomId) -> Vec<RoomId> {
    let Some(room) = grid.room(id) else {
        return Vec::new();
    };
    let mut linked: Vec<RoomId> = room
        .connections()
        .iter()
        .filter_map(|connection| {
            grid.room_at(connection.facing_cell())
                .filter(|(_, neighbor)| neighbor.accepts(connection))
                .map(|(neighbor_id, _)| neighbor_id)
        })
        .collect();
    linked.sort_unstable();
    linked.dedup();
    linked
}

/// Whether every room is reachable from every other through paired openings
///
/// An empty grid counts as connected.
pub fn is_connected(grid: &DungeonGrid) -> bool {
    let index: BTreeMap<RoomId, usize> = grid
        .rooms()
        .enumerate()
        .map(|(position, (id, _))| (id, position))
        .collect();
    let Some(&first) = index.keys().next() else {
        return true;
    };

    let mut visited = bitvec![0; index.len()];
    let mut queue = VecDeque::from([first]);
    visited.set(0, true);
    let mut reached = 1;

    while let Some(id) = queue.pop_front() {
        for neighbor in linked_rooms(grid, id) {
            let Some(&slot) = index.get(&neighbor) else {
                continue;
            };
            if visited.get(slot).is_some_and(|bit| *bit) {
                continue;
            }
            visited.set(slot, true);
            reached += 1;
            queue.push_back(neighbor);
        }
    }

    reached == index.len()
}
