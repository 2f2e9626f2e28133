//! Walker-based dungeon generation with atomic connector placement
//!
//! Rooms are stamped from rotatable templates onto a bounded grid by walkers
//! that extend the dungeon through open connection points. Rooms with two or
//! more required connections are placed together with their neighbors in a
//! single transaction that either commits everything or leaves the grid
//! untouched.

#![forbid(unsafe_code)]

/// Generation driver, walkers, transactions and candidate ordering
pub mod algorithm;
/// Input/output operations, configuration and error handling
pub mod io;
/// Room templates, the template registry and placed rooms
pub mod rooms;
/// Grid positions and the shared occupancy grid
pub mod spatial;

pub use io::error::{DungeonError, Result};
