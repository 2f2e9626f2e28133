//! Rooms placed on the grid
//!
//! An instance refers to its template by id only and carries the world-space
//! geometry derived from the oriented template at its origin.

use serde::{Deserialize, Serialize};

use crate::rooms::registry::TemplateId;
use crate::rooms::template::{ConnectionPoint, RoomTemplate};
use crate::spatial::position::{Direction, GridPosition, Rotation};

/// Connection point translated into world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldConnection {
    /// World cell carrying the opening
    pub position: GridPosition,
    /// Direction the opening faces
    pub direction: Direction,
    /// Whether a matching neighbor is mandatory
    pub required: bool,
}

impl WorldConnection {
    /// Cell a neighbor must cover to connect here
    pub const fn facing_cell(&self) -> GridPosition {
        self.position.step(self.direction)
    }

    /// Whether `other` is the opening that pairs with this one
    pub fn pairs_with(&self, other: &Self) -> bool {
        other.position == self.facing_cell() && other.direction == self.direction.opposite()
    }
}

/// A room occupying grid cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedRoomInstance {
    template: TemplateId,
    origin: GridPosition,
    rotation: Rotation,
    cells: Vec<GridPosition>,
    connections: Vec<WorldConnection>,
}

impl PlacedRoomInstance {
    /// Place the oriented template `variant` of `template` at `origin`
    ///
    /// `variant` must already be rotated by `rotation`.
    pub fn new(
        template: TemplateId,
        variant: &RoomTemplate,
        origin: GridPosition,
        rotation: Rotation,
    ) -> Self {
        let cells = variant.footprint().map(|local| origin + local).collect();
        let connections = variant
            .connections()
            .iter()
            .map(|point: &ConnectionPoint| WorldConnection {
                position: origin + point.position,
                direction: point.direction,
                required: point.required,
            })
            .collect();

        Self {
            template,
            origin,
            rotation,
            cells,
            connections,
        }
    }

    /// Template this room was built from
    pub const fn template(&self) -> TemplateId {
        self.template
    }

    /// World position of the template's local origin
    pub const fn origin(&self) -> GridPosition {
        self.origin
    }

    /// Rotation applied to the template
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Occupied world cells
    pub fn cells(&self) -> &[GridPosition] {
        &self.cells
    }

    /// World-space connections in template declaration order
    pub fn connections(&self) -> &[WorldConnection] {
        &self.connections
    }

    /// Required world-space connections in template declaration order
    pub fn required_connections(&self) -> impl Iterator<Item = &WorldConnection> + '_ {
        self.connections.iter().filter(|connection| connection.required)
    }

    /// Whether this room is a connector piece
    pub fn is_connector(&self) -> bool {
        self.required_connections().count() >= 2
    }

    /// Opening at `position` facing `direction`, if the room has one
    pub fn opening(&self, position: GridPosition, direction: Direction) -> Option<&WorldConnection> {
        self.connections
            .iter()
            .find(|connection| connection.position == position && connection.direction == direction)
    }

    /// Whether the room has an opening that pairs with `connection`
    pub fn accepts(&self, connection: &WorldConnection) -> bool {
        self.opening(connection.facing_cell(), connection.direction.opposite())
            .is_some()
    }

    /// Whether the room covers a world cell
    pub fn covers(&self, position: GridPosition) -> bool {
        self.cells.contains(&position)
    }
}
