//! Immutable room blueprints and their quarter-turn rotations
//!
//! A template is a rectangular layout of cell markers plus an ordered list of
//! connection points in template-local coordinates. Rotation produces a new
//! template; the `required` flag of every connection point survives it.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::io::error::{DungeonError, Result};
use crate::spatial::position::{Direction, GridPosition};

/// Marker stored in each template cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Not part of the room footprint
    #[default]
    Empty,
    /// Solid cell inside the footprint
    Blocked,
    /// Walkable cell
    Floor,
    /// Walkable cell carrying a doorway
    Door,
}

impl CellType {
    /// Whether the cell belongs to the room footprint
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Parse a layout marker: `' '` empty, `'#'` blocked, `'.'` floor, `'+'` door
    pub const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            ' ' => Some(Self::Empty),
            '#' => Some(Self::Blocked),
            '.' => Some(Self::Floor),
            '+' => Some(Self::Door),
            _ => None,
        }
    }
}

/// Opening on a template edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionPoint {
    /// Template-local cell carrying the opening
    pub position: GridPosition,
    /// Direction the opening faces
    pub direction: Direction,
    /// Whether a matching neighbor is mandatory
    #[serde(default)]
    pub required: bool,
}

impl ConnectionPoint {
    /// Create a connection point at local `(x, y)`
    pub const fn new(x: i32, y: i32, direction: Direction, required: bool) -> Self {
        Self {
            position: GridPosition::new(x, y),
            direction,
            required,
        }
    }
}

/// Serialized shape of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Unique template name
    pub name: String,
    /// Relative selection weight
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Cell markers, one inner vector per row
    pub cells: Vec<Vec<CellType>>,
    /// Connection points in declaration order
    pub connections: Vec<ConnectionPoint>,
}

const fn default_weight() -> f64 {
    1.0
}

/// Room blueprint with cell layout and connection points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TemplateDefinition", into = "TemplateDefinition")]
pub struct RoomTemplate {
    name: String,
    weight: f64,
    /// Indexed by `(row, col)`, i.e. `(y, x)`
    cells: Array2<CellType>,
    connections: Vec<ConnectionPoint>,
}

impl RoomTemplate {
    /// Create a template from rows of cells
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the layout is empty or ragged, if a
    /// connection sits on an empty cell, faces into its own footprint, or is
    /// declared twice.
    pub fn new(
        name: impl Into<String>,
        rows: Vec<Vec<CellType>>,
        connections: Vec<ConnectionPoint>,
    ) -> Result<Self> {
        let name = name.into();
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        if height == 0 || width == 0 {
            return Err(invalid_template(&name, &"layout has no cells"));
        }
        if rows.iter().any(|row| row.len() != width) {
            return Err(invalid_template(&name, &"layout rows differ in length"));
        }

        let flat: Vec<CellType> = rows.into_iter().flatten().collect();
        let cells = Array2::from_shape_vec((height, width), flat)
            .map_err(|e| invalid_template(&name, &e))?;

        let template = Self {
            name,
            weight: default_weight(),
            cells,
            connections,
        };
        template.validate_connections()?;
        Ok(template)
    }

    /// Create a template from text rows of layout markers
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` on unknown markers or any error from [`Self::new`]
    pub fn from_layout(
        name: impl Into<String>,
        layout: &[&str],
        connections: Vec<ConnectionPoint>,
    ) -> Result<Self> {
        let name = name.into();
        let mut rows = Vec::with_capacity(layout.len());
        for line in layout {
            let mut row = Vec::with_capacity(line.len());
            for marker in line.chars() {
                let cell = CellType::from_marker(marker).ok_or_else(|| {
                    invalid_template(&name, &format!("unknown layout marker '{marker}'"))
                })?;
                row.push(cell);
            }
            rows.push(row);
        }
        Self::new(name, rows, connections)
    }

    /// Replace the selection weight
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the weight is not a positive finite number
    pub fn with_weight(mut self, weight: f64) -> Result<Self> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(invalid_template(
                &self.name,
                &format!("weight {weight} must be positive and finite"),
            ));
        }
        self.weight = weight;
        Ok(self)
    }

    fn validate_connections(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for point in &self.connections {
            if !self.is_solid_at(point.position) {
                return Err(invalid_template(
                    &self.name,
                    &format!("connection at {} is not on a room cell", point.position),
                ));
            }
            if self.is_solid_at(point.position.step(point.direction)) {
                return Err(invalid_template(
                    &self.name,
                    &format!(
                        "connection at {} faces {} into the room itself",
                        point.position, point.direction
                    ),
                ));
            }
            if !seen.insert((point.position, point.direction)) {
                return Err(invalid_template(
                    &self.name,
                    &format!(
                        "connection at {} facing {} is declared twice",
                        point.position, point.direction
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative selection weight
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// Cell marker at a local position, `None` outside the layout
    pub fn cell(&self, local: GridPosition) -> Option<CellType> {
        if local.x < 0 || local.y < 0 {
            return None;
        }
        self.cells.get((local.y as usize, local.x as usize)).copied()
    }

    /// Whether a local position is part of the footprint
    pub fn is_solid_at(&self, local: GridPosition) -> bool {
        self.cell(local).is_some_and(CellType::is_solid)
    }

    /// Local positions of all footprint cells in row-major order
    pub fn footprint(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.cells
            .indexed_iter()
            .filter(|(_, cell)| cell.is_solid())
            .map(|((row, col), _)| GridPosition::new(col as i32, row as i32))
    }

    /// All connection points in declaration order
    pub fn connections(&self) -> &[ConnectionPoint] {
        &self.connections
    }

    /// Connection points marked as required, in declaration order
    pub fn required_connection_points(&self) -> Vec<ConnectionPoint> {
        self.connections
            .iter()
            .filter(|point| point.required)
            .copied()
            .collect()
    }

    /// Whether any connection point is required
    pub fn has_required_connections(&self) -> bool {
        self.connections.iter().any(|point| point.required)
    }

    /// Whether this template bridges branches: two or more required connections
    pub fn is_connector_piece(&self) -> bool {
        self.connections.iter().filter(|point| point.required).count() >= 2
    }

    /// Whether both templates cover the same cells with the same openings,
    /// ignoring name, weight and connection order
    pub fn is_equivalent(&self, other: &Self) -> bool {
        if self.cells != other.cells || self.connections.len() != other.connections.len() {
            return false;
        }
        let ours: HashSet<&ConnectionPoint> = self.connections.iter().collect();
        other.connections.iter().all(|point| ours.contains(point))
    }

    /// Rotate clockwise by `steps` quarter turns
    #[must_use]
    pub fn rotate(&self, steps: u8) -> Self {
        (0..steps % 4).fold(self.clone(), |template, _| template.rotate_quarter())
    }

    /// Cell `(x, y)` of a template `h` rows high moves to `(h - 1 - y, x)`
    fn rotate_quarter(&self) -> Self {
        let (rows, cols) = self.cells.dim();
        let cells = Array2::from_shape_fn((cols, rows), |(row, col)| {
            self.cells
                .get((rows - 1 - col, row))
                .copied()
                .unwrap_or_default()
        });

        let height = rows as i32;
        let connections = self
            .connections
            .iter()
            .map(|point| ConnectionPoint {
                position: GridPosition::new(height - 1 - point.position.y, point.position.x),
                direction: point.direction.rotate(1),
                required: point.required,
            })
            .collect();

        Self {
            name: self.name.clone(),
            weight: self.weight,
            cells,
            connections,
        }
    }
}

impl TryFrom<TemplateDefinition> for RoomTemplate {
    type Error = DungeonError;

    fn try_from(definition: TemplateDefinition) -> Result<Self> {
        Self::new(definition.name, definition.cells, definition.connections)?
            .with_weight(definition.weight)
    }
}

impl From<RoomTemplate> for TemplateDefinition {
    fn from(template: RoomTemplate) -> Self {
        let cells = template
            .cells
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect();
        Self {
            name: template.name,
            weight: template.weight,
            cells,
            connections: template.connections,
        }
    }
}

fn invalid_template(name: &str, reason: &impl ToString) -> DungeonError {
    DungeonError::InvalidTemplate {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
