//! Grid coordinates, cardinal directions and quarter-turn rotations
//!
//! World coordinates grow East along `x` and South along `y`. All rotation
//! is clockwise in 90 degree steps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Integer cell coordinate in grid space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    /// Column, growing East
    pub x: i32,
    /// Row, growing South
    pub y: i32,
}

impl GridPosition {
    /// Create a position from its coordinates
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell in the given direction
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Add for GridPosition {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridPosition {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Towards negative `y`
    North,
    /// Towards positive `x`
    East,
    /// Towards positive `y`
    South,
    /// Towards negative `x`
    West,
}

impl Direction {
    /// All directions in clockwise order starting at North
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unit offset `(dx, dy)` of one step in this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// The direction facing back
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Rotate clockwise by the given number of quarter turns
    #[must_use]
    pub const fn rotate(self, steps: u8) -> Self {
        let index = (self.index() + steps as usize) % 4;
        match index {
            0 => Self::North,
            1 => Self::East,
            2 => Self::South,
            _ => Self::West,
        }
    }

    /// Position in clockwise order starting at North
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(name)
    }
}

/// Clockwise quarter-turn rotation applied to a template
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Rotation {
    /// Unrotated
    #[default]
    None,
    /// 90 degrees clockwise
    Quarter,
    /// 180 degrees
    Half,
    /// 270 degrees clockwise
    ThreeQuarter,
}

impl Rotation {
    /// All rotations in increasing order
    pub const ALL: [Self; 4] = [Self::None, Self::Quarter, Self::Half, Self::ThreeQuarter];

    /// Build a rotation from a number of clockwise quarter turns (taken modulo 4)
    pub const fn from_steps(steps: u8) -> Self {
        match steps % 4 {
            0 => Self::None,
            1 => Self::Quarter,
            2 => Self::Half,
            _ => Self::ThreeQuarter,
        }
    }

    /// Number of clockwise quarter turns
    pub const fn steps(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Quarter => 1,
            Self::Half => 2,
            Self::ThreeQuarter => 3,
        }
    }

    /// Compose two rotations
    #[must_use]
    pub const fn then(self, other: Self) -> Self {
        Self::from_steps(self.steps() + other.steps())
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", u16::from(self.steps()) * 90)
    }
}

/// Axis-aligned bounding box for generation constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum coordinates (inclusive)
    pub min: GridPosition,
    /// Maximum coordinates (inclusive)
    pub max: GridPosition,
}

impl BoundingBox {
    /// Bounds covering `width` x `height` cells with the minimum corner at the origin
    pub const fn from_size(width: usize, height: usize) -> Self {
        Self {
            min: GridPosition::new(0, 0),
            max: GridPosition::new(width as i32 - 1, height as i32 - 1),
        }
    }

    /// Check if a position is within the bounds
    pub const fn contains(&self, pos: GridPosition) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Number of columns covered
    pub const fn width(&self) -> usize {
        (self.max.x as i64 - self.min.x as i64 + 1) as usize
    }

    /// Number of rows covered
    pub const fn height(&self) -> usize {
        (self.max.y as i64 - self.min.y as i64 + 1) as usize
    }

    /// Central cell, rounded towards the minimum corner
    pub const fn center(&self) -> GridPosition {
        GridPosition::new(
            (self.min.x as i64 + (self.max.x as i64 - self.min.x as i64) / 2) as i32,
            (self.min.y as i64 + (self.max.y as i64 - self.min.y as i64) / 2) as i32,
        )
    }
}
