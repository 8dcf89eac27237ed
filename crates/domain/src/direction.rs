//! Cardinal directions and quarter-turn rotations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the four cardinal directions on the tile grid.
///
/// North points towards -z, east towards +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in N, E, S, W order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Grid offset `(dx, dz)` for one step in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::North => 0,
            Self::East => 90,
            Self::South => 180,
            Self::West => 270,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    pub fn rotate_clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    pub fn rotate_counter_clockwise(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }

    /// Inverse of [`Direction::degrees`], accepting any value congruent to a
    /// cardinal rotation mod 360 (negative values included).
    pub fn from_degrees(degrees: i32) -> Result<Self, DomainError> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::North),
            90 => Ok(Self::East),
            180 => Ok(Self::South),
            270 => Ok(Self::West),
            _ => Err(DomainError::invalid_argument(format!(
                "Invalid cardinal direction degrees: {degrees}. Must be 0, 90, 180, or 270."
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "North"),
            Self::East => write!(f, "East"),
            Self::South => write!(f, "South"),
            Self::West => write!(f, "West"),
        }
    }
}

/// Prefab rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn from_degrees(degrees: i32) -> Result<Self, DomainError> {
        Direction::from_degrees(degrees).map(|d| match d {
            Direction::North => Self::Deg0,
            Direction::East => Self::Deg90,
            Direction::South => Self::Deg180,
            Direction::West => Self::Deg270,
        })
    }
}

impl TryFrom<i32> for Rotation {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_degrees(value)
    }
}

impl From<Rotation> for i32 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
