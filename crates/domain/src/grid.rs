//! Grid and world coordinates.
//!
//! The grid is a 2-D lattice of tiles centred on the base tile at (0, 0).
//! World coordinates are block coordinates inside one instance.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Width of a room prefab in blocks.
pub const ROOM_FOOTPRINT: i32 = 19;

/// Blocks reserved between two rooms for the shared gate.
pub const GATE_WIDTH: i32 = 1;

/// Distance in blocks between the origins of two adjacent tiles.
pub const TILE_SIZE: i32 = ROOM_FOOTPRINT + GATE_WIDTH;

/// Position of a tile on the grid.
///
/// Ordered by `x` then `z`; generation iterates tiles in this order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPosition {
    pub x: i32,
    pub z: i32,
}

impl GridPosition {
    pub const ORIGIN: GridPosition = GridPosition { x: 0, z: 0 };

    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn is_origin(&self) -> bool {
        *self == Self::ORIGIN
    }

    /// Neighbouring position one step in `direction`.
    pub fn neighbor(&self, direction: Direction) -> Self {
        let (dx, dz) = direction.offset();
        Self::new(self.x + dx, self.z + dz)
    }

    /// Chebyshev distance from the origin, i.e. the ring this position is on.
    pub fn ring(&self) -> i32 {
        self.x.abs().max(self.z.abs())
    }
}

impl Add for GridPosition {
    type Output = GridPosition;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Block position inside an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl Sub for WorldPosition {
    type Output = WorldPosition;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Linear map from grid positions to world positions anchored at an origin.
///
/// `world = origin + grid * TILE_SIZE` on x and z; every tile shares the
/// origin's y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTransform {
    origin: WorldPosition,
}

impl GridTransform {
    pub fn new(origin: WorldPosition) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> WorldPosition {
        self.origin
    }

    pub fn tile_size(&self) -> i32 {
        TILE_SIZE
    }

    pub fn grid_to_world(&self, grid: GridPosition) -> WorldPosition {
        WorldPosition::new(
            self.origin.x + grid.x * TILE_SIZE,
            self.origin.y,
            self.origin.z + grid.z * TILE_SIZE,
        )
    }

    /// Inverse of [`GridTransform::grid_to_world`]. Returns `None` for world
    /// positions that are not a tile origin.
    pub fn world_to_grid(&self, world: WorldPosition) -> Option<GridPosition> {
        let dx = world.x - self.origin.x;
        let dz = world.z - self.origin.z;
        if dx % TILE_SIZE != 0 || dz % TILE_SIZE != 0 {
            return None;
        }
        Some(GridPosition::new(dx / TILE_SIZE, dz / TILE_SIZE))
    }
}
