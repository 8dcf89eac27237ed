//! Delve Domain - value types for grid dungeon layouts
//!
//! Pure types shared by the generator and the instance controller:
//! directions, grid coordinates, prefabs, tiles and layouts, generation
//! parameters and the per-instance generation record.

pub mod config;
pub mod direction;
pub mod error;
pub mod grid;
pub mod instance;
pub mod layout;
pub mod prefab;
pub mod tile;

pub use config::{GenerationConfig, DEFAULT_RADIUS, DEFAULT_ROOM_PROBABILITY};
pub use direction::{Direction, Rotation};
pub use error::DomainError;
pub use grid::{GridPosition, GridTransform, WorldPosition, GATE_WIDTH, ROOM_FOOTPRINT, TILE_SIZE};
pub use instance::{InstanceGenerationState, InstanceId, InstanceNamePattern, InstanceOrigin};
pub use layout::{Layout, TileMap};
pub use prefab::{
    PrefabCategory, PrefabId, BLOCKED_GATE_MARKER, CLEAR_GATE_MARKER, HALLWAY_MARKER,
};
pub use tile::{Tile, TileKind};
