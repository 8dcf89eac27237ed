//! A single placed grid cell and its boundary gates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::direction::{Direction, Rotation};
use crate::error::DomainError;
use crate::grid::GridPosition;
use crate::prefab::PrefabId;

/// What kind of structure a tile holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Spawn courtyard, only ever at the origin
    Base,
    /// Combat or puzzle room
    Room,
    /// Connecting hallway
    Hallway,
}

impl TileKind {
    /// Kind implied by a room-or-hallway prefab draw.
    pub fn for_prefab(prefab: &PrefabId) -> Self {
        if prefab.is_hallway() {
            Self::Hallway
        } else {
            Self::Room
        }
    }
}

/// One tile of a dungeon layout.
///
/// The position is fixed at construction. Each face carries at most one gate;
/// a gate, once set, cannot be replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    position: GridPosition,
    prefab: PrefabId,
    rotation: Rotation,
    kind: TileKind,
    gates: BTreeMap<Direction, PrefabId>,
}

impl Tile {
    pub fn new(position: GridPosition, prefab: PrefabId, rotation: Rotation, kind: TileKind) -> Self {
        Self {
            position,
            prefab,
            rotation,
            kind,
            gates: BTreeMap::new(),
        }
    }

    /// Build a tile from a raw prefab path, rejecting empty paths.
    pub fn from_path(
        position: GridPosition,
        prefab_path: &str,
        rotation: Rotation,
        kind: TileKind,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(position, PrefabId::new(prefab_path)?, rotation, kind))
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn prefab(&self) -> &PrefabId {
        &self.prefab
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn gate(&self, direction: Direction) -> Option<&PrefabId> {
        self.gates.get(&direction)
    }

    pub fn has_gate(&self, direction: Direction) -> bool {
        self.gates.contains_key(&direction)
    }

    pub fn set_gate(&mut self, direction: Direction, gate: PrefabId) -> Result<(), DomainError> {
        if self.gates.contains_key(&direction) {
            return Err(DomainError::GateAlreadySet {
                position: self.position,
                direction,
            });
        }
        self.gates.insert(direction, gate);
        Ok(())
    }

    /// Gates in N, E, S, W order.
    pub fn gates(&self) -> impl Iterator<Item = (Direction, &PrefabId)> {
        self.gates.iter().map(|(d, g)| (*d, g))
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }
}
