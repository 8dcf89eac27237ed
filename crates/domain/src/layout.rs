//! Tile maps: the mutable map a generator builds and the frozen layout it
//! hands out.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::DomainError;
use crate::grid::GridPosition;
use crate::tile::{Tile, TileKind};

/// Generator-owned, mutable map of placed tiles.
///
/// Enforces one tile per position and that a base tile only sits at the origin.
#[derive(Debug, Default)]
pub struct TileMap {
    tiles: BTreeMap<GridPosition, Tile>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: Tile) -> Result<(), DomainError> {
        let position = tile.position();
        if tile.kind() == TileKind::Base && !position.is_origin() {
            return Err(DomainError::validation(format!(
                "Base tile must be placed at the origin, not {position}"
            )));
        }
        match self.tiles.entry(position) {
            btree_map::Entry::Occupied(_) => Err(DomainError::validation(format!(
                "A tile already exists at {position}"
            ))),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(tile);
                Ok(())
            }
        }
    }

    pub fn get(&self, position: GridPosition) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    pub fn get_mut(&mut self, position: GridPosition) -> Option<&mut Tile> {
        self.tiles.get_mut(&position)
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        self.tiles.contains_key(&position)
    }

    /// Positions in grid order.
    pub fn positions(&self) -> Vec<GridPosition> {
        self.tiles.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Freeze the map into an immutable, cheaply clonable layout.
    pub fn freeze(self) -> Layout {
        Layout {
            tiles: Arc::new(self.tiles),
        }
    }
}

/// Read-only snapshot of a generated tile map.
///
/// Clones share the same underlying map; there is no way to mutate it.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    tiles: Arc<BTreeMap<GridPosition, Tile>>,
}

impl Layout {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, position: GridPosition) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        self.tiles.contains_key(&position)
    }

    pub fn base(&self) -> Option<&Tile> {
        self.get(GridPosition::ORIGIN)
            .filter(|tile| tile.kind() == TileKind::Base)
    }

    /// Tiles in grid order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn count_kind(&self, kind: TileKind) -> usize {
        self.tiles.values().filter(|t| t.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Rotation;

    fn tile(x: i32, z: i32, kind: TileKind) -> Tile {
        Tile::from_path(GridPosition::new(x, z), "Dungeon/Rooms/Vex_Room_S_Empty", Rotation::Deg0, kind)
            .unwrap()
    }

    #[test]
    fn rejects_duplicate_positions() {
        let mut map = TileMap::new();
        map.insert(tile(1, 1, TileKind::Room)).unwrap();
        assert!(map.insert(tile(1, 1, TileKind::Hallway)).is_err());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn base_only_at_origin() {
        let mut map = TileMap::new();
        assert!(map.insert(tile(0, 1, TileKind::Base)).is_err());
        map.insert(tile(0, 0, TileKind::Base)).unwrap();
        assert!(map.freeze().base().is_some());
    }

    #[test]
    fn frozen_layout_iterates_in_grid_order() {
        let mut map = TileMap::new();
        map.insert(tile(1, 0, TileKind::Room)).unwrap();
        map.insert(tile(-1, 5, TileKind::Room)).unwrap();
        map.insert(tile(-1, -5, TileKind::Hallway)).unwrap();
        let layout = map.freeze();
        let order: Vec<GridPosition> = layout.tiles().map(|t| t.position()).collect();
        assert_eq!(
            order,
            vec![
                GridPosition::new(-1, -5),
                GridPosition::new(-1, 5),
                GridPosition::new(1, 0)
            ]
        );
        assert_eq!(layout.count_kind(TileKind::Room), 2);
        assert!(layout.base().is_none());
    }
}
