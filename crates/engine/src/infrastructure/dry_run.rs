//! World stand-ins for running the pipeline without a game server.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use delve_domain::{InstanceId, Tile, WorldPosition};

use crate::infrastructure::ports::{GroundProbe, ProbeError, SpawnError, TileSpawner, AIR_BLOCK};

/// Spawner that logs each placement instead of touching a world.
#[derive(Debug, Default)]
pub struct LoggingSpawner {
    spawned: AtomicUsize,
}

impl LoggingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TileSpawner for LoggingSpawner {
    async fn spawn_tile(
        &self,
        instance: &InstanceId,
        tile: &Tile,
        world: WorldPosition,
    ) -> Result<(), SpawnError> {
        tracing::info!(
            instance = %instance,
            grid = %tile.position(),
            world = %world,
            prefab = %tile.prefab(),
            rotation = %tile.rotation(),
            kind = ?tile.kind(),
            gates = tile.gate_count(),
            "Spawning tile"
        );
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Ground that is solid on exactly one layer and air everywhere else.
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    floor_y: Option<i32>,
    block: u32,
}

impl FlatGround {
    /// Nothing but air.
    pub fn empty() -> Self {
        Self {
            floor_y: None,
            block: AIR_BLOCK,
        }
    }

    /// Solid `block` on layer `floor_y`.
    pub fn solid_at(floor_y: i32, block: u32) -> Self {
        Self {
            floor_y: Some(floor_y),
            block,
        }
    }
}

impl GroundProbe for FlatGround {
    fn block_at(&self, _x: i32, y: i32, _z: i32) -> Result<u32, ProbeError> {
        Ok(match self.floor_y {
            Some(floor) if floor == y => self.block,
            _ => AIR_BLOCK,
        })
    }
}
