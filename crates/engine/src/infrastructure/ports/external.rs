//! World-facing port traits: tile placement and the ground probe.

use async_trait::async_trait;
use delve_domain::{InstanceId, Tile, WorldPosition};

use super::error::{ProbeError, SpawnError};

/// Block id the world reports for empty space.
pub const AIR_BLOCK: u32 = 0;

/// Physically places one tile (and its gates) into an instance.
///
/// Calls for one instance are never issued concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TileSpawner: Send + Sync {
    async fn spawn_tile(
        &self,
        instance: &InstanceId,
        tile: &Tile,
        world: WorldPosition,
    ) -> Result<(), SpawnError>;
}

/// Block lookup in the world a participant stands in.
#[cfg_attr(test, mockall::automock)]
pub trait GroundProbe: Send + Sync {
    /// Block id at the given block coordinates; [`AIR_BLOCK`] for empty space.
    fn block_at(&self, x: i32, y: i32, z: i32) -> Result<u32, ProbeError>;
}
