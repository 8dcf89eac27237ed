//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions the engine depends on. Ports exist for:
//! - The prefab catalog (built-in list or a catalog file)
//! - The durable instance registry (in memory or a JSON file)
//! - The world itself (tile spawning and the ground probe)
//! - Work scheduling (inline or per-instance task queues)
//! - Clock (for testing)

mod error;
mod execution;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{InstanceRegistry, PrefabCatalog};

#[cfg(test)]
pub use repos::{MockInstanceRegistry, MockPrefabCatalog};

// =============================================================================
// World Ports
// =============================================================================
pub use external::{GroundProbe, TileSpawner, AIR_BLOCK};

#[cfg(test)]
pub use external::{MockGroundProbe, MockTileSpawner};

// =============================================================================
// Scheduling
// =============================================================================
pub use execution::{ExecutionStrategy, Job};

// =============================================================================
// Testability Ports
// =============================================================================
pub use testing::ClockPort;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{ProbeError, RepoError, SpawnError};
