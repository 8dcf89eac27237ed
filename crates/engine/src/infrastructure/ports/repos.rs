//! Catalog and registry port traits.

use async_trait::async_trait;
use delve_domain::{InstanceGenerationState, InstanceId, PrefabCategory, PrefabId};

use super::error::RepoError;

// =============================================================================
// Prefab Catalog
// =============================================================================

/// Source of prefab identifiers, grouped by category.
#[cfg_attr(test, mockall::automock)]
pub trait PrefabCatalog: Send + Sync {
    /// Identifiers in catalog order. Empty when the category has nothing.
    fn list_by_category(&self, category: PrefabCategory) -> Vec<PrefabId>;
}

// =============================================================================
// Instance Registry
// =============================================================================

/// Durable record of which instances exist and which are generated.
///
/// Records are created lazily and never removed by the generation subsystem.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceRegistry: Send + Sync {
    /// Return the record for `instance`, creating an ungenerated one if absent.
    async fn observe(&self, instance: &InstanceId) -> Result<InstanceGenerationState, RepoError>;

    async fn is_generated(&self, instance: &InstanceId) -> Result<bool, RepoError>;

    async fn mark_generated(
        &self,
        instance: &InstanceId,
        generated_at_ms: i64,
        tile_count: usize,
    ) -> Result<(), RepoError>;

    /// All records, ordered by instance name.
    async fn known_instances(&self) -> Result<Vec<InstanceGenerationState>, RepoError>;
}
