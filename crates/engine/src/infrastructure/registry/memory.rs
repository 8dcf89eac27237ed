//! In-memory instance registry.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use delve_domain::{InstanceGenerationState, InstanceId};

use crate::infrastructure::ports::{InstanceRegistry, RepoError};

/// Registry kept in process memory. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: DashMap<InstanceId, InstanceGenerationState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = InstanceGenerationState>) -> Self {
        let registry = Self::new();
        for record in records {
            registry.records.insert(record.instance.clone(), record);
        }
        registry
    }

    /// Record for `instance` and whether this call created it.
    pub(crate) fn observe_record(&self, instance: &InstanceId) -> (InstanceGenerationState, bool) {
        match self.records.entry(instance.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let state = InstanceGenerationState::observed(instance.clone());
                entry.insert(state.clone());
                (state, true)
            }
        }
    }

    pub(crate) fn mark_record(&self, instance: &InstanceId, generated_at_ms: i64, tile_count: usize) {
        self.records
            .entry(instance.clone())
            .or_insert_with(|| InstanceGenerationState::observed(instance.clone()))
            .mark_generated(generated_at_ms, tile_count);
    }

    pub(crate) fn generated(&self, instance: &InstanceId) -> bool {
        self.records
            .get(instance)
            .is_some_and(|record| record.generated)
    }

    /// All records, ordered by instance name.
    pub(crate) fn snapshot(&self) -> Vec<InstanceGenerationState> {
        let mut records: Vec<InstanceGenerationState> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.instance.cmp(&b.instance));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl InstanceRegistry for InMemoryRegistry {
    async fn observe(&self, instance: &InstanceId) -> Result<InstanceGenerationState, RepoError> {
        Ok(self.observe_record(instance).0)
    }

    async fn is_generated(&self, instance: &InstanceId) -> Result<bool, RepoError> {
        Ok(self.generated(instance))
    }

    async fn mark_generated(
        &self,
        instance: &InstanceId,
        generated_at_ms: i64,
        tile_count: usize,
    ) -> Result<(), RepoError> {
        self.mark_record(instance, generated_at_ms, tile_count);
        Ok(())
    }

    async fn known_instances(&self) -> Result<Vec<InstanceGenerationState>, RepoError> {
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(name: &str) -> InstanceId {
        InstanceId::new(name).unwrap()
    }

    #[tokio::test]
    async fn observe_creates_an_ungenerated_record_once() {
        let registry = InMemoryRegistry::new();
        let id = instance("w1");

        let first = registry.observe(&id).await.unwrap();
        assert!(!first.generated);
        assert!(!registry.observe_record(&id).1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn mark_generated_flips_the_record() {
        let registry = InMemoryRegistry::new();
        let id = instance("w1");
        assert!(!registry.is_generated(&id).await.unwrap());

        registry.mark_generated(&id, 1_000, 25).await.unwrap();

        assert!(registry.is_generated(&id).await.unwrap());
        let record = registry.observe(&id).await.unwrap();
        assert_eq!(record.generated_at_ms, 1_000);
        assert_eq!(record.tile_count, 25);
    }

    #[tokio::test]
    async fn known_instances_are_sorted() {
        let registry = InMemoryRegistry::new();
        for name in ["c", "a", "b"] {
            registry.observe(&instance(name)).await.unwrap();
        }
        let names: Vec<String> = registry
            .known_instances()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.instance.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
