//! JSON-file backed instance registry (`dungeons.json`).

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use delve_domain::{InstanceGenerationState, InstanceId};
use tokio::sync::Mutex;

use super::memory::InMemoryRegistry;
use crate::infrastructure::ports::{InstanceRegistry, RepoError};

/// Registry persisted as a JSON array of instance records.
///
/// Every change rewrites the whole file through a temporary file and a
/// rename, so readers never see a partial write.
pub struct JsonFileRegistry {
    path: PathBuf,
    records: InMemoryRegistry,
    write_lock: Mutex<()>,
}

impl JsonFileRegistry {
    /// Load the registry at `path`. A missing file is an empty registry.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                let states: Vec<InstanceGenerationState> =
                    serde_json::from_str(&json).map_err(RepoError::serialization)?;
                InMemoryRegistry::with_records(states)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => InMemoryRegistry::new(),
            Err(e) => return Err(RepoError::database("open_registry", e)),
        };

        tracing::info!(
            path = %path.display(),
            instances = records.len(),
            "Opened instance registry"
        );

        Ok(Self {
            path,
            records,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file with `records`. Callers hold `write_lock`.
    async fn write_snapshot(&self, records: &[InstanceGenerationState]) -> Result<(), RepoError> {
        let json = serde_json::to_vec_pretty(records).map_err(RepoError::serialization)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepoError::database("persist_registry", e))?;
        }

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &json)
            .await
            .map_err(|e| RepoError::database("persist_registry", e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| RepoError::database("persist_registry", e))?;
        Ok(())
    }
}

#[async_trait]
impl InstanceRegistry for JsonFileRegistry {
    async fn observe(&self, instance: &InstanceId) -> Result<InstanceGenerationState, RepoError> {
        let (state, created) = self.records.observe_record(instance);
        if created {
            tracing::debug!(instance = %instance, "Recording new instance");
            let _guard = self.write_lock.lock().await;
            self.write_snapshot(&self.records.snapshot()).await?;
        }
        Ok(state)
    }

    async fn is_generated(&self, instance: &InstanceId) -> Result<bool, RepoError> {
        Ok(self.records.generated(instance))
    }

    async fn mark_generated(
        &self,
        instance: &InstanceId,
        generated_at_ms: i64,
        tile_count: usize,
    ) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().await;

        // The in-memory record only flips once the file holds it.
        let mut snapshot = self.records.snapshot();
        match snapshot.iter_mut().find(|r| &r.instance == instance) {
            Some(record) => record.mark_generated(generated_at_ms, tile_count),
            None => {
                let mut record = InstanceGenerationState::observed(instance.clone());
                record.mark_generated(generated_at_ms, tile_count);
                snapshot.push(record);
                snapshot.sort_by(|a, b| a.instance.cmp(&b.instance));
            }
        }
        self.write_snapshot(&snapshot).await?;

        self.records
            .mark_record(instance, generated_at_ms, tile_count);
        Ok(())
    }

    async fn known_instances(&self) -> Result<Vec<InstanceGenerationState>, RepoError> {
        Ok(self.records.snapshot())
    }
}
