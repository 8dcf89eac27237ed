//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    catalog::StaticCatalog,
    clock::SystemClock,
    config::{EngineSettings, RegistryBackend},
    execution::{InlineStrategy, InstanceQueueStrategy},
    ports::{ClockPort, ExecutionStrategy, InstanceRegistry, PrefabCatalog, TileSpawner},
    registry::{InMemoryRegistry, JsonFileRegistry},
};
use crate::use_cases::instance_generation::ControllerOptions;
use crate::use_cases::InstanceGenerationController;

/// Main application state.
///
/// Holds the wired adapters and the generation controller. The world-facing
/// spawner is supplied by the host.
pub struct App {
    pub settings: EngineSettings,
    pub registry: Arc<dyn InstanceRegistry>,
    pub catalog: Arc<dyn PrefabCatalog>,
    pub controller: Arc<InstanceGenerationController>,
}

impl App {
    /// Build the application from settings with the system clock.
    pub async fn new(
        settings: EngineSettings,
        spawner: Arc<dyn TileSpawner>,
    ) -> anyhow::Result<Self> {
        Self::with_clock(settings, spawner, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        settings: EngineSettings,
        spawner: Arc<dyn TileSpawner>,
        clock: Arc<dyn ClockPort>,
    ) -> anyhow::Result<Self> {
        let catalog: Arc<dyn PrefabCatalog> = match &settings.catalog_path {
            Some(path) => Arc::new(StaticCatalog::from_json_file(path).await?),
            None => Arc::new(StaticCatalog::builtin()),
        };

        let registry: Arc<dyn InstanceRegistry> = match &settings.registry {
            RegistryBackend::Memory => {
                tracing::warn!("Using in-memory registry, generation state is lost on restart");
                Arc::new(InMemoryRegistry::new())
            }
            RegistryBackend::JsonFile(path) => {
                tracing::info!(path = %path.display(), "Opening instance registry");
                Arc::new(JsonFileRegistry::open(path.clone()).await?)
            }
        };

        let strategy: Arc<dyn ExecutionStrategy> = if settings.generation.async_generation() {
            Arc::new(InstanceQueueStrategy::new())
        } else {
            Arc::new(InlineStrategy)
        };

        let options = ControllerOptions {
            pattern: settings.instance_pattern.clone(),
            vertical_offset: settings.vertical_offset,
            fallback_origin: settings.fallback_origin,
        };
        let controller = Arc::new(InstanceGenerationController::new(
            settings.generation,
            options,
            catalog.clone(),
            registry.clone(),
            spawner,
            clock,
            strategy,
        ));

        tracing::info!(
            seed = settings.generation.seed(),
            radius = settings.generation.radius(),
            pattern = settings.instance_pattern.as_str(),
            async_generation = settings.generation.async_generation(),
            "Engine composed"
        );

        Ok(Self {
            settings,
            registry,
            catalog,
            controller,
        })
    }
}
