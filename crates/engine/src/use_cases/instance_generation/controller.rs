//! Instance generation controller.
//!
//! Decides per signal whether an instance needs generating, makes sure only
//! one run per instance is ever in flight, and records success durably.
//! A failed run leaves the instance ungenerated so the next signal retries it.

use std::sync::Arc;
use std::time::Duration;

use delve_domain::{
    GenerationConfig, InstanceId, InstanceNamePattern, InstanceOrigin, WorldPosition,
};
use futures_util::FutureExt;
use tokio::sync::oneshot;

use super::origin::OriginResolver;
use super::signal::{LifecycleSignal, ParticipantPosition};
use crate::generation::{BasePlacement, GenerationError, GenerationPhase, LayoutGenerator};
use crate::infrastructure::config::DEFAULT_VERTICAL_OFFSET;
use crate::infrastructure::ports::{
    ClockPort, ExecutionStrategy, GroundProbe, InstanceRegistry, PrefabCatalog, RepoError,
    TileSpawner,
};
use crate::stores::{InFlightSet, OriginStore};

#[derive(Debug, thiserror::Error)]
pub enum InstanceGenerationError {
    #[error("Layout generation failed during {phase:?}: {source}")]
    GenerationFailed {
        phase: GenerationPhase,
        #[source]
        source: GenerationError,
    },
    #[error("{failed} of {total} tiles failed to spawn")]
    SpawnFailed { failed: usize, total: usize },
    #[error("Registry error: {0}")]
    Registry(#[from] RepoError),
    #[error("Generation task ended without reporting a result")]
    Dropped,
}

/// Controller behaviour that is not part of the generation config.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub pattern: InstanceNamePattern,
    pub vertical_offset: i32,
    /// Origin for instances without a participant. Off by default.
    pub fallback_origin: Option<WorldPosition>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            pattern: InstanceNamePattern::default(),
            vertical_offset: DEFAULT_VERTICAL_OFFSET,
            fallback_origin: None,
        }
    }
}

/// What one signal did for one instance.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// Name does not match the managed pattern.
    Ignored,
    AlreadyGenerated,
    /// No participant has joined yet and no fallback origin is configured.
    AwaitingOrigin,
    /// Another trigger already owns the run.
    AlreadyInFlight,
    Started(GenerationHandle),
}

impl TriggerOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    pub fn into_handle(self) -> Option<GenerationHandle> {
        match self {
            Self::Started(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Per-instance result of handling a signal.
#[derive(Debug)]
pub struct SignalOutcome {
    pub instance: InstanceId,
    pub result: Result<TriggerOutcome, InstanceGenerationError>,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub instance: InstanceId,
    pub origin: InstanceOrigin,
    pub tile_count: usize,
    pub elapsed: Duration,
    pub warnings: Vec<String>,
}

/// Completion notification for an accepted run.
#[derive(Debug)]
pub struct GenerationHandle {
    instance: InstanceId,
    rx: oneshot::Receiver<Result<GenerationReport, InstanceGenerationError>>,
}

impl GenerationHandle {
    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> Result<GenerationReport, InstanceGenerationError> {
        self.rx
            .await
            .unwrap_or(Err(InstanceGenerationError::Dropped))
    }
}

/// Point-in-time controller counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStatus {
    pub known: usize,
    pub generated: usize,
    pub in_flight: usize,
    pub origins: usize,
}

/// Everything a run needs, shared between the controller and its jobs.
struct GenerationRun {
    generator: LayoutGenerator,
    registry: Arc<dyn InstanceRegistry>,
    spawner: Arc<dyn TileSpawner>,
    clock: Arc<dyn ClockPort>,
}

impl GenerationRun {
    async fn execute(
        &self,
        instance: &InstanceId,
        origin: InstanceOrigin,
    ) -> Result<GenerationReport, InstanceGenerationError> {
        let base = if origin.base_present {
            BasePlacement::AlreadyPresent
        } else {
            BasePlacement::Place
        };
        let mut result = self.generator.generate(base);
        let elapsed = result.elapsed;
        let warnings = std::mem::take(&mut result.warnings);
        let layout = result
            .into_layout()
            .map_err(|(phase, source)| InstanceGenerationError::GenerationFailed { phase, source })?;

        let transform = origin.transform();
        let total = layout.len();
        let mut failed = 0usize;
        for tile in layout.tiles() {
            let world = transform.grid_to_world(tile.position());
            if let Err(e) = self.spawner.spawn_tile(instance, tile, world).await {
                failed += 1;
                tracing::error!(
                    instance = %instance,
                    grid = %tile.position(),
                    world = %world,
                    prefab = %tile.prefab(),
                    error = %e,
                    "Failed to spawn tile"
                );
            }
        }
        if failed > 0 {
            return Err(InstanceGenerationError::SpawnFailed { failed, total });
        }

        let generated_at_ms = self.clock.now().timestamp_millis();
        self.registry
            .mark_generated(instance, generated_at_ms, total)
            .await?;

        tracing::info!(instance = %instance, tiles = total, "Instance generated");
        Ok(GenerationReport {
            instance: instance.clone(),
            origin,
            tile_count: total,
            elapsed,
            warnings,
        })
    }
}

/// Runs layout generation at most once per managed instance.
///
/// Signals may arrive concurrently from any number of sources. The in-flight
/// set is the only serialization point; the registry is re-checked after it
/// is acquired so a run finishing in between is never repeated.
pub struct InstanceGenerationController {
    run: Arc<GenerationRun>,
    strategy: Arc<dyn ExecutionStrategy>,
    resolver: OriginResolver,
    pattern: InstanceNamePattern,
    fallback_origin: Option<WorldPosition>,
    in_flight: InFlightSet,
    origins: OriginStore,
}

impl InstanceGenerationController {
    pub fn new(
        config: GenerationConfig,
        options: ControllerOptions,
        catalog: Arc<dyn PrefabCatalog>,
        registry: Arc<dyn InstanceRegistry>,
        spawner: Arc<dyn TileSpawner>,
        clock: Arc<dyn ClockPort>,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> Self {
        Self {
            run: Arc::new(GenerationRun {
                generator: LayoutGenerator::new(config, catalog),
                registry,
                spawner,
                clock,
            }),
            strategy,
            resolver: OriginResolver::new(options.vertical_offset),
            pattern: options.pattern,
            fallback_origin: options.fallback_origin,
            in_flight: InFlightSet::new(),
            origins: OriginStore::new(),
        }
    }

    /// Handle one lifecycle signal, returning an outcome per named instance.
    pub async fn handle(&self, signal: LifecycleSignal) -> Vec<SignalOutcome> {
        tracing::debug!(signal = signal.name(), "Handling lifecycle signal");
        match signal {
            LifecycleSignal::InstanceStarted { instance } => {
                let result = self.observe_and_trigger(&instance, None).await;
                vec![SignalOutcome { instance, result }]
            }
            LifecycleSignal::ParticipantJoined {
                instance,
                position,
                ground,
            } => {
                let result = self
                    .observe_and_trigger(&instance, Some((position, ground.as_ref())))
                    .await;
                vec![SignalOutcome { instance, result }]
            }
            LifecycleSignal::RecheckAll { instances } => {
                let mut outcomes = Vec::with_capacity(instances.len());
                for instance in instances {
                    let result = self.trigger(&instance, None).await;
                    outcomes.push(SignalOutcome { instance, result });
                }
                outcomes
            }
        }
    }

    async fn observe_and_trigger(
        &self,
        instance: &InstanceId,
        participant: Option<(ParticipantPosition, &dyn GroundProbe)>,
    ) -> Result<TriggerOutcome, InstanceGenerationError> {
        if self.pattern.matches(instance) {
            self.run.registry.observe(instance).await?;
        }
        self.trigger(instance, participant).await
    }

    /// Start generation for `instance` if it needs it and nobody else is on it.
    ///
    /// `participant` captures the instance origin the first time it is seen.
    pub async fn trigger(
        &self,
        instance: &InstanceId,
        participant: Option<(ParticipantPosition, &dyn GroundProbe)>,
    ) -> Result<TriggerOutcome, InstanceGenerationError> {
        if !self.pattern.matches(instance) {
            tracing::debug!(instance = %instance, "Ignoring unmanaged instance");
            return Ok(TriggerOutcome::Ignored);
        }

        if self.run.registry.is_generated(instance).await? {
            tracing::debug!(instance = %instance, "Instance already generated");
            return Ok(TriggerOutcome::AlreadyGenerated);
        }

        // Ground resolution runs before the store is touched; a racing capture wins.
        if let Some((position, ground)) = participant {
            if self.origins.get(instance).is_none() {
                let resolved = self.resolver.resolve(position, ground);
                let (origin, stored) = self.origins.capture(instance, resolved);
                if stored {
                    tracing::info!(
                        instance = %instance,
                        origin = %origin.position,
                        base_present = origin.base_present,
                        "Captured instance origin"
                    );
                }
            }
        }

        let Some(origin) = self.resolve_origin(instance) else {
            tracing::debug!(instance = %instance, "No origin yet, waiting for a participant");
            return Ok(TriggerOutcome::AwaitingOrigin);
        };

        let Some(guard) = self.in_flight.try_acquire(instance) else {
            tracing::debug!(instance = %instance, "Generation already in flight");
            return Ok(TriggerOutcome::AlreadyInFlight);
        };

        if self.run.registry.is_generated(instance).await? {
            tracing::debug!(instance = %instance, "Instance generated while acquiring");
            return Ok(TriggerOutcome::AlreadyGenerated);
        }

        let (tx, rx) = oneshot::channel();
        let run = Arc::clone(&self.run);
        let job_instance = instance.clone();
        let job = async move {
            let result = run.execute(&job_instance, origin).await;
            if let Err(e) = &result {
                tracing::warn!(
                    instance = %job_instance,
                    error = %e,
                    "Generation failed, instance left for retry"
                );
            }
            drop(guard);
            let _ = tx.send(result);
        }
        .boxed();

        tracing::info!(
            instance = %instance,
            origin = %origin.position,
            base_present = origin.base_present,
            "Starting instance generation"
        );
        self.strategy.run(instance, job).await;

        Ok(TriggerOutcome::Started(GenerationHandle {
            instance: instance.clone(),
            rx,
        }))
    }

    fn resolve_origin(&self, instance: &InstanceId) -> Option<InstanceOrigin> {
        self.origins.get(instance).or_else(|| {
            self.fallback_origin
                .map(|position| InstanceOrigin::new(position, false))
        })
    }

    /// Drop process-lifetime state for an instance that left the world.
    /// Durable records are untouched.
    pub fn forget_instance(&self, instance: &InstanceId) {
        self.origins.forget(instance);
        self.strategy.release(instance);
        tracing::debug!(instance = %instance, "Forgot instance");
    }

    pub fn origin(&self, instance: &InstanceId) -> Option<InstanceOrigin> {
        self.origins.get(instance)
    }

    pub fn is_in_flight(&self, instance: &InstanceId) -> bool {
        self.in_flight.contains(instance)
    }

    pub async fn status(&self) -> Result<ControllerStatus, InstanceGenerationError> {
        let known = self.run.registry.known_instances().await?;
        Ok(ControllerStatus {
            known: known.len(),
            generated: known.iter().filter(|r| r.generated).count(),
            in_flight: self.in_flight.len(),
            origins: self.origins.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use delve_domain::{InstanceGenerationState, PrefabCategory, Tile};
    use mockall::predicate::*;
    use tokio::sync::Semaphore;

    use crate::infrastructure::catalog::StaticCatalog;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::dry_run::{FlatGround, LoggingSpawner};
    use crate::infrastructure::execution::{InlineStrategy, InstanceQueueStrategy};
    use crate::infrastructure::ports::{
        MockClockPort, MockInstanceRegistry, MockTileSpawner, ProbeError, SpawnError, AIR_BLOCK,
    };
    use crate::infrastructure::registry::{InMemoryRegistry, JsonFileRegistry};

    const NOW_MS: i64 = 1_750_000_000_000;

    fn managed(n: u32) -> InstanceId {
        InstanceId::new(format!("instance-Vex_The_Lich_Dungeon-{n}")).unwrap()
    }

    fn config(radius: i32) -> GenerationConfig {
        GenerationConfig::new(42, radius, 0.7, false).unwrap()
    }

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(Utc.timestamp_millis_opt(NOW_MS).unwrap()))
    }

    fn controller(
        registry: Arc<dyn InstanceRegistry>,
        spawner: Arc<dyn TileSpawner>,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> InstanceGenerationController {
        InstanceGenerationController::new(
            config(1),
            ControllerOptions::default(),
            Arc::new(StaticCatalog::builtin()),
            registry,
            spawner,
            fixed_clock(),
            strategy,
        )
    }

    fn joined(instance: InstanceId, x: f64, y: f64, z: f64) -> LifecycleSignal {
        LifecycleSignal::ParticipantJoined {
            instance,
            position: ParticipantPosition::new(x, y, z),
            ground: Arc::new(FlatGround::empty()),
        }
    }

    async fn handle_one(
        controller: &InstanceGenerationController,
        signal: LifecycleSignal,
    ) -> Result<TriggerOutcome, InstanceGenerationError> {
        let mut outcomes = controller.handle(signal).await;
        assert_eq!(outcomes.len(), 1);
        outcomes.remove(0).result
    }

    /// Counts spawns; fails every call when `fail` is set.
    #[derive(Default)]
    struct CountingSpawner {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TileSpawner for CountingSpawner {
        async fn spawn_tile(
            &self,
            _instance: &InstanceId,
            tile: &Tile,
            _world: WorldPosition,
        ) -> Result<(), SpawnError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail {
                return Err(SpawnError::Placement {
                    position: tile.position(),
                    message: "world rejected prefab".into(),
                });
            }
            Ok(())
        }
    }

    /// Holds every spawn until a permit is added.
    struct GatedSpawner {
        gate: Semaphore,
    }

    #[async_trait]
    impl TileSpawner for GatedSpawner {
        async fn spawn_tile(
            &self,
            _instance: &InstanceId,
            _tile: &Tile,
            _world: WorldPosition,
        ) -> Result<(), SpawnError> {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| SpawnError::Unavailable("gate closed".into()))?;
            Ok(())
        }
    }

    /// In-memory registry that counts `mark_generated` calls.
    #[derive(Default)]
    struct CountingRegistry {
        inner: InMemoryRegistry,
        marks: AtomicUsize,
    }

    #[async_trait]
    impl InstanceRegistry for CountingRegistry {
        async fn observe(
            &self,
            instance: &InstanceId,
        ) -> Result<InstanceGenerationState, RepoError> {
            self.inner.observe(instance).await
        }

        async fn is_generated(&self, instance: &InstanceId) -> Result<bool, RepoError> {
            self.inner.is_generated(instance).await
        }

        async fn mark_generated(
            &self,
            instance: &InstanceId,
            generated_at_ms: i64,
            tile_count: usize,
        ) -> Result<(), RepoError> {
            self.marks.fetch_add(1, Ordering::SeqCst);
            self.inner
                .mark_generated(instance, generated_at_ms, tile_count)
                .await
        }

        async fn known_instances(&self) -> Result<Vec<InstanceGenerationState>, RepoError> {
            self.inner.known_instances().await
        }
    }

    /// Ground that blocks inside `block_at` until the test lets it go.
    struct RendezvousGround {
        entered: Arc<std::sync::Barrier>,
        release: Arc<std::sync::Barrier>,
    }

    impl GroundProbe for RendezvousGround {
        fn block_at(&self, _x: i32, _y: i32, _z: i32) -> Result<u32, ProbeError> {
            self.entered.wait();
            self.release.wait();
            Ok(AIR_BLOCK)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn origins_stay_readable_during_ground_resolution() {
        let entered = Arc::new(std::sync::Barrier::new(2));
        let release = Arc::new(std::sync::Barrier::new(2));
        let controller = Arc::new(controller(
            Arc::new(InMemoryRegistry::new()),
            Arc::new(LoggingSpawner::new()),
            Arc::new(InlineStrategy),
        ));
        let id = managed(11);
        let signal = LifecycleSignal::ParticipantJoined {
            instance: id.clone(),
            position: ParticipantPosition::new(0.5, 78.0, 0.5),
            ground: Arc::new(RendezvousGround {
                entered: entered.clone(),
                release: release.clone(),
            }),
        };

        let join = tokio::spawn({
            let controller = controller.clone();
            async move { controller.handle(signal).await }
        });
        let reader = tokio::task::spawn_blocking({
            let controller = controller.clone();
            let id = id.clone();
            move || {
                entered.wait();
                let seen = controller.origin(&id);
                release.wait();
                seen
            }
        });

        let seen = tokio::time::timeout(Duration::from_secs(5), reader)
            .await
            .unwrap()
            .unwrap();
        assert!(seen.is_none());

        let mut outcomes = join.await.unwrap();
        let report = outcomes
            .remove(0)
            .result
            .unwrap()
            .into_handle()
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(report.origin.position, WorldPosition::new(1, 64, 1));
        assert_eq!(controller.origin(&id), Some(report.origin));
    }

    #[tokio::test]
    async fn ignores_unmanaged_instances() {
        // No expectations: any registry or spawner call fails the test.
        let controller = controller(
            Arc::new(MockInstanceRegistry::new()),
            Arc::new(MockTileSpawner::new()),
            Arc::new(InlineStrategy),
        );
        let lobby = InstanceId::new("lobby").unwrap();

        let outcome = handle_one(&controller, joined(lobby, 0.5, 78.0, 0.5))
            .await
            .unwrap();
        assert!(matches!(outcome, TriggerOutcome::Ignored));
    }

    #[tokio::test]
    async fn generated_instance_is_never_spawned_again() {
        let id = managed(1);
        let mut registry = MockInstanceRegistry::new();
        registry.expect_observe().returning(|instance| {
            let mut state = InstanceGenerationState::observed(instance.clone());
            state.mark_generated(NOW_MS, 9);
            Ok(state)
        });
        registry
            .expect_is_generated()
            .with(eq(id.clone()))
            .times(2)
            .returning(|_| Ok(true));
        let mut spawner = MockTileSpawner::new();
        spawner.expect_spawn_tile().times(0);

        let controller = controller(
            Arc::new(registry),
            Arc::new(spawner),
            Arc::new(InlineStrategy),
        );

        for _ in 0..2 {
            let outcome = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
                .await
                .unwrap();
            assert!(matches!(outcome, TriggerOutcome::AlreadyGenerated));
        }
        // Already generated instances never capture an origin.
        assert!(controller.origin(&id).is_none());
    }

    #[tokio::test]
    async fn instance_start_waits_for_a_participant() {
        let registry = Arc::new(InMemoryRegistry::new());
        let controller = controller(
            registry.clone(),
            Arc::new(MockTileSpawner::new()),
            Arc::new(InlineStrategy),
        );
        let id = managed(1);

        let outcome = handle_one(
            &controller,
            LifecycleSignal::InstanceStarted {
                instance: id.clone(),
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, TriggerOutcome::AwaitingOrigin));
        assert!(!controller.is_in_flight(&id));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_generated(&id).await.unwrap());
    }

    #[tokio::test]
    async fn participant_join_spawns_every_tile_and_marks_generated() {
        let id = managed(7);
        let mut registry = MockInstanceRegistry::new();
        registry
            .expect_observe()
            .returning(|instance| Ok(InstanceGenerationState::observed(instance.clone())));
        registry
            .expect_is_generated()
            .times(2)
            .returning(|_| Ok(false));
        registry
            .expect_mark_generated()
            .with(eq(id.clone()), eq(NOW_MS), eq(9))
            .times(1)
            .returning(|_, _, _| Ok(()));

        // Empty ground under (0.5, 78.0, 0.5) resolves to (1, 64, 1).
        let mut spawner = MockTileSpawner::new();
        spawner
            .expect_spawn_tile()
            .withf(|_, tile, world| {
                let grid = tile.position();
                world.x == 1 + grid.x * 20 && world.y == 64 && world.z == 1 + grid.z * 20
            })
            .times(9)
            .returning(|_, _, _| Ok(()));

        let mut clock = MockClockPort::new();
        clock
            .expect_now()
            .returning(|| Utc.timestamp_millis_opt(NOW_MS).unwrap());

        let controller = InstanceGenerationController::new(
            config(1),
            ControllerOptions::default(),
            Arc::new(StaticCatalog::builtin()),
            Arc::new(registry),
            Arc::new(spawner),
            Arc::new(clock),
            Arc::new(InlineStrategy),
        );

        let handle = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap()
            .into_handle()
            .unwrap();
        let report = handle.wait().await.unwrap();

        assert_eq!(report.tile_count, 9);
        assert_eq!(report.origin.position, WorldPosition::new(1, 64, 1));
        assert!(!report.origin.base_present);
        assert!(!controller.is_in_flight(&id));
    }

    #[tokio::test]
    async fn existing_base_is_not_spawned_again() {
        let registry = Arc::new(InMemoryRegistry::new());
        let spawner = Arc::new(CountingSpawner::default());
        let controller = controller(registry.clone(), spawner.clone(), Arc::new(InlineStrategy));
        let id = managed(2);

        let signal = LifecycleSignal::ParticipantJoined {
            instance: id.clone(),
            position: ParticipantPosition::new(0.5, 78.0, 0.5),
            ground: Arc::new(FlatGround::solid_at(77, 3)),
        };
        let report = handle_one(&controller, signal)
            .await
            .unwrap()
            .into_handle()
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert!(report.origin.base_present);
        assert_eq!(report.origin.position, WorldPosition::new(1, 63, 1));
        assert_eq!(report.tile_count, 8);
        assert_eq!(spawner.calls.load(Ordering::SeqCst), 8);
        let record = registry.observe(&id).await.unwrap();
        assert!(record.generated);
        assert_eq!(record.tile_count, 8);
        assert_eq!(record.generated_at_ms, NOW_MS);
    }

    #[tokio::test]
    async fn spawn_failures_leave_the_instance_for_retry() {
        let registry = Arc::new(CountingRegistry::default());
        let spawner = Arc::new(CountingSpawner {
            fail: true,
            ..Default::default()
        });
        let controller = controller(registry.clone(), spawner.clone(), Arc::new(InlineStrategy));
        let id = managed(3);

        let first = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap()
            .into_handle()
            .unwrap()
            .wait()
            .await;
        assert!(matches!(
            first,
            Err(InstanceGenerationError::SpawnFailed { failed: 9, total: 9 })
        ));
        assert!(!registry.is_generated(&id).await.unwrap());
        assert!(!controller.is_in_flight(&id));

        // A later signal retries from scratch, reusing the captured origin.
        let retry = handle_one(&controller, joined(id.clone(), 500.5, 10.0, -20.5))
            .await
            .unwrap();
        assert!(retry.is_started());
        let _ = retry.into_handle().unwrap().wait().await;

        assert_eq!(spawner.calls.load(Ordering::SeqCst), 18);
        assert_eq!(registry.marks.load(Ordering::SeqCst), 0);
        assert_eq!(
            controller.origin(&id).unwrap().position,
            WorldPosition::new(1, 64, 1)
        );
    }

    #[tokio::test]
    async fn registry_write_failure_leaves_the_instance_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dungeons.json");
        let registry = Arc::new(JsonFileRegistry::open(&path).await.unwrap());
        let controller = controller(
            registry.clone(),
            Arc::new(LoggingSpawner::new()),
            Arc::new(InlineStrategy),
        );
        let id = managed(10);
        registry.observe(&id).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        let first = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap()
            .into_handle()
            .unwrap()
            .wait()
            .await;
        assert!(matches!(first, Err(InstanceGenerationError::Registry(_))));
        assert!(!registry.is_generated(&id).await.unwrap());

        std::fs::remove_dir_all(&path).unwrap();
        let retry = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap();
        assert!(retry.is_started());
        retry.into_handle().unwrap().wait().await.unwrap();
        assert!(registry.is_generated(&id).await.unwrap());
    }

    #[tokio::test]
    async fn layout_failure_is_reported_and_not_marked() {
        let registry = Arc::new(CountingRegistry::default());
        let spawner = Arc::new(CountingSpawner::default());
        let controller = InstanceGenerationController::new(
            config(1),
            ControllerOptions::default(),
            Arc::new(StaticCatalog::builtin().without(PrefabCategory::Base)),
            registry.clone(),
            spawner.clone(),
            fixed_clock(),
            Arc::new(InlineStrategy),
        );
        let id = managed(4);

        let result = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap()
            .into_handle()
            .unwrap()
            .wait()
            .await;

        assert!(matches!(
            result,
            Err(InstanceGenerationError::GenerationFailed {
                phase: GenerationPhase::NotStarted,
                source: GenerationError::CatalogEmpty(PrefabCategory::Base),
            })
        ));
        assert_eq!(spawner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.marks.load(Ordering::SeqCst), 0);
        assert!(!controller.is_in_flight(&id));
    }

    #[tokio::test]
    async fn second_trigger_during_a_run_is_deduplicated() {
        let registry = Arc::new(CountingRegistry::default());
        let spawner = Arc::new(GatedSpawner {
            gate: Semaphore::new(0),
        });
        let controller = controller(
            registry.clone(),
            spawner.clone(),
            Arc::new(InstanceQueueStrategy::new()),
        );
        let id = managed(5);

        let handle = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap()
            .into_handle()
            .unwrap();
        assert!(controller.is_in_flight(&id));

        let second = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap();
        assert!(matches!(second, TriggerOutcome::AlreadyInFlight));

        spawner.gate.add_permits(1);
        let report = handle.wait().await.unwrap();
        assert_eq!(report.tile_count, 9);
        assert_eq!(registry.marks.load(Ordering::SeqCst), 1);
        assert!(!controller.is_in_flight(&id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn simultaneous_signals_generate_exactly_once() {
        const SIGNALS: usize = 32;
        let registry = Arc::new(CountingRegistry::default());
        let spawner = Arc::new(CountingSpawner::default());
        let controller = Arc::new(controller(
            registry.clone(),
            spawner.clone(),
            Arc::new(InstanceQueueStrategy::new()),
        ));
        let id = managed(6);
        let barrier = Arc::new(tokio::sync::Barrier::new(SIGNALS));

        let tasks: Vec<_> = (0..SIGNALS)
            .map(|n| {
                let controller = controller.clone();
                let barrier = barrier.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    let signal = if n % 2 == 0 {
                        joined(id, 0.5, 78.0, 0.5)
                    } else {
                        LifecycleSignal::RecheckAll {
                            instances: vec![id],
                        }
                    };
                    controller.handle(signal).await
                })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            for outcome in task.await.unwrap() {
                if let Some(handle) = outcome.result.unwrap().into_handle() {
                    handles.push(handle);
                }
            }
        }

        assert_eq!(handles.len(), 1);
        for handle in handles {
            handle.wait().await.unwrap();
        }
        assert_eq!(registry.marks.load(Ordering::SeqCst), 1);
        assert_eq!(spawner.calls.load(Ordering::SeqCst), 9);

        let again = controller
            .handle(LifecycleSignal::RecheckAll {
                instances: vec![id.clone()],
            })
            .await;
        assert!(matches!(
            again[0].result,
            Ok(TriggerOutcome::AlreadyGenerated)
        ));
    }

    #[tokio::test]
    async fn recheck_uses_fallback_origin_when_configured() {
        let registry = Arc::new(InMemoryRegistry::new());
        let spawner = Arc::new(LoggingSpawner::new());
        let controller = InstanceGenerationController::new(
            config(1),
            ControllerOptions {
                fallback_origin: Some(WorldPosition::new(0, 50, 0)),
                ..Default::default()
            },
            Arc::new(StaticCatalog::builtin()),
            registry.clone(),
            spawner.clone(),
            fixed_clock(),
            Arc::new(InlineStrategy),
        );

        let outcomes = controller
            .handle(LifecycleSignal::RecheckAll {
                instances: vec![managed(1), managed(2), InstanceId::new("lobby").unwrap()],
            })
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[2].result, Ok(TriggerOutcome::Ignored)));
        for outcome in outcomes.into_iter().take(2) {
            let report = outcome.result.unwrap().into_handle().unwrap().wait().await.unwrap();
            assert_eq!(report.origin.position, WorldPosition::new(0, 50, 0));
        }

        assert_eq!(spawner.spawned(), 18);
        let status = controller.status().await.unwrap();
        assert_eq!(
            status,
            ControllerStatus {
                known: 2,
                generated: 2,
                in_flight: 0,
                origins: 0,
            }
        );
    }

    #[tokio::test]
    async fn forget_instance_clears_the_origin() {
        let registry = Arc::new(InMemoryRegistry::new());
        let controller = controller(
            registry.clone(),
            Arc::new(LoggingSpawner::new()),
            Arc::new(InlineStrategy),
        );
        let id = managed(8);

        let handle = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5))
            .await
            .unwrap()
            .into_handle()
            .unwrap();
        handle.wait().await.unwrap();
        assert!(controller.origin(&id).is_some());
        assert_eq!(controller.status().await.unwrap().origins, 1);

        controller.forget_instance(&id);

        assert!(controller.origin(&id).is_none());
        assert!(registry.is_generated(&id).await.unwrap());
    }

    #[tokio::test]
    async fn registry_errors_surface_without_spawning() {
        let mut registry = MockInstanceRegistry::new();
        registry
            .expect_observe()
            .returning(|instance| Ok(InstanceGenerationState::observed(instance.clone())));
        registry
            .expect_is_generated()
            .returning(|_| Err(RepoError::database("is_generated", "disk unavailable")));
        let mut spawner = MockTileSpawner::new();
        spawner.expect_spawn_tile().times(0);

        let controller = controller(
            Arc::new(registry),
            Arc::new(spawner),
            Arc::new(InlineStrategy),
        );
        let id = managed(9);

        let result = handle_one(&controller, joined(id.clone(), 0.5, 78.0, 0.5)).await;
        assert!(matches!(result, Err(InstanceGenerationError::Registry(_))));
        assert!(!controller.is_in_flight(&id));
    }
}
