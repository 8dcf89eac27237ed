//! Phased layout generation.
//!
//! A run walks `NotStarted -> BasePlaced -> GridFilled -> GatesAssigned ->
//! EdgesBlocked -> Done` strictly in order. Any error aborts the run and the
//! caller gets a failed [`LayoutResult`] with an empty layout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use delve_domain::{
    Direction, DomainError, GenerationConfig, GridPosition, Layout, PrefabCategory, Rotation,
    Tile, TileKind, TileMap,
};

use super::selector::PrefabSelector;
use crate::infrastructure::ports::PrefabCatalog;

/// Generator state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GenerationPhase {
    NotStarted,
    BasePlaced,
    GridFilled,
    GatesAssigned,
    EdgesBlocked,
    Done,
}

impl GenerationPhase {
    /// The only phase allowed to follow this one.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::BasePlaced),
            Self::BasePlaced => Some(Self::GridFilled),
            Self::GridFilled => Some(Self::GatesAssigned),
            Self::GatesAssigned => Some(Self::EdgesBlocked),
            Self::EdgesBlocked => Some(Self::Done),
            Self::Done => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("No prefab available in category {0}")]
    CatalogEmpty(PrefabCategory),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Phase {attempted:?} cannot follow {current:?}")]
    PhaseOrder {
        current: GenerationPhase,
        attempted: GenerationPhase,
    },
}

/// Whether the base structure still has to be placed at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasePlacement {
    #[default]
    Place,
    /// The base already exists in the world; leave the origin empty.
    AlreadyPresent,
}

/// Outcome of one generation run.
#[derive(Debug)]
pub struct LayoutResult {
    pub success: bool,
    /// Empty unless `success`.
    pub layout: Layout,
    pub elapsed: Duration,
    pub failure: Option<GenerationError>,
    /// Last phase reached.
    pub phase: GenerationPhase,
    /// Slots left empty because the catalog had nothing to offer.
    pub skipped_slots: usize,
    pub warnings: Vec<String>,
}

impl LayoutResult {
    pub fn tile_count(&self) -> usize {
        self.layout.len()
    }

    /// The layout, or the phase at which the run failed and why.
    pub fn into_layout(self) -> Result<Layout, (GenerationPhase, GenerationError)> {
        match self.failure {
            None if self.success => Ok(self.layout),
            Some(error) => Err((self.phase, error)),
            None => Err((
                self.phase,
                GenerationError::PhaseOrder {
                    current: self.phase,
                    attempted: GenerationPhase::Done,
                },
            )),
        }
    }
}

/// Generates layouts from a fixed configuration and catalog.
///
/// Each call to [`LayoutGenerator::generate`] seeds a fresh selector, so the
/// same generator always produces the same layout.
pub struct LayoutGenerator {
    config: GenerationConfig,
    catalog: Arc<dyn PrefabCatalog>,
}

impl LayoutGenerator {
    pub fn new(config: GenerationConfig, catalog: Arc<dyn PrefabCatalog>) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generate(&self, base: BasePlacement) -> LayoutResult {
        let started = Instant::now();
        tracing::info!(
            seed = self.config.seed(),
            radius = self.config.radius(),
            room_probability = self.config.room_probability(),
            "Starting layout generation"
        );

        let mut build = LayoutBuild::new(&self.config, self.catalog.as_ref());
        match build.run(base) {
            Ok(()) => {
                let elapsed = started.elapsed();
                let LayoutBuild {
                    tiles,
                    phase,
                    skipped_slots,
                    warnings,
                    ..
                } = build;
                let layout = tiles.freeze();
                tracing::info!(
                    tiles = layout.len(),
                    skipped = skipped_slots,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Layout generation complete"
                );
                LayoutResult {
                    success: true,
                    layout,
                    elapsed,
                    failure: None,
                    phase,
                    skipped_slots,
                    warnings,
                }
            }
            Err(error) => {
                tracing::error!(phase = ?build.phase, error = %error, "Layout generation failed");
                LayoutResult {
                    success: false,
                    layout: Layout::empty(),
                    elapsed: started.elapsed(),
                    failure: Some(error),
                    phase: build.phase,
                    skipped_slots: build.skipped_slots,
                    warnings: build.warnings,
                }
            }
        }
    }
}

/// Mutable state of one run.
struct LayoutBuild<'a> {
    config: &'a GenerationConfig,
    selector: PrefabSelector,
    tiles: TileMap,
    phase: GenerationPhase,
    skipped_slots: usize,
    warnings: Vec<String>,
}

impl<'a> LayoutBuild<'a> {
    fn new(config: &'a GenerationConfig, catalog: &dyn PrefabCatalog) -> Self {
        Self {
            config,
            selector: PrefabSelector::new(config.seed(), catalog),
            tiles: TileMap::new(),
            phase: GenerationPhase::NotStarted,
            skipped_slots: 0,
            warnings: Vec::new(),
        }
    }

    fn run(&mut self, base: BasePlacement) -> Result<(), GenerationError> {
        self.place_base(base)?;
        self.advance(GenerationPhase::BasePlaced)?;
        self.fill_grid()?;
        self.advance(GenerationPhase::GridFilled)?;
        self.assign_gates()?;
        self.advance(GenerationPhase::GatesAssigned)?;
        self.block_edges()?;
        self.advance(GenerationPhase::EdgesBlocked)?;
        self.advance(GenerationPhase::Done)
    }

    fn advance(&mut self, to: GenerationPhase) -> Result<(), GenerationError> {
        if self.phase.next() != Some(to) {
            return Err(GenerationError::PhaseOrder {
                current: self.phase,
                attempted: to,
            });
        }
        tracing::debug!(phase = ?to, "Generation phase complete");
        self.phase = to;
        Ok(())
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    fn place_base(&mut self, base: BasePlacement) -> Result<(), GenerationError> {
        if base == BasePlacement::AlreadyPresent {
            tracing::info!("Skipping base tile, base structure already present");
            return Ok(());
        }
        let prefab = self.selector.base_prefab().map_err(|e| match e {
            DomainError::CatalogEmpty(category) => GenerationError::CatalogEmpty(category),
            other => GenerationError::Domain(other),
        })?;
        tracing::info!(prefab = %prefab, "Placing base tile at origin");
        self.tiles.insert(Tile::new(
            GridPosition::ORIGIN,
            prefab,
            Rotation::Deg0,
            TileKind::Base,
        ))?;
        Ok(())
    }

    fn fill_grid(&mut self) -> Result<(), GenerationError> {
        let radius = self.config.radius();
        let room_probability = self.config.room_probability();
        let mut placed = 0usize;

        for x in -radius..=radius {
            for z in -radius..=radius {
                let position = GridPosition::new(x, z);
                if position.is_origin() {
                    continue;
                }
                let prefab = match self.selector.select_room_or_hallway(room_probability) {
                    Ok(prefab) => prefab,
                    Err(e) if e.is_catalog_empty() => {
                        self.skipped_slots += 1;
                        self.warn(format!(
                            "No rooms or hallways available for tile at {position}"
                        ));
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                let rotation = self.selector.select_random_rotation();
                let kind = TileKind::for_prefab(&prefab);
                self.tiles.insert(Tile::new(position, prefab, rotation, kind))?;
                placed += 1;
            }
        }

        tracing::info!(tiles = placed, radius, "Filled grid");
        Ok(())
    }

    /// One independent draw per tile face; the two faces of a shared
    /// boundary may end up with different gates.
    fn assign_gates(&mut self) -> Result<(), GenerationError> {
        let mut assigned = 0usize;

        for position in self.tiles.positions() {
            for direction in Direction::ALL {
                if !self.needs_gate(position, direction) {
                    continue;
                }
                let gate = match self.selector.select_random_gate() {
                    Ok(gate) => gate,
                    Err(e) if e.is_catalog_empty() => {
                        self.warn(format!(
                            "No gate prefabs available for tile at {position} facing {direction}"
                        ));
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                if let Some(tile) = self.tiles.get_mut(position) {
                    tile.set_gate(direction, gate)?;
                    assigned += 1;
                }
            }
        }

        tracing::info!(gates = assigned, "Assigned gates");
        Ok(())
    }

    fn needs_gate(&self, position: GridPosition, direction: Direction) -> bool {
        self.tiles.contains(position.neighbor(direction))
            && self
                .tiles
                .get(position)
                .is_some_and(|tile| !tile.has_gate(direction))
    }

    fn block_edges(&mut self) -> Result<(), GenerationError> {
        let blocked = match self.selector.blocked_gate() {
            Ok(gate) => gate,
            Err(_) => {
                self.warn("No blocked gate prefab available, skipping outer edge blocking".into());
                return Ok(());
            }
        };
        let mut sealed = 0usize;

        for position in self.tiles.positions() {
            for direction in Direction::ALL {
                if self.tiles.contains(position.neighbor(direction)) {
                    continue;
                }
                if let Some(tile) = self.tiles.get_mut(position) {
                    if tile.has_gate(direction) {
                        continue;
                    }
                    tile.set_gate(direction, blocked.clone())?;
                    sealed += 1;
                }
            }
        }

        tracing::info!(gates = sealed, "Blocked outer edges");
        Ok(())
    }
}
