//! Seeded prefab selection.

use delve_domain::{DomainError, PrefabCategory, PrefabId, Rotation};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::infrastructure::ports::PrefabCatalog;

/// Chooses rooms, hallways, rotations and gates from a catalog snapshot.
///
/// The same seed and the same sequence of calls always yield the same
/// sequence of choices. Every draw fails with `CatalogEmpty` instead of
/// panicking when its category has no candidates.
pub struct PrefabSelector {
    rng: StdRng,
    rooms: Vec<PrefabId>,
    hallways: Vec<PrefabId>,
    gates: Vec<PrefabId>,
    blocked_gate: Option<PrefabId>,
    base: Option<PrefabId>,
}

impl PrefabSelector {
    pub fn new(seed: i64, catalog: &dyn PrefabCatalog) -> Self {
        let all_gates = catalog.list_by_category(PrefabCategory::Gate);
        let blocked_gate = all_gates.iter().find(|g| g.is_blocked_gate()).cloned();
        let gates = all_gates
            .into_iter()
            .filter(PrefabId::is_drawable_gate)
            .collect();

        Self {
            rng: StdRng::seed_from_u64(seed as u64),
            rooms: catalog.list_by_category(PrefabCategory::Room),
            hallways: catalog.list_by_category(PrefabCategory::Hallway),
            gates,
            blocked_gate,
            base: catalog
                .list_by_category(PrefabCategory::Base)
                .into_iter()
                .next(),
        }
    }

    /// Draw one uniform sample; below `room_probability` picks a room,
    /// otherwise a hallway.
    pub fn select_room_or_hallway(&mut self, room_probability: f64) -> Result<PrefabId, DomainError> {
        let sample: f64 = self.rng.gen();
        let (pool, category) = if sample < room_probability {
            (&self.rooms, PrefabCategory::Room)
        } else {
            (&self.hallways, PrefabCategory::Hallway)
        };
        pool.choose(&mut self.rng)
            .cloned()
            .ok_or(DomainError::catalog_empty(category))
    }

    pub fn select_random_rotation(&mut self) -> Rotation {
        Rotation::ALL[self.rng.gen_range(0..Rotation::ALL.len())]
    }

    /// Uniform draw over gates, never the blocked or clear variants.
    pub fn select_random_gate(&mut self) -> Result<PrefabId, DomainError> {
        self.gates
            .choose(&mut self.rng)
            .cloned()
            .ok_or(DomainError::catalog_empty(PrefabCategory::Gate))
    }

    pub fn blocked_gate(&self) -> Result<PrefabId, DomainError> {
        self.blocked_gate
            .clone()
            .ok_or(DomainError::catalog_empty(PrefabCategory::Gate))
    }

    pub fn base_prefab(&self) -> Result<PrefabId, DomainError> {
        self.base
            .clone()
            .ok_or(DomainError::catalog_empty(PrefabCategory::Base))
    }
}
