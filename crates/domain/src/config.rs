//! Generation parameters supplied once per controller.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default generation radius in tiles.
pub const DEFAULT_RADIUS: i32 = 5;

/// Default chance that a grid slot receives a room rather than a hallway.
pub const DEFAULT_ROOM_PROBABILITY: f64 = 0.7;

/// Seed, extent and execution mode of one generator.
///
/// Read-only once built; use [`GenerationConfig::new`] to get a validated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    seed: i64,
    radius: i32,
    room_probability: f64,
    async_generation: bool,
}

impl GenerationConfig {
    pub fn new(
        seed: i64,
        radius: i32,
        room_probability: f64,
        async_generation: bool,
    ) -> Result<Self, DomainError> {
        if radius < 0 {
            return Err(DomainError::validation(format!(
                "Generation radius must be non-negative, got {radius}"
            )));
        }
        if !(0.0..=1.0).contains(&room_probability) {
            return Err(DomainError::validation(format!(
                "Room probability must be within [0, 1], got {room_probability}"
            )));
        }
        Ok(Self {
            seed,
            radius,
            room_probability,
            async_generation,
        })
    }

    /// Defaults for everything but the seed.
    pub fn with_seed(seed: i64) -> Self {
        Self {
            seed,
            radius: DEFAULT_RADIUS,
            room_probability: DEFAULT_ROOM_PROBABILITY,
            async_generation: true,
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn room_probability(&self) -> f64 {
        self.room_probability
    }

    pub fn async_generation(&self) -> bool {
        self.async_generation
    }

    /// Number of grid slots covered by the radius, origin included.
    pub fn slot_count(&self) -> usize {
        let side = (2 * self.radius + 1) as usize;
        side * side
    }
}
