//! Instance identity and the durable per-instance generation record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::grid::{GridTransform, WorldPosition};

/// Name of one live world instance, e.g. `instance-Vex_The_Lich_Dungeon-2f1c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Instance name cannot be empty"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InstanceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for InstanceId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstanceId> for String {
    fn from(value: InstanceId) -> Self {
        value.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Substring that marks an instance as one this generator manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceNamePattern(String);

impl InstanceNamePattern {
    pub const DEFAULT: &'static str = "Vex_The_Lich_Dungeon";

    pub fn new(pattern: impl Into<String>) -> Result<Self, DomainError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(DomainError::validation("Instance name pattern cannot be empty"));
        }
        Ok(Self(pattern))
    }

    pub fn matches(&self, instance: &InstanceId) -> bool {
        instance.as_str().contains(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstanceNamePattern {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

/// Durable generation record of one instance.
///
/// Created on first observation with `generated = false`; only ever flipped
/// to generated, never back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceGenerationState {
    pub instance: InstanceId,
    pub generated: bool,
    pub generated_at_ms: i64,
    pub tile_count: usize,
}

impl InstanceGenerationState {
    pub fn observed(instance: InstanceId) -> Self {
        Self {
            instance,
            generated: false,
            generated_at_ms: 0,
            tile_count: 0,
        }
    }

    pub fn mark_generated(&mut self, generated_at_ms: i64, tile_count: usize) {
        self.generated = true;
        self.generated_at_ms = generated_at_ms;
        self.tile_count = tile_count;
    }
}

/// Resolved grid anchor of one instance.
///
/// `base_present` records that the base structure was found in the world, so
/// the generator must not place another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceOrigin {
    pub position: WorldPosition,
    pub base_present: bool,
}

impl InstanceOrigin {
    pub fn new(position: WorldPosition, base_present: bool) -> Self {
        Self {
            position,
            base_present,
        }
    }

    pub fn transform(&self) -> GridTransform {
        GridTransform::new(self.position)
    }
}
