//! Prefab identifiers and catalog categories.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Substring marking a prefab as a hallway.
pub const HALLWAY_MARKER: &str = "Hallway";

/// Substring marking the gate used to seal outer edges.
pub const BLOCKED_GATE_MARKER: &str = "Blocked";

/// Substring marking a cosmetic "clear" gate, never drawn at random.
pub const CLEAR_GATE_MARKER: &str = "Clear";

/// Catalog category used when asking the catalog for candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefabCategory {
    Room,
    Hallway,
    Gate,
    Base,
}

impl fmt::Display for PrefabCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => write!(f, "room"),
            Self::Hallway => write!(f, "hallway"),
            Self::Gate => write!(f, "gate"),
            Self::Base => write!(f, "base"),
        }
    }
}

/// Mod-relative prefab path, e.g. `Dungeon/Rooms/Vex_Room_S_Archers`.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrefabId(String);

impl PrefabId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Prefab identifier cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_hallway(&self) -> bool {
        self.0.contains(HALLWAY_MARKER)
    }

    pub fn is_blocked_gate(&self) -> bool {
        self.0.contains(BLOCKED_GATE_MARKER)
    }

    /// Whether this gate may be chosen by a random gate draw.
    pub fn is_drawable_gate(&self) -> bool {
        !self.is_blocked_gate() && !self.0.contains(CLEAR_GATE_MARKER)
    }
}

impl TryFrom<String> for PrefabId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PrefabId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrefabId> for String {
    fn from(value: PrefabId) -> Self {
        value.0
    }
}

impl AsRef<str> for PrefabId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
