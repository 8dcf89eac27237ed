//! Per-instance grid anchors.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use delve_domain::{InstanceId, InstanceOrigin};

/// Origin of each instance, captured once and kept for the process lifetime.
#[derive(Debug, Default)]
pub struct OriginStore {
    origins: DashMap<InstanceId, InstanceOrigin>,
}

impl OriginStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `origin` unless the instance already has one.
    ///
    /// Returns the origin now held and whether this call stored it. The first
    /// capture wins under concurrent calls.
    pub fn capture(&self, instance: &InstanceId, origin: InstanceOrigin) -> (InstanceOrigin, bool) {
        match self.origins.entry(instance.clone()) {
            Entry::Occupied(held) => (*held.get(), false),
            Entry::Vacant(slot) => {
                slot.insert(origin);
                (origin, true)
            }
        }
    }

    pub fn get(&self, instance: &InstanceId) -> Option<InstanceOrigin> {
        self.origins.get(instance).map(|o| *o)
    }

    pub fn forget(&self, instance: &InstanceId) -> Option<InstanceOrigin> {
        self.origins.remove(instance).map(|(_, origin)| origin)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}
