//! Set of instances currently being generated.

use std::sync::Arc;

use dashmap::DashSet;
use delve_domain::InstanceId;

/// Concurrent in-flight set with atomic add-if-absent.
///
/// Membership is held by an [`InFlightGuard`]; dropping the guard removes
/// the instance, whether the run finished, failed or was abandoned.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    members: Arc<DashSet<InstanceId>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `instance` unless already present. `None` means another run owns it.
    pub fn try_acquire(&self, instance: &InstanceId) -> Option<InFlightGuard> {
        if self.members.insert(instance.clone()) {
            Some(InFlightGuard {
                members: Arc::clone(&self.members),
                instance: instance.clone(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, instance: &InstanceId) -> bool {
        self.members.contains(instance)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Membership token for one instance in an [`InFlightSet`].
#[derive(Debug)]
pub struct InFlightGuard {
    members: Arc<DashSet<InstanceId>>,
    instance: InstanceId,
}

impl InFlightGuard {
    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.members.remove(&self.instance);
    }
}
