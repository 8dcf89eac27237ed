//! World lifecycle signals.

use std::fmt;
use std::sync::Arc;

use delve_domain::InstanceId;

use crate::infrastructure::ports::GroundProbe;

/// Participant position as reported by the world, in fractional blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipantPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ParticipantPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for ParticipantPosition {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Events that may start generation for an instance.
#[derive(Clone)]
pub enum LifecycleSignal {
    /// An instance world was created or started.
    InstanceStarted { instance: InstanceId },
    /// A participant entered an instance. Carries what origin resolution needs.
    ParticipantJoined {
        instance: InstanceId,
        position: ParticipantPosition,
        ground: Arc<dyn GroundProbe>,
    },
    /// Periodic poll over every live instance.
    RecheckAll { instances: Vec<InstanceId> },
}

impl LifecycleSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstanceStarted { .. } => "instance_started",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::RecheckAll { .. } => "recheck_all",
        }
    }
}

impl fmt::Debug for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstanceStarted { instance } => f
                .debug_struct("InstanceStarted")
                .field("instance", instance)
                .finish(),
            Self::ParticipantJoined {
                instance, position, ..
            } => f
                .debug_struct("ParticipantJoined")
                .field("instance", instance)
                .field("position", position)
                .finish_non_exhaustive(),
            Self::RecheckAll { instances } => f
                .debug_struct("RecheckAll")
                .field("instances", instances)
                .finish(),
        }
    }
}
