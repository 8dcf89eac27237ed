//! Instance generation use cases.
//!
//! Turns world lifecycle signals into at most one successful layout
//! generation per instance.

mod controller;
mod origin;
mod signal;

pub use controller::{
    ControllerOptions, ControllerStatus, GenerationHandle, GenerationReport,
    InstanceGenerationController, InstanceGenerationError, SignalOutcome, TriggerOutcome,
};
pub use origin::OriginResolver;
pub use signal::{LifecycleSignal, ParticipantPosition};
