//! In-memory state storage modules.
//!
//! Stores manage process-lifetime state that is never persisted:
//! - `InFlightSet` - Instances with a generation run in progress
//! - `OriginStore` - Resolved grid anchor per instance

pub mod in_flight;
pub mod origins;

// Re-export store types
pub use in_flight::{InFlightGuard, InFlightSet};
pub use origins::OriginStore;
