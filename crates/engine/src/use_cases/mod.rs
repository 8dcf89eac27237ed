//! Use cases - orchestration across ports and stores.
//!
//! - `instance_generation` - Run layout generation at most once per instance

pub mod instance_generation;

pub use instance_generation::InstanceGenerationController;
