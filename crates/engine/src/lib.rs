//! Delve Engine library.
//!
//! Grid dungeon layout generation and once-per-instance generation control.
//!
//! ## Structure
//!
//! - `generation/` - Seeded prefab selection and the phased layout generator
//! - `use_cases/` - Instance generation controller and lifecycle signals
//! - `stores/` - Process-lifetime state (in-flight runs, captured origins)
//! - `infrastructure/` - Port traits and their adapters
//! - `app` - Application composition

pub mod app;
pub mod generation;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
