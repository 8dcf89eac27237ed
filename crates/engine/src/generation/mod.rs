//! Procedural layout generation.
//!
//! `PrefabSelector` makes every random choice from one seed; `LayoutGenerator`
//! runs the phased algorithm that turns those choices into a tile map.

mod generator;
mod selector;

pub use generator::{BasePlacement, GenerationError, GenerationPhase, LayoutGenerator, LayoutResult};
pub use selector::PrefabSelector;
