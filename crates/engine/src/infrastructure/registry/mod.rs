//! Instance registry implementations.

mod json_file;
mod memory;

pub use json_file::JsonFileRegistry;
pub use memory::InMemoryRegistry;
