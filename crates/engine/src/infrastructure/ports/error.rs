//! Error types for port operations.

use delve_domain::GridPosition;

/// Registry operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Storage operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Errors from placing a tile in the world.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpawnError {
    #[error("Failed to place tile at {position}: {message}")]
    Placement {
        position: GridPosition,
        message: String,
    },
    #[error("World unavailable: {0}")]
    Unavailable(String),
}

/// Errors from querying the block under a participant.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("Chunk not loaded at ({x}, {z})")]
    ChunkNotLoaded { x: i32, z: i32 },
    #[error("World unavailable: {0}")]
    Unavailable(String),
}
