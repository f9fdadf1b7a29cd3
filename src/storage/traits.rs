//! Sink trait definitions

use crate::graph::KnowledgeGraph;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while exporting a graph
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for a finished knowledge graph.
///
/// Writing the same graph under the same label twice must leave the sink
/// in the same state as writing it once.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn write(&self, graph: &KnowledgeGraph, label: &str) -> StorageResult<()>;
}
