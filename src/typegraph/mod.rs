//! Type graph: which concept types connect to which, via which operation
//!
//! Consulted only at compile time to turn traversal patterns into plans.

mod memory;

pub use memory::{InMemoryTypeGraph, OperationSpec};

use crate::query::{Plan, TraversalQuery};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeGraphError {
    #[error("Type graph query failed: {0}")]
    Query(String),

    #[error("Invalid type graph definition: {0}")]
    Definition(String),
}

/// Answers "which concrete operation sequences satisfy this pattern?"
#[async_trait]
pub trait TypeGraph: Send + Sync {
    async fn get_transitions(&self, query: &TraversalQuery) -> Result<Vec<Plan>, TypeGraphError>;
}
