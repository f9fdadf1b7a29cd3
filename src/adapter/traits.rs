//! Adapter traits: the contracts external knowledge sources implement
//!
//! A source adapter expands one node along one operation. A support adapter
//! looks for independent evidence linking two nodes. A synonymizer adds
//! alternate identifiers to a node before it is expanded.

use crate::graph::{KNode, Relationship};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors an adapter call can produce
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{operation} failed: {message}")]
    CallFailed { operation: String, message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl AdapterError {
    pub fn failed(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::CallFailed {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

/// One operation's answer for one input node.
pub type Expansion = Vec<(Relationship, KNode)>;

/// Expands a node along a single operation.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provenance tag attached to relationships this adapter produces
    fn id(&self) -> &str;

    /// Neighbours of `node` reachable by `operation`.
    async fn query(&self, operation: &str, node: &KNode) -> Result<Expansion, AdapterError>;
}

/// Finds evidence that two nodes are related.
#[async_trait]
pub trait SupportAdapter: Send + Sync {
    fn id(&self) -> &str;

    /// Batch pre-computation over every node in the graph. Called once per
    /// support pass before any `term_to_term` call.
    async fn prepare(&self, _nodes: &[KNode]) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Evidence linking `a` and `b`, if any.
    async fn term_to_term(&self, a: &KNode, b: &KNode) -> Result<Option<Relationship>, AdapterError>;
}

/// Adds alternate identifiers to a node.
#[async_trait]
pub trait Synonymizer: Send + Sync {
    async fn synonymize(&self, node: &mut KNode) -> Result<(), AdapterError>;
}

/// Leaves nodes untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSynonymizer;

#[async_trait]
impl Synonymizer for NoopSynonymizer {
    async fn synonymize(&self, _node: &mut KNode) -> Result<(), AdapterError> {
        Ok(())
    }
}
