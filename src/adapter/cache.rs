//! Response cache for source adapters

use super::traits::{AdapterError, Expansion, SourceAdapter};
use crate::graph::KNode;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Memoizes successful `query` answers per (operation, identifier).
///
/// Failures are not cached, so a transient error is retried the next time
/// the same node is expanded.
pub struct CachedAdapter {
    inner: Arc<dyn SourceAdapter>,
    answers: DashMap<(String, String), Expansion>,
}

impl CachedAdapter {
    pub fn new(inner: Arc<dyn SourceAdapter>) -> Self {
        Self {
            inner,
            answers: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[async_trait]
impl SourceAdapter for CachedAdapter {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn query(&self, operation: &str, node: &KNode) -> Result<Expansion, AdapterError> {
        let key = (operation.to_string(), node.identifier.clone());
        if let Some(hit) = self.answers.get(&key) {
            trace!(operation, node = %node.identifier, "cache hit");
            return Ok(hit.value().clone());
        }
        let answer = self.inner.query(operation, node).await?;
        self.answers.insert(key, answer.clone());
        Ok(answer)
    }
}
