//! Stub adapters

use async_trait::async_trait;
use kgbuild::adapter::{Expansion, TableAdapter};
use kgbuild::{AdapterError, KNode, SourceAdapter};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Table adapter that fails for chosen input identifiers.
pub struct FlakyAdapter {
    inner: TableAdapter,
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FlakyAdapter {
    pub fn new(inner: TableAdapter, failing: &[&str]) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SourceAdapter for FlakyAdapter {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn query(&self, operation: &str, node: &KNode) -> Result<Expansion, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&node.identifier) {
            return Err(AdapterError::failed(operation, "service unavailable"));
        }
        self.inner.query(operation, node).await
    }
}
