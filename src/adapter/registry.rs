//! Adapter registry: maps operation ids to the adapters that serve them
//!
//! Plans name operations; the executor resolves each step here. Support
//! adapters and the synonymizer are held alongside so one registry carries
//! everything a build talks to.

use super::traits::{AdapterError, NoopSynonymizer, SourceAdapter, SupportAdapter, Synonymizer};
use std::collections::HashMap;
use std::sync::Arc;

pub struct AdapterRegistry {
    operations: HashMap<String, Arc<dyn SourceAdapter>>,
    support: Vec<Arc<dyn SupportAdapter>>,
    synonymizer: Arc<dyn Synonymizer>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            support: Vec::new(),
            synonymizer: Arc::new(NoopSynonymizer),
        }
    }

    /// Serve `operation` with `adapter`, replacing any earlier registration.
    pub fn register_operation(&mut self, operation: impl Into<String>, adapter: Arc<dyn SourceAdapter>) {
        self.operations.insert(operation.into(), adapter);
    }

    pub fn register_support(&mut self, adapter: Arc<dyn SupportAdapter>) {
        self.support.push(adapter);
    }

    pub fn set_synonymizer(&mut self, synonymizer: Arc<dyn Synonymizer>) {
        self.synonymizer = synonymizer;
    }

    pub fn with_synonymizer(mut self, synonymizer: Arc<dyn Synonymizer>) -> Self {
        self.set_synonymizer(synonymizer);
        self
    }

    pub fn operation(&self, operation: &str) -> Result<Arc<dyn SourceAdapter>, AdapterError> {
        self.operations
            .get(operation)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownOperation(operation.to_string()))
    }

    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn support(&self) -> &[Arc<dyn SupportAdapter>] {
        &self.support
    }

    pub fn synonymizer(&self) -> Arc<dyn Synonymizer> {
        self.synonymizer.clone()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Expansion;
    use crate::graph::{ConceptType, KNode, Relationship};
    use async_trait::async_trait;

    struct EchoAdapter;

    #[async_trait]
    impl SourceAdapter for EchoAdapter {
        fn id(&self) -> &str {
            "echo"
        }

        async fn query(&self, operation: &str, node: &KNode) -> Result<Expansion, AdapterError> {
            Ok(vec![(
                Relationship::new(self.id(), operation),
                KNode::new(format!("ECHO:{}", node.identifier), ConceptType::Gene),
            )])
        }
    }

    #[tokio::test]
    async fn resolves_registered_operation() {
        let mut registry = AdapterRegistry::new();
        registry.register_operation("disease_get_gene", Arc::new(EchoAdapter));

        let adapter = registry.operation("disease_get_gene").unwrap();
        let out = adapter
            .query("disease_get_gene", &KNode::new("DOID:1", ConceptType::Disease))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.identifier, "ECHO:DOID:1");
    }

    #[test]
    fn unknown_operation_is_an_error() {
        let registry = AdapterRegistry::new();
        let err = registry.operation("nope").err().unwrap();
        assert!(matches!(err, AdapterError::UnknownOperation(op) if op == "nope"));
    }

    #[tokio::test]
    async fn default_synonymizer_is_noop() {
        let registry = AdapterRegistry::default();
        let mut node = KNode::new("DOID:1", ConceptType::Disease);
        registry.synonymizer().synonymize(&mut node).await.unwrap();
        assert!(node.synonyms.is_empty());
    }
}
