//! YAML fixtures: a type graph plus recorded adapter answers in one document
//!
//! ```yaml
//! type_graph:
//!   - { id: disease_get_gene, from: Disease, to: Gene, prefixes: [DOID] }
//! sources:
//!   pharos:
//!     operations:
//!       disease_get_gene:
//!         "DOID:1": [{ target: "HGNC:1", type: Gene, label: BRCA1 }]
//! support:
//!   chemotext:
//!     - { a: "DOID:1", b: "HGNC:1" }
//! synonyms:
//!   "DOID:1": ["MESH:D1"]
//! ```

use super::cache::CachedAdapter;
use super::registry::AdapterRegistry;
use super::table::{TableAdapter, TableRow, TableSupport, TableSynonymizer};
use super::traits::SourceAdapter;
use crate::config::{ConfigError, ConfigResult};
use crate::graph::Properties;
use crate::typegraph::{InMemoryTypeGraph, OperationSpec};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceFixture {
    #[serde(default)]
    pub operations: BTreeMap<String, BTreeMap<String, Vec<TableRow>>>,
    /// Operations that always fail
    #[serde(default)]
    pub failing: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportPair {
    pub a: String,
    pub b: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdapterFixture {
    #[serde(default)]
    pub type_graph: Vec<OperationSpec>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceFixture>,
    #[serde(default)]
    pub support: BTreeMap<String, Vec<SupportPair>>,
    #[serde(default)]
    pub synonyms: HashMap<String, Vec<String>>,
}

impl AdapterFixture {
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn type_graph(&self) -> ConfigResult<InMemoryTypeGraph> {
        InMemoryTypeGraph::from_operations(self.type_graph.clone()).map_err(|e| ConfigError::Fixture(e.to_string()))
    }

    /// Build the adapter registry. Each source becomes a `TableAdapter`,
    /// wrapped in a `CachedAdapter` when `cache` is set.
    pub fn registry(&self, cache: bool) -> ConfigResult<AdapterRegistry> {
        let mut registry = AdapterRegistry::new();
        let mut served: HashSet<String> = HashSet::new();

        for (provenance, source) in &self.sources {
            let mut table = TableAdapter::new(provenance);
            for (operation, rows) in &source.operations {
                table = table.with_operation(operation);
                for (identifier, targets) in rows {
                    for row in targets {
                        table.insert(operation, identifier, row.clone());
                    }
                }
            }
            for operation in &source.failing {
                table = table.with_failing(operation);
            }

            let operations: Vec<String> = table.operations().into_iter().map(str::to_string).collect();
            let adapter: Arc<dyn SourceAdapter> = if cache {
                Arc::new(CachedAdapter::new(Arc::new(table)))
            } else {
                Arc::new(table)
            };
            for operation in operations {
                if !served.insert(operation.clone()) {
                    return Err(ConfigError::Fixture(format!(
                        "operation {} is served by more than one source",
                        operation
                    )));
                }
                registry.register_operation(operation, adapter.clone());
            }
        }

        for op in &self.type_graph {
            if !served.contains(&op.id) {
                warn!(operation = %op.id, "type graph operation has no source");
            }
        }

        for (provenance, pairs) in &self.support {
            let mut support = TableSupport::new(provenance);
            for pair in pairs {
                support.insert(&pair.a, &pair.b, pair.properties.clone());
            }
            registry.register_support(Arc::new(support));
        }

        if !self.synonyms.is_empty() {
            registry.set_synonymizer(Arc::new(TableSynonymizer::new(self.synonyms.clone())));
        }
        Ok(registry)
    }
}
