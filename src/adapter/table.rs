//! Table-driven adapters that replay recorded answers
//!
//! Useful for reproducible runs and tests: every answer comes from an
//! in-memory table, usually loaded from a YAML fixture.

use super::traits::{AdapterError, Expansion, SourceAdapter, SupportAdapter, Synonymizer};
use crate::graph::{ConceptType, KNode, Properties, Relationship};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One recorded neighbour of an input identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    pub target: String,
    #[serde(rename = "type")]
    pub node_type: ConceptType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    /// Relationship properties
    #[serde(default)]
    pub relation: Properties,
}

impl TableRow {
    pub fn new(target: impl Into<String>, node_type: ConceptType) -> Self {
        Self {
            target: target.into(),
            node_type,
            label: None,
            properties: HashMap::new(),
            relation: HashMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn to_node(&self) -> KNode {
        let mut node = KNode::new(&self.target, self.node_type);
        node.label = self.label.clone();
        node.properties = self.properties.clone();
        node
    }
}

/// Answers operations from `operation -> identifier -> rows` tables.
///
/// An input node matches on its own identifier first, then on its synonyms.
#[derive(Debug, Clone, Default)]
pub struct TableAdapter {
    provenance: String,
    tables: HashMap<String, HashMap<String, Vec<TableRow>>>,
    /// Operations that answer with an error, for failure scenarios
    failing: BTreeSet<String>,
}

impl TableAdapter {
    pub fn new(provenance: impl Into<String>) -> Self {
        Self {
            provenance: provenance.into(),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, operation: &str, identifier: &str, row: TableRow) {
        self.tables
            .entry(operation.to_string())
            .or_default()
            .entry(identifier.to_string())
            .or_default()
            .push(row);
    }

    pub fn with_row(mut self, operation: &str, identifier: &str, row: TableRow) -> Self {
        self.insert(operation, identifier, row);
        self
    }

    /// Declare `operation` served by this adapter even with no rows.
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.tables.entry(operation.to_string()).or_default();
        self
    }

    pub fn with_failing(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    /// Operations this table can answer.
    pub fn operations(&self) -> BTreeSet<&str> {
        self.tables.keys().chain(self.failing.iter()).map(String::as_str).collect()
    }
}

#[async_trait]
impl SourceAdapter for TableAdapter {
    fn id(&self) -> &str {
        &self.provenance
    }

    async fn query(&self, operation: &str, node: &KNode) -> Result<Expansion, AdapterError> {
        if self.failing.contains(operation) {
            return Err(AdapterError::failed(operation, "recorded failure"));
        }
        let table = self
            .tables
            .get(operation)
            .ok_or_else(|| AdapterError::UnknownOperation(operation.to_string()))?;
        let rows = node.all_identifiers().find_map(|id| table.get(id));
        Ok(rows
            .into_iter()
            .flatten()
            .map(|row| {
                let relationship =
                    Relationship::new(&self.provenance, operation).with_properties(row.relation.clone());
                (relationship, row.to_node())
            })
            .collect())
    }
}

/// Answers support queries from a symmetric pair table.
#[derive(Debug, Clone, Default)]
pub struct TableSupport {
    provenance: String,
    pairs: HashMap<(String, String), Properties>,
}

impl TableSupport {
    pub fn new(provenance: impl Into<String>) -> Self {
        Self {
            provenance: provenance.into(),
            pairs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, a: &str, b: &str, properties: Properties) {
        self.pairs.insert(Self::key(a, b), properties);
    }

    pub fn with_pair(mut self, a: &str, b: &str) -> Self {
        self.insert(a, b, HashMap::new());
        self
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }
}

#[async_trait]
impl SupportAdapter for TableSupport {
    fn id(&self) -> &str {
        &self.provenance
    }

    async fn term_to_term(&self, a: &KNode, b: &KNode) -> Result<Option<Relationship>, AdapterError> {
        for x in a.all_identifiers() {
            for y in b.all_identifiers() {
                if let Some(properties) = self.pairs.get(&Self::key(x, y)) {
                    return Ok(Some(
                        Relationship::new(&self.provenance, "term_to_term").with_properties(properties.clone()),
                    ));
                }
            }
        }
        Ok(None)
    }
}

/// Adds recorded alternate identifiers.
#[derive(Debug, Clone, Default)]
pub struct TableSynonymizer {
    synonyms: HashMap<String, Vec<String>>,
}

impl TableSynonymizer {
    pub fn new(synonyms: HashMap<String, Vec<String>>) -> Self {
        Self { synonyms }
    }
}

#[async_trait]
impl Synonymizer for TableSynonymizer {
    async fn synonymize(&self, node: &mut KNode) -> Result<(), AdapterError> {
        if let Some(ids) = self.synonyms.get(&node.identifier) {
            node.add_synonyms(ids.iter().cloned());
        }
        Ok(())
    }
}
