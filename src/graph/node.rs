//! Instance node representation in the knowledge graph

use super::concept::ConceptType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Stable slot index of a node inside a `KnowledgeGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<PropertyValue>),
    Object(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Every string held by this value, descending into arrays.
    pub fn strings(&self) -> Vec<&str> {
        match self {
            Self::String(s) => vec![s.as_str()],
            Self::Array(items) => items.iter().flat_map(|v| v.strings()).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// Properties collection
pub type Properties = HashMap<String, PropertyValue>;

/// One real-world entity encountered during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNode {
    /// Identifier, usually a CURIE. Stable once created.
    pub identifier: String,
    pub node_type: ConceptType,
    pub label: Option<String>,
    /// Source-specific properties
    #[serde(default)]
    pub properties: Properties,
    /// Alternate identifiers for the same entity
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
}

impl KNode {
    pub fn new(identifier: impl Into<String>, node_type: ConceptType) -> Self {
        Self {
            identifier: identifier.into(),
            node_type,
            label: None,
            properties: HashMap::new(),
            synonyms: BTreeSet::new(),
        }
    }

    /// A lookup node for free text, identified as `Type:text`.
    pub fn named(node_type: ConceptType, text: &str) -> Self {
        Self::new(format!("{}:{}", node_type, text), node_type).with_label(text)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_synonyms(synonyms);
        self
    }

    /// Add alternate identifiers. The node's own identifier is never stored.
    pub fn add_synonyms<I, S>(&mut self, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for s in synonyms {
            let s = s.into();
            if s != self.identifier {
                self.synonyms.insert(s);
            }
        }
    }

    /// The identifier's CURIE prefix (`DOID` for `DOID:123`).
    pub fn curie_prefix(&self) -> &str {
        curie_prefix(&self.identifier)
    }

    /// The identifier followed by every synonym.
    pub fn all_identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.identifier.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }

    /// Short user-readable form: `label (identifier)` when labelled.
    pub fn shortname(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({})", label, self.identifier),
            None => self.identifier.clone(),
        }
    }

    /// Fold another description of the same entity into this one without
    /// overwriting anything already known.
    pub fn absorb(&mut self, other: &KNode) {
        if self.label.is_none() {
            self.label = other.label.clone();
        }
        for (k, v) in &other.properties {
            self.properties.entry(k.clone()).or_insert_with(|| v.clone());
        }
        let other_ids: Vec<String> = other.all_identifiers().map(str::to_string).collect();
        self.add_synonyms(other_ids);
    }
}

/// CURIE prefix of an identifier; the whole string when there is no colon.
pub fn curie_prefix(identifier: &str) -> &str {
    identifier.split(':').next().unwrap_or(identifier)
}
