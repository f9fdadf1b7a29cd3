//! Edge representation: adapter relationships and assembled graph edges

use super::node::{KNode, NodeIndex, Properties};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Provenance tag and function name used for lookup edges.
pub const LOOKUP: &str = "lookup";

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(Uuid);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable slot index of an edge inside a `KnowledgeGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(pub(crate) usize);

/// What an adapter asserts about a pair of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Which data source produced this
    pub provenance: String,
    /// Operation (or function) name that produced it
    pub function: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Relationship {
    pub fn new(provenance: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            provenance: provenance.into(),
            function: function.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// Downstream role of an edge, used by persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRole {
    Lookup,
    Support,
    Result,
}

impl EdgeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Support => "support",
            Self::Result => "result",
        }
    }
}

/// An edge as produced by the executor or support discovery.
///
/// Endpoints are carried by value; the assembler resolves them to canonical
/// graph nodes on insertion.
#[derive(Debug, Clone)]
pub struct KEdge {
    pub id: EdgeId,
    pub source: KNode,
    pub target: KNode,
    pub relationship: Relationship,
    pub is_synonym: bool,
    pub is_support: bool,
    /// Produced while expanding from the end anchor inward
    pub reversed: bool,
}

impl KEdge {
    pub fn new(source: KNode, target: KNode, relationship: Relationship) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
            relationship,
            is_synonym: false,
            is_support: false,
            reversed: false,
        }
    }

    /// An edge asserting that `source` and `target` are the same entity.
    pub fn synonym(source: KNode, target: KNode, relationship: Relationship) -> Self {
        Self {
            is_synonym: true,
            ..Self::new(source, target, relationship)
        }
    }

    /// An edge from a lookup (free-text) node to the entity it names.
    pub fn lookup(source: KNode, target: KNode) -> Self {
        Self::new(source, target, Relationship::new(LOOKUP, LOOKUP))
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }
}

/// An edge stored in the assembled multigraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub relationship: Relationship,
    pub is_support: bool,
    pub reversed: bool,
}

impl GraphEdge {
    pub fn role(&self) -> EdgeRole {
        if self.is_support {
            EdgeRole::Support
        } else if self.relationship.provenance == LOOKUP {
            EdgeRole::Lookup
        } else {
            EdgeRole::Result
        }
    }

    /// The endpoint opposite `node`, or `None` if the edge does not touch it.
    pub fn other(&self, node: NodeIndex) -> Option<NodeIndex> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}
