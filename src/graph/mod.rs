//! Knowledge graph data structures and assembly
//!
//! Instance nodes and edges, the identifier-resolving multigraph that holds
//! them, and the whole-graph passes run after execution: pruning,
//! enhancement and support discovery.

mod concept;
mod edge;
mod enhance;
mod knowledge;
mod node;
mod paths;
mod prune;
mod support;

#[cfg(test)]
mod tests;

pub use concept::{ConceptType, UnknownConceptType};
pub use edge::{EdgeId, EdgeIndex, EdgeRole, GraphEdge, KEdge, Relationship, LOOKUP};
pub use knowledge::{GraphError, GraphResult, Insertion, KnowledgeGraph};
pub use node::{curie_prefix, KNode, NodeIndex, Properties, PropertyValue};
pub use support::SupportLedger;
