//! The assembled knowledge graph: a multigraph keyed by identifier
//!
//! Nodes and edges live in arenas addressed by `NodeIndex`/`EdgeIndex`.
//! Removed slots become tombstones so indices held elsewhere stay valid.
//! Every identifier a node is known by (its own and its synonyms) maps to
//! the node's slot.

use super::concept::ConceptType;
use super::edge::{EdgeIndex, GraphEdge, KEdge, Relationship};
use super::node::{KNode, NodeIndex};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while assembling or analysing the graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Synonym edge between two unknown nodes: {0} and {1}")]
    SynonymOfUnknownPair(String, String),

    #[error("No path between terminals {0} and {1}")]
    NoPathBetweenTerminals(String, String),

    #[error("No path connects any start node to any end node")]
    NoCrossPathConnectivity,
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Outcome of inserting one `KEdge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// A new edge was stored
    Added(EdgeIndex),
    /// An identical edge already existed
    Existing(EdgeIndex),
    /// Synonym edge: two nodes were merged into the first
    Merged(NodeIndex),
    /// Synonym edge: a new identifier was attached to a known node
    Attached(NodeIndex),
    /// Synonym edge whose endpoints already resolve to the same node
    Unchanged(NodeIndex),
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<Option<KNode>>,
    edges: Vec<Option<GraphEdge>>,
    /// Incident edge slots per node slot (self-loops listed once)
    incident: Vec<Vec<EdgeIndex>>,
    by_identifier: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // === Lookup ===

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    pub fn node(&self, index: NodeIndex) -> Option<&KNode> {
        self.nodes.get(index.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut KNode> {
        self.nodes.get_mut(index.0).and_then(Option::as_mut)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&GraphEdge> {
        self.edges.get(index.0).and_then(Option::as_ref)
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &KNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeIndex(i), n)))
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &GraphEdge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeIndex(i), e)))
    }

    /// Slot of the node known by `identifier` (own id or synonym).
    pub fn resolve(&self, identifier: &str) -> Option<NodeIndex> {
        self.by_identifier.get(identifier).copied()
    }

    /// The node known by `identifier`.
    pub fn get(&self, identifier: &str) -> Option<&KNode> {
        self.resolve(identifier).and_then(|i| self.node(i))
    }

    /// Slot matching any identifier carried by `node`, own id first.
    pub fn resolve_node(&self, node: &KNode) -> Option<NodeIndex> {
        node.all_identifiers().find_map(|id| self.resolve(id))
    }

    pub fn incident_edges(&self, index: NodeIndex) -> &[EdgeIndex] {
        self.incident.get(index.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Concept types of every other node adjacent to `index`, either
    /// direction. Self-loops do not count.
    pub fn neighbor_types(&self, index: NodeIndex) -> HashSet<ConceptType> {
        self.incident_edges(index)
            .iter()
            .filter_map(|e| self.edge(*e))
            .filter_map(|e| e.other(index))
            .filter(|n| *n != index)
            .filter_map(|n| self.node(n))
            .map(|n| n.node_type)
            .collect()
    }

    /// Nodes whose type matches one of `types`.
    pub fn nodes_of_types(&self, types: &HashSet<ConceptType>) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| types.iter().any(|t| t.matches(&n.node_type)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Start and end terminal nodes for the given terminal types.
    pub fn terminal_nodes(
        &self,
        start_types: &HashSet<ConceptType>,
        end_types: &HashSet<ConceptType>,
    ) -> (Vec<NodeIndex>, Vec<NodeIndex>) {
        (self.nodes_of_types(start_types), self.nodes_of_types(end_types))
    }

    // === Mutation ===

    /// Insert a node, or fold it into the node already known by one of its
    /// identifiers.
    pub fn add_node(&mut self, node: KNode) -> NodeIndex {
        match self.resolve_node(&node) {
            Some(index) => {
                self.fold_into(index, &node);
                index
            }
            None => {
                let index = NodeIndex(self.nodes.len());
                for id in node.all_identifiers() {
                    self.by_identifier.insert(id.to_string(), index);
                }
                trace!(identifier = %node.identifier, %index, "node added");
                self.nodes.push(Some(node));
                self.incident.push(Vec::new());
                index
            }
        }
    }

    /// Insert an edge, resolving its endpoints to canonical nodes.
    ///
    /// Synonym edges are never stored. Instead they merge their endpoints,
    /// attach a new identifier to a known node, or do nothing when both
    /// sides already resolve to the same node.
    pub fn add_edge(&mut self, edge: KEdge) -> GraphResult<Insertion> {
        if edge.is_synonym {
            return self.add_synonym(edge);
        }

        let source = self.add_node(edge.source);
        let target = self.add_node(edge.target);

        if let Some(existing) = self.find_parallel(source, target, &edge.relationship, edge.is_support) {
            return Ok(Insertion::Existing(existing));
        }

        let index = EdgeIndex(self.edges.len());
        self.edges.push(Some(GraphEdge {
            id: edge.id,
            source,
            target,
            relationship: edge.relationship,
            is_support: edge.is_support,
            reversed: edge.reversed,
        }));
        self.link(index, source, target);
        Ok(Insertion::Added(index))
    }

    fn add_synonym(&mut self, edge: KEdge) -> GraphResult<Insertion> {
        let source = self.resolve_node(&edge.source);
        let target = self.resolve_node(&edge.target);

        match (source, target) {
            (None, None) => Err(GraphError::SynonymOfUnknownPair(
                edge.source.identifier,
                edge.target.identifier,
            )),
            (Some(s), Some(t)) if s == t => {
                self.fold_into(s, &edge.source);
                self.fold_into(s, &edge.target);
                Ok(Insertion::Unchanged(s))
            }
            (Some(s), Some(t)) => {
                self.merge(s, t);
                Ok(Insertion::Merged(s))
            }
            (Some(known), None) => {
                self.fold_into(known, &edge.target);
                Ok(Insertion::Attached(known))
            }
            (None, Some(known)) => {
                self.fold_into(known, &edge.source);
                Ok(Insertion::Attached(known))
            }
        }
    }

    /// Merge `absorbed` into `survivor`.
    ///
    /// Incident edges are collected first, then re-pointed, so the edge set
    /// is never mutated while being walked. Edge direction and properties
    /// are kept; an edge that becomes an exact duplicate of one the
    /// survivor already has is dropped.
    pub fn merge(&mut self, survivor: NodeIndex, absorbed: NodeIndex) {
        if survivor == absorbed {
            return;
        }
        let Some(absorbed_node) = self.nodes.get_mut(absorbed.0).and_then(Option::take) else {
            return;
        };
        debug!(
            survivor = %self.node(survivor).map(|n| n.identifier.as_str()).unwrap_or("?"),
            absorbed = %absorbed_node.identifier,
            "merging synonymous nodes"
        );

        let moved: Vec<EdgeIndex> = std::mem::take(&mut self.incident[absorbed.0]);
        for edge_index in moved {
            let Some(mut edge) = self.edges[edge_index.0].take() else {
                continue;
            };
            if edge.source == absorbed {
                edge.source = survivor;
            }
            if edge.target == absorbed {
                edge.target = survivor;
            }
            if self.find_exact(&edge).is_some() {
                trace!(edge = %edge.id, "dropping duplicate edge after merge");
                for end in [edge.source, edge.target] {
                    self.incident[end.0].retain(|e| *e != edge_index);
                }
                continue;
            }
            self.edges[edge_index.0] = Some(edge);
            if !self.incident[survivor.0].contains(&edge_index) {
                self.incident[survivor.0].push(edge_index);
            }
        }

        for slot in self.by_identifier.values_mut() {
            if *slot == absorbed {
                *slot = survivor;
            }
        }
        self.fold_into(survivor, &absorbed_node);
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, index: NodeIndex) -> Option<KNode> {
        let node = self.nodes.get_mut(index.0).and_then(Option::take)?;
        let touching: Vec<EdgeIndex> = std::mem::take(&mut self.incident[index.0]);
        for edge_index in touching {
            if let Some(edge) = self.edges[edge_index.0].take() {
                if let Some(other) = edge.other(index).filter(|o| *o != index) {
                    self.incident[other.0].retain(|e| *e != edge_index);
                }
            }
        }
        self.by_identifier.retain(|_, slot| *slot != index);
        Some(node)
    }

    /// Merge the description `other` into the node at `index` and register
    /// any identifiers it brings.
    pub(super) fn fold_into(&mut self, index: NodeIndex, other: &KNode) {
        let new_ids: Vec<String> = other
            .all_identifiers()
            .filter(|id| !self.by_identifier.contains_key(*id))
            .map(str::to_string)
            .collect();
        if let Some(node) = self.node_mut(index) {
            node.absorb(other);
        }
        for id in new_ids {
            self.by_identifier.insert(id, index);
        }
    }

    fn link(&mut self, edge: EdgeIndex, source: NodeIndex, target: NodeIndex) {
        self.incident[source.0].push(edge);
        if target != source {
            self.incident[target.0].push(edge);
        }
    }

    fn find_parallel(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        relationship: &Relationship,
        is_support: bool,
    ) -> Option<EdgeIndex> {
        self.incident_edges(source).iter().copied().find(|e| {
            self.edge(*e).is_some_and(|e| {
                e.source == source
                    && e.target == target
                    && e.is_support == is_support
                    && e.relationship.provenance == relationship.provenance
                    && e.relationship.function == relationship.function
            })
        })
    }

    fn find_exact(&self, edge: &GraphEdge) -> Option<EdgeIndex> {
        self.incident_edges(edge.source).iter().copied().find(|e| {
            self.edge(*e).is_some_and(|e| {
                e.source == edge.source
                    && e.target == edge.target
                    && e.is_support == edge.is_support
                    && e.relationship == edge.relationship
            })
        })
    }
}
