//! Dead-end pruning

use super::concept::ConceptType;
use super::knowledge::KnowledgeGraph;
use super::node::NodeIndex;
use std::collections::HashSet;
use tracing::{debug, info};

impl KnowledgeGraph {
    /// Repeatedly remove nodes that cannot lie on a path between two
    /// different kinds of entity.
    ///
    /// A node is removed when its type is not protected and its neighbours
    /// (in either direction) span fewer than two concept types. Removal can
    /// expose new dead ends, so passes continue until one removes nothing.
    /// When `Unspecified` is protected every node is protected and nothing
    /// is removed. Returns the number of nodes removed.
    pub fn prune(&mut self, protected: &HashSet<ConceptType>) -> usize {
        if protected.contains(&ConceptType::Unspecified) {
            info!("terminal type is unspecified, skipping pruning");
            return 0;
        }

        let mut removed = 0;
        let mut pass = 0;
        loop {
            pass += 1;
            let candidates: Vec<NodeIndex> = self
                .nodes()
                .filter(|(_, node)| !protected.iter().any(|p| p.matches(&node.node_type)))
                .map(|(index, _)| index)
                .filter(|index| self.neighbor_types(*index).len() < 2)
                .collect();
            if candidates.is_empty() {
                break;
            }
            debug!(pass, count = candidates.len(), "pruning dead ends");
            for index in candidates {
                if self.remove_node(index).is_some() {
                    removed += 1;
                }
            }
        }
        info!(removed, remaining = self.node_count(), "pruned graph");
        removed
    }
}
