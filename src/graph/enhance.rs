//! Label and synonym enrichment from properties already on each node

use super::knowledge::KnowledgeGraph;
use super::node::{KNode, NodeIndex};
use tracing::debug;

/// Properties whose string values are alternate identifiers.
const SYNONYM_PROPERTIES: [&str; 2] = ["equivalent_identifiers", "xrefs"];

fn derive_label(node: &KNode) -> Option<String> {
    if node.label.is_some() {
        return node.label.clone();
    }
    for key in ["label", "name"] {
        if let Some(text) = node.properties.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    if node.node_type.is_name_type() {
        let prefix = format!("{}:", node.node_type);
        return node.identifier.strip_prefix(&prefix).map(str::to_string);
    }
    None
}

fn derive_synonyms(node: &KNode) -> Vec<String> {
    SYNONYM_PROPERTIES
        .iter()
        .filter_map(|key| node.properties.get(*key))
        .flat_map(|v| v.strings())
        .map(str::to_string)
        .collect()
}

impl KnowledgeGraph {
    /// Give every node a readable label and fold identifier cross-references
    /// into its synonym set.
    ///
    /// A cross-reference naming another live node merges that node into the
    /// one carrying the reference, so each identifier keeps a single owner.
    pub fn enhance(&mut self) {
        let indices: Vec<NodeIndex> = self.nodes().map(|(i, _)| i).collect();
        for index in indices {
            loop {
                let Some(node) = self.node(index) else { break };
                let label = derive_label(node);
                let synonyms = derive_synonyms(node);
                let mut claimed: Vec<NodeIndex> = synonyms
                    .iter()
                    .filter_map(|id| self.resolve(id))
                    .filter(|other| *other != index)
                    .collect();
                claimed.sort();
                claimed.dedup();

                let mut update = node.clone();
                update.label = label;
                update.add_synonyms(synonyms);
                // also registers the new identifiers
                self.fold_into(index, &update);

                if claimed.is_empty() {
                    break;
                }
                for other in claimed {
                    debug!(survivor = %index, absorbed = %other, "cross-reference names another node");
                    self.merge(index, other);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConceptType, PropertyValue};

    #[test]
    fn label_preference_order() {
        let labelled = KNode::new("A:1", ConceptType::Gene).with_label("kept").with_property("label", "x");
        assert_eq!(derive_label(&labelled).as_deref(), Some("kept"));

        let by_label = KNode::new("A:1", ConceptType::Gene)
            .with_property("label", "from label")
            .with_property("name", "from name");
        assert_eq!(derive_label(&by_label).as_deref(), Some("from label"));

        let by_name = KNode::new("A:1", ConceptType::Gene).with_property("name", "from name");
        assert_eq!(derive_label(&by_name).as_deref(), Some("from name"));

        let name_type = KNode::new("DiseaseName:ebola", ConceptType::DiseaseName);
        assert_eq!(derive_label(&name_type).as_deref(), Some("ebola"));

        assert_eq!(derive_label(&KNode::new("A:1", ConceptType::Gene)), None);
    }

    #[test]
    fn enhance_adds_synonyms_and_maps_them() {
        let mut graph = KnowledgeGraph::new();
        let node = KNode::new("MONDO:1", ConceptType::Disease)
            .with_property(
                "equivalent_identifiers",
                PropertyValue::Array(vec!["DOID:1".into(), "MONDO:1".into()]),
            )
            .with_property("xrefs", "UMLS:C1")
            .with_property("name", "ebola");
        let index = graph.add_node(node);

        graph.enhance();

        let node = graph.node(index).unwrap();
        assert_eq!(node.label.as_deref(), Some("ebola"));
        assert!(node.synonyms.contains("DOID:1"));
        assert!(node.synonyms.contains("UMLS:C1"));
        assert!(!node.synonyms.contains("MONDO:1"));
        assert_eq!(graph.resolve("UMLS:C1"), Some(index));
    }

    #[test]
    fn cross_reference_to_another_node_merges_it() {
        let mut graph = KnowledgeGraph::new();
        graph
            .add_edge(crate::graph::KEdge::new(
                KNode::new("DOID:1", ConceptType::Disease),
                KNode::new("HGNC:1", ConceptType::Gene),
                crate::graph::Relationship::new("pharos", "disease_get_gene"),
            ))
            .unwrap();
        let mondo = graph.add_node(
            KNode::new("MONDO:1", ConceptType::Disease)
                .with_property("equivalent_identifiers", PropertyValue::Array(vec!["DOID:1".into()])),
        );

        graph.enhance();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.resolve("DOID:1"), Some(mondo));
        let owners: Vec<&str> = graph
            .nodes()
            .filter(|(_, n)| n.all_identifiers().any(|id| id == "DOID:1"))
            .map(|(_, n)| n.identifier.as_str())
            .collect();
        assert_eq!(owners, vec!["MONDO:1"]);

        let (_, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.source, mondo);
        assert_eq!(graph.edge_count(), 1);
    }
}
