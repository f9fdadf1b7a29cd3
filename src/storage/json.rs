//! Node-link JSON export and a plain-text tree view

use super::traits::{GraphSink, StorageResult};
use crate::graph::{ConceptType, EdgeIndex, EdgeRole, KnowledgeGraph, NodeIndex, Properties};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: ConceptType,
    pub name: Option<String>,
    pub synonyms: BTreeSet<String>,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub role: EdgeRole,
    pub provenance: String,
    pub function: String,
    pub reversed: bool,
    pub properties: Properties,
}

/// A whole graph in node-link form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub label: String,
    pub exported_at: DateTime<Utc>,
    pub nodes: Vec<ExportNode>,
    pub links: Vec<ExportLink>,
}

impl ExportDocument {
    pub fn from_graph(graph: &KnowledgeGraph, label: &str) -> Self {
        let mut nodes: Vec<ExportNode> = graph
            .nodes()
            .map(|(_, n)| ExportNode {
                id: n.identifier.clone(),
                node_type: n.node_type,
                name: n.label.clone(),
                synonyms: n.synonyms.clone(),
                properties: n.properties.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut links: Vec<ExportLink> = graph
            .edges()
            .filter_map(|(_, e)| {
                let source = graph.node(e.source)?;
                let target = graph.node(e.target)?;
                Some(ExportLink {
                    id: e.id.to_string(),
                    source: source.identifier.clone(),
                    target: target.identifier.clone(),
                    role: e.role(),
                    provenance: e.relationship.provenance.clone(),
                    function: e.relationship.function.clone(),
                    reversed: e.reversed,
                    properties: e.relationship.properties.clone(),
                })
            })
            .collect();
        links.sort_by(|a, b| (&a.source, &a.target, &a.function).cmp(&(&b.source, &b.target, &b.function)));

        Self {
            label: label.to_string(),
            exported_at: Utc::now(),
            nodes,
            links,
        }
    }
}

/// Writes each graph to a JSON file.
pub struct JsonExport {
    path: PathBuf,
}

impl JsonExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl GraphSink for JsonExport {
    fn name(&self) -> &str {
        "json"
    }

    async fn write(&self, graph: &KnowledgeGraph, label: &str) -> StorageResult<()> {
        let document = ExportDocument::from_graph(graph, label);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&document)?).await?;
        info!(path = %self.path.display(), "graph written to json");
        Ok(())
    }
}

/// Indented tree of the graph, one tree per root.
///
/// Each node is expanded once. Further edges reaching an already printed
/// node are listed and marked `(seen)`; the edge just walked is not.
pub fn render_tree(graph: &KnowledgeGraph, roots: &[NodeIndex]) -> String {
    let mut out = String::new();
    let mut printed = HashSet::new();
    for &root in roots {
        if printed.contains(&root) {
            continue;
        }
        let Some(node) = graph.node(root) else {
            continue;
        };
        let _ = writeln!(out, "{} [{}]", node.shortname(), node.node_type);
        render_from(graph, root, None, 1, &mut printed, &mut out);
    }
    out
}

fn render_from(
    graph: &KnowledgeGraph,
    index: NodeIndex,
    via: Option<EdgeIndex>,
    depth: usize,
    printed: &mut HashSet<NodeIndex>,
    out: &mut String,
) {
    printed.insert(index);

    let mut children: Vec<(String, NodeIndex, EdgeIndex)> = graph
        .incident_edges(index)
        .iter()
        .filter(|e| Some(**e) != via)
        .filter_map(|e| Some((*e, graph.edge(*e)?)))
        .filter_map(|(ei, e)| {
            let other = e.other(index)?;
            let tag = match e.role() {
                EdgeRole::Support => format!("{} support", e.relationship.provenance),
                _ => e.relationship.function.clone(),
            };
            let link = if e.source == index {
                format!("-[{}]->", tag)
            } else {
                format!("<-[{}]-", tag)
            };
            Some((link, other, ei))
        })
        .collect();
    children.sort();

    let indent = "  ".repeat(depth);
    for (link, child, edge) in children {
        let Some(target) = graph.node(child) else {
            continue;
        };
        if printed.contains(&child) {
            let _ = writeln!(out, "{}{} {} (seen)", indent, link, target.shortname());
            continue;
        }
        let _ = writeln!(out, "{}{} {} [{}]", indent, link, target.shortname(), target.node_type);
        render_from(graph, child, Some(edge), depth + 1, printed, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{KEdge, KNode, Relationship};

    fn chain() -> (KnowledgeGraph, NodeIndex) {
        let mut graph = KnowledgeGraph::new();
        let d = KNode::new("DOID:1", ConceptType::Disease).with_label("ebola");
        let g = KNode::new("HGNC:1", ConceptType::Gene);
        let c = KNode::new("OMIM:1", ConceptType::GeneticCondition);
        graph
            .add_edge(KEdge::new(d.clone(), g.clone(), Relationship::new("pharos", "disease_get_gene")))
            .unwrap();
        graph
            .add_edge(KEdge::new(g, c, Relationship::new("biolink", "gene_get_condition")))
            .unwrap();
        let root = graph.resolve("DOID:1").unwrap();
        (graph, root)
    }

    #[test]
    fn tree_descends_from_root() {
        let (graph, root) = chain();
        let tree = render_tree(&graph, &[root]);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ebola (DOID:1) [Disease]",
                "  -[disease_get_gene]-> HGNC:1 [Gene]",
                "    -[gene_get_condition]-> OMIM:1 [GeneticCondition]",
            ]
        );
    }

    #[test]
    fn document_lists_nodes_and_links_sorted() {
        let (graph, _) = chain();
        let doc = ExportDocument::from_graph(&graph, "q");
        let ids: Vec<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["DOID:1", "HGNC:1", "OMIM:1"]);
        assert_eq!(doc.links.len(), 2);
        assert_eq!(doc.links[0].role, EdgeRole::Result);
        assert_eq!(doc.links[0].source, "DOID:1");
    }

    #[tokio::test]
    async fn json_sink_writes_readable_document() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonExport::new(dir.path().join("out").join("graph.json"));
        let (graph, _) = chain();
        sink.write(&graph, "q").await.unwrap();

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let doc: ExportDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.label, "q");
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.links[1].function, "gene_get_condition");
    }
}
