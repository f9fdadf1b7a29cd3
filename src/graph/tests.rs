//! Assembly scenarios: synonym merge, pruning and support discovery

use super::*;
use crate::adapter::{AdapterError, CallPolicy, SupportAdapter};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn node(id: &str, t: ConceptType) -> KNode {
    KNode::new(id, t)
}

fn edge(a: &str, at: ConceptType, b: &str, bt: ConceptType, function: &str) -> KEdge {
    KEdge::new(node(a, at), node(b, bt), Relationship::new("test", function))
}

fn synonym(a: &str, b: &str, t: ConceptType) -> KEdge {
    KEdge::synonym(node(a, t), node(b, t), Relationship::new("test", "same_as"))
}

fn types(ts: &[ConceptType]) -> HashSet<ConceptType> {
    ts.iter().copied().collect()
}

/// Edges described by the full identifier sets of their endpoints.
fn canonical_edges(graph: &KnowledgeGraph) -> BTreeSet<(BTreeSet<String>, BTreeSet<String>, String)> {
    let ids = |i: NodeIndex| -> BTreeSet<String> {
        graph
            .node(i)
            .map(|n| n.all_identifiers().map(str::to_string).collect())
            .unwrap_or_default()
    };
    graph
        .edges()
        .map(|(_, e)| (ids(e.source), ids(e.target), e.relationship.function.clone()))
        .collect()
}

// === Synonym merge ===

#[test]
fn merge_repoints_edges_to_survivor() {
    let mut graph = KnowledgeGraph::new();
    graph.add_node(node("A", ConceptType::Gene));
    graph
        .add_edge(edge("B", ConceptType::Gene, "C", ConceptType::Process, "gene_get_process"))
        .unwrap();

    let outcome = graph.add_edge(synonym("A", "B", ConceptType::Gene)).unwrap();

    let a = graph.resolve("A").unwrap();
    assert_eq!(outcome, Insertion::Merged(a));
    assert_eq!(graph.resolve("B"), Some(a));
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    let (_, only) = graph.edges().next().unwrap();
    assert_eq!(only.source, a);
    assert_eq!(graph.node(only.target).unwrap().identifier, "C");
    assert!(graph.node(a).unwrap().synonyms.contains("B"));
}

#[test]
fn synonym_of_two_unknowns_is_an_error() {
    let mut graph = KnowledgeGraph::new();
    let err = graph.add_edge(synonym("X", "Y", ConceptType::Gene)).unwrap_err();
    assert!(matches!(err, GraphError::SynonymOfUnknownPair(a, b) if a == "X" && b == "Y"));
    assert!(graph.is_empty());
}

#[test]
fn synonym_attaches_new_identifier() {
    let mut graph = KnowledgeGraph::new();
    let a = graph.add_node(node("DOID:1", ConceptType::Disease));

    let outcome = graph.add_edge(synonym("DOID:1", "MESH:D1", ConceptType::Disease)).unwrap();
    assert_eq!(outcome, Insertion::Attached(a));
    assert_eq!(graph.resolve("MESH:D1"), Some(a));

    // Later edges from the attached identifier land on the same node
    graph
        .add_edge(edge("MESH:D1", ConceptType::Disease, "HGNC:1", ConceptType::Gene, "mesh_get_gene"))
        .unwrap();
    let (_, e) = graph.edges().next().unwrap();
    assert_eq!(e.source, a);
    assert_eq!(graph.node_count(), 2);
}

#[test]
fn merge_is_commutative_modulo_canonical_id() {
    let build = |forward: bool| {
        let mut graph = KnowledgeGraph::new();
        graph
            .add_edge(edge("A", ConceptType::Gene, "C", ConceptType::Process, "f"))
            .unwrap();
        graph
            .add_edge(edge("D", ConceptType::Cell, "B", ConceptType::Gene, "g"))
            .unwrap();
        let syn = if forward {
            synonym("A", "B", ConceptType::Gene)
        } else {
            synonym("B", "A", ConceptType::Gene)
        };
        graph.add_edge(syn).unwrap();
        graph
    };
    let ab = build(true);
    let ba = build(false);

    assert_eq!(ab.node_count(), 3);
    assert_eq!(ba.node_count(), 3);
    assert_eq!(ab.resolve("A"), ab.resolve("B"));
    assert_eq!(ba.resolve("A"), ba.resolve("B"));
    assert_eq!(canonical_edges(&ab), canonical_edges(&ba));
}

#[test]
fn merge_is_idempotent() {
    let mut graph = KnowledgeGraph::new();
    graph
        .add_edge(edge("A", ConceptType::Gene, "C", ConceptType::Process, "f"))
        .unwrap();
    graph
        .add_edge(edge("B", ConceptType::Gene, "D", ConceptType::Process, "f"))
        .unwrap();
    graph.add_edge(synonym("A", "B", ConceptType::Gene)).unwrap();
    let nodes = graph.node_count();
    let edges = canonical_edges(&graph);

    let again = graph.add_edge(synonym("A", "B", ConceptType::Gene)).unwrap();
    assert!(matches!(again, Insertion::Unchanged(_)));
    let reversed = graph.add_edge(synonym("B", "A", ConceptType::Gene)).unwrap();
    assert!(matches!(reversed, Insertion::Unchanged(_)));

    assert_eq!(graph.node_count(), nodes);
    assert_eq!(canonical_edges(&graph), edges);
}

#[test]
fn merge_drops_exact_duplicates_only() {
    let mut graph = KnowledgeGraph::new();
    graph
        .add_edge(edge("A", ConceptType::Gene, "C", ConceptType::Process, "f"))
        .unwrap();
    graph
        .add_edge(edge("B", ConceptType::Gene, "C", ConceptType::Process, "f"))
        .unwrap();
    graph
        .add_edge(edge("B", ConceptType::Gene, "C", ConceptType::Process, "h"))
        .unwrap();
    graph.add_edge(synonym("A", "B", ConceptType::Gene)).unwrap();

    assert_eq!(graph.edge_count(), 2);
    let c = graph.resolve("C").unwrap();
    assert_eq!(graph.incident_edges(c).len(), 2);
}

#[test]
fn identical_edges_are_stored_once() {
    let mut graph = KnowledgeGraph::new();
    let first = graph
        .add_edge(edge("A", ConceptType::Gene, "C", ConceptType::Process, "f"))
        .unwrap();
    let second = graph
        .add_edge(edge("A", ConceptType::Gene, "C", ConceptType::Process, "f"))
        .unwrap();
    let Insertion::Added(index) = first else {
        panic!("first insert should add");
    };
    assert_eq!(second, Insertion::Existing(index));
    assert_eq!(graph.edge_count(), 1);
}

// === Pruning ===

fn chain() -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    for (a, at, b, bt) in [
        ("CHEMBL:1", ConceptType::Drug, "HGNC:1", ConceptType::Gene),
        ("HGNC:1", ConceptType::Gene, "GO:1", ConceptType::Process),
        ("GO:1", ConceptType::Process, "CL:1", ConceptType::Cell),
        ("CL:1", ConceptType::Cell, "UBERON:1", ConceptType::Anatomy),
        // dead end hanging off the gene
        ("HGNC:1", ConceptType::Gene, "GO:2", ConceptType::Process),
    ] {
        graph.add_edge(edge(a, at, b, bt, "op")).unwrap();
    }
    graph
}

fn protected() -> HashSet<ConceptType> {
    types(&[
        ConceptType::Drug,
        ConceptType::Anatomy,
        ConceptType::DiseaseName,
        ConceptType::DrugName,
    ])
}

#[test]
fn prune_keeps_chain_and_drops_dead_end() {
    let mut graph = chain();
    let removed = graph.prune(&protected());

    assert_eq!(removed, 1);
    assert!(graph.get("GO:1").is_some());
    assert!(graph.get("GO:2").is_none());
    assert!(graph.resolve("GO:2").is_none());
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 4);
}

#[test]
fn prune_reaches_fixpoint() {
    let mut graph = chain();
    // two-node dead end off the gene
    graph
        .add_edge(edge("HGNC:1", ConceptType::Gene, "GO:3", ConceptType::Process, "op"))
        .unwrap();
    graph
        .add_edge(edge("GO:3", ConceptType::Process, "CL:3", ConceptType::Cell, "op"))
        .unwrap();

    let removed = graph.prune(&protected());
    assert_eq!(removed, 3);
    assert!(graph.get("GO:3").is_none());
    assert!(graph.get("CL:3").is_none());
    assert_eq!(graph.prune(&protected()), 0);
}

#[test]
fn prune_never_removes_protected_nodes() {
    let mut graph = KnowledgeGraph::new();
    graph.add_node(node("DiseaseName:ebola", ConceptType::DiseaseName));
    graph.add_node(node("CHEMBL:9", ConceptType::Drug));
    graph
        .add_edge(edge("CHEMBL:9", ConceptType::Drug, "HGNC:9", ConceptType::Gene, "op"))
        .unwrap();

    graph.prune(&protected());
    assert!(graph.get("DiseaseName:ebola").is_some());
    assert!(graph.get("CHEMBL:9").is_some());
    assert!(graph.get("HGNC:9").is_none());
}

#[test]
fn prune_skipped_for_unspecified_terminal() {
    let mut graph = chain();
    let mut protected = protected();
    protected.insert(ConceptType::Unspecified);
    assert_eq!(graph.prune(&protected), 0);
    assert_eq!(graph.node_count(), 6);
}

#[test]
fn self_loop_does_not_keep_a_dead_end_alive() {
    let mut graph = KnowledgeGraph::new();
    graph
        .add_edge(edge("CHEMBL:1", ConceptType::Drug, "HGNC:1", ConceptType::Gene, "op"))
        .unwrap();
    graph
        .add_edge(edge("HGNC:1", ConceptType::Gene, "ENSEMBL:1", ConceptType::Gene, "op"))
        .unwrap();
    graph.add_edge(synonym("HGNC:1", "ENSEMBL:1", ConceptType::Gene)).unwrap();

    let gene = graph.resolve("HGNC:1").unwrap();
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.neighbor_types(gene), types(&[ConceptType::Drug]));

    assert_eq!(graph.prune(&protected()), 1);
    assert!(graph.get("ENSEMBL:1").is_none());
    assert!(graph.get("CHEMBL:1").is_some());
}

// === Paths and support ===

#[test]
fn shortest_paths_ignore_direction() {
    let mut graph = KnowledgeGraph::new();
    graph
        .add_edge(edge("D", ConceptType::Disease, "G1", ConceptType::Gene, "op"))
        .unwrap();
    graph
        .add_edge(edge("D", ConceptType::Disease, "G2", ConceptType::Gene, "op"))
        .unwrap();
    // end side expanded inward
    graph
        .add_edge(edge("C", ConceptType::GeneticCondition, "G1", ConceptType::Gene, "op").reversed(true))
        .unwrap();
    graph
        .add_edge(edge("C", ConceptType::GeneticCondition, "G2", ConceptType::Gene, "op").reversed(true))
        .unwrap();

    let d = graph.resolve("D").unwrap();
    let c = graph.resolve("C").unwrap();
    let paths = graph.all_shortest_paths(d, c);
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|p| p.len() == 3 && p[0] == d && p[2] == c));
}

struct AlwaysSupport {
    calls: AtomicUsize,
}

#[async_trait]
impl SupportAdapter for AlwaysSupport {
    fn id(&self) -> &str {
        "always"
    }

    async fn term_to_term(&self, _a: &KNode, _b: &KNode) -> Result<Option<Relationship>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Relationship::new("always", "term_to_term")))
    }
}

fn disease_gene_condition() -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    graph
        .add_edge(edge("DOID:1", ConceptType::Disease, "HGNC:1", ConceptType::Gene, "op"))
        .unwrap();
    graph
        .add_edge(edge("HGNC:1", ConceptType::Gene, "OMIM:1", ConceptType::GeneticCondition, "op"))
        .unwrap();
    graph
}

#[tokio::test]
async fn support_asks_each_pair_once() {
    let mut graph = disease_gene_condition();
    let adapter = Arc::new(AlwaysSupport { calls: AtomicUsize::new(0) });
    let adapters: Vec<Arc<dyn SupportAdapter>> = vec![adapter.clone()];
    let starts = types(&[ConceptType::Disease]);
    let ends = types(&[ConceptType::GeneticCondition]);
    let policy = CallPolicy::default();
    let mut ledger = SupportLedger::new();

    let added = graph
        .discover_support(&adapters, &starts, &ends, &policy, &mut ledger)
        .await
        .unwrap();
    assert_eq!(added, 3);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    assert_eq!(graph.edges().filter(|(_, e)| e.role() == EdgeRole::Support).count(), 3);

    let again = graph
        .discover_support(&adapters, &starts, &ends, &policy, &mut ledger)
        .await
        .unwrap();
    assert_eq!(again, 0);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    assert_eq!(graph.edge_count(), 5);
}

#[tokio::test]
async fn support_requires_cross_path_connectivity() {
    let mut graph = KnowledgeGraph::new();
    graph.add_node(node("DOID:1", ConceptType::Disease));
    graph.add_node(node("OMIM:1", ConceptType::GeneticCondition));

    let err = graph
        .discover_support(
            &[],
            &types(&[ConceptType::Disease]),
            &types(&[ConceptType::GeneticCondition]),
            &CallPolicy::default(),
            &mut SupportLedger::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NoCrossPathConnectivity));
}

#[test]
fn candidate_pairs_are_unordered_and_distinct() {
    let graph = disease_gene_condition();
    let pairs = graph.support_candidates(
        &types(&[ConceptType::Disease]),
        &types(&[ConceptType::GeneticCondition]),
    );
    assert_eq!(pairs.len(), 3);
    let unordered: HashSet<(NodeIndex, NodeIndex)> =
        pairs.iter().map(|(a, b)| if a <= b { (*a, *b) } else { (*b, *a) }).collect();
    assert_eq!(unordered.len(), 3);
}

/// Records what `prepare` saw and whether any check ran before it.
#[derive(Default)]
struct RecordingSupport {
    prepared: Mutex<Vec<Vec<String>>>,
    checked_before_prepare: AtomicUsize,
    checks: AtomicUsize,
}

#[async_trait]
impl SupportAdapter for RecordingSupport {
    fn id(&self) -> &str {
        "recording"
    }

    async fn prepare(&self, nodes: &[KNode]) -> Result<(), AdapterError> {
        let mut ids: Vec<String> = nodes.iter().map(|n| n.identifier.clone()).collect();
        ids.sort();
        self.prepared.lock().unwrap().push(ids);
        Ok(())
    }

    async fn term_to_term(&self, _a: &KNode, _b: &KNode) -> Result<Option<Relationship>, AdapterError> {
        if self.prepared.lock().unwrap().is_empty() {
            self.checked_before_prepare.fetch_add(1, Ordering::SeqCst);
        }
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn support_prepares_each_adapter_once_with_every_node() {
    let mut graph = disease_gene_condition();
    // a node off every shortest path still reaches prepare
    graph.add_node(node("CL:1", ConceptType::Cell));
    let adapter = Arc::new(RecordingSupport::default());
    let adapters: Vec<Arc<dyn SupportAdapter>> = vec![adapter.clone()];

    let added = graph
        .discover_support(
            &adapters,
            &types(&[ConceptType::Disease]),
            &types(&[ConceptType::GeneticCondition]),
            &CallPolicy::default(),
            &mut SupportLedger::new(),
        )
        .await
        .unwrap();

    assert_eq!(added, 0);
    let prepared = adapter.prepared.lock().unwrap().clone();
    assert_eq!(prepared, vec![vec!["CL:1", "DOID:1", "HGNC:1", "OMIM:1"]]);
    assert_eq!(adapter.checks.load(Ordering::SeqCst), 3);
    assert_eq!(adapter.checked_before_prepare.load(Ordering::SeqCst), 0);
}

struct BrokenSupport;

#[async_trait]
impl SupportAdapter for BrokenSupport {
    fn id(&self) -> &str {
        "broken"
    }

    async fn prepare(&self, _nodes: &[KNode]) -> Result<(), AdapterError> {
        Err(AdapterError::failed("prepare", "index unavailable"))
    }

    async fn term_to_term(&self, _a: &KNode, _b: &KNode) -> Result<Option<Relationship>, AdapterError> {
        Err(AdapterError::failed("term_to_term", "service unavailable"))
    }
}

struct SleepySupport;

#[async_trait]
impl SupportAdapter for SleepySupport {
    fn id(&self) -> &str {
        "sleepy"
    }

    async fn term_to_term(&self, _a: &KNode, _b: &KNode) -> Result<Option<Relationship>, AdapterError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Some(Relationship::new("sleepy", "term_to_term")))
    }
}

#[tokio::test]
async fn failing_and_slow_support_adapters_are_skipped() {
    let mut graph = disease_gene_condition();
    let always = Arc::new(AlwaysSupport { calls: AtomicUsize::new(0) });
    let adapters: Vec<Arc<dyn SupportAdapter>> = vec![Arc::new(BrokenSupport), Arc::new(SleepySupport), always.clone()];
    let policy = CallPolicy::new(8, Duration::from_millis(20));

    let added = graph
        .discover_support(
            &adapters,
            &types(&[ConceptType::Disease]),
            &types(&[ConceptType::GeneticCondition]),
            &policy,
            &mut SupportLedger::new(),
        )
        .await
        .unwrap();

    assert_eq!(added, 3);
    assert_eq!(always.calls.load(Ordering::SeqCst), 3);
    let provenances: HashSet<String> = graph
        .edges()
        .filter(|(_, e)| e.role() == EdgeRole::Support)
        .map(|(_, e)| e.relationship.provenance.clone())
        .collect();
    assert_eq!(provenances, ["always".to_string()].into_iter().collect());
}
