//! Common test utilities for end-to-end builds
//!
//! Fixtures describe a type graph plus recorded adapter answers; stub
//! adapters cover behaviour a table cannot express.

pub mod fixtures;
pub mod stubs;

pub use fixtures::{builder_for, fixture, DISEASE_GENE_CONDITION, SYNONYM_ROUTING, TWO_SIDED};
pub use stubs::FlakyAdapter;

use kgbuild::{ConceptType, KNode, UserQuery};

/// `start` of `start_type`, then one single-hop transition per type.
pub fn chain_query(start: &str, start_type: ConceptType, lookup: Option<KNode>, types: &[ConceptType]) -> UserQuery {
    let mut query = UserQuery::new(vec![start.to_string()], start_type, lookup);
    for t in types {
        query.add_transition(*t, 1, 1, None).unwrap();
    }
    query
}

/// Identifiers of every node in the graph, sorted.
pub fn identifiers(graph: &kgbuild::KnowledgeGraph) -> Vec<String> {
    let mut ids: Vec<String> = graph.nodes().map(|(_, n)| n.identifier.clone()).collect();
    ids.sort();
    ids
}
