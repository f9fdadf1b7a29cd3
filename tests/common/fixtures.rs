//! YAML fixtures shared by the integration tests

use kgbuild::{AdapterFixture, BuilderConfig, GraphBuilder};
use std::sync::Arc;

/// Disease -> Gene -> GeneticCondition with one answer per hop.
pub const DISEASE_GENE_CONDITION: &str = r#"
type_graph:
  - { id: disease_get_gene, from: Disease, to: Gene }
  - { id: gene_get_condition, from: Gene, to: GeneticCondition }
sources:
  pharos:
    operations:
      disease_get_gene:
        "DOID:123": [{ target: G1, type: Gene }]
  biolink:
    operations:
      gene_get_condition:
        G1: [{ target: C1, type: GeneticCondition, properties: { name: "condition one" } }]
"#;

/// A DOID start must cross to MESH before any gene lookup.
pub const SYNONYM_ROUTING: &str = r#"
type_graph:
  - { id: doid_to_mesh, from: Disease, to: Disease, synonym: true, prefixes: [DOID] }
  - { id: mesh_get_gene, from: Disease, to: Gene, prefixes: [MESH] }
sources:
  ctd:
    operations:
      doid_to_mesh:
        "DOID:1": [{ target: "MESH:D1", type: Disease }]
      mesh_get_gene:
        "MESH:D1": [{ target: "HGNC:1", type: Gene, label: BRCA1 }]
"#;

/// Both ends anchored; the gene is reached from each side.
pub const TWO_SIDED: &str = r#"
type_graph:
  - { id: disease_get_gene, from: Disease, to: Gene }
  - { id: condition_get_gene, from: GeneticCondition, to: Gene }
sources:
  pharos:
    operations:
      disease_get_gene:
        "DOID:1": [{ target: "HGNC:1", type: Gene }]
      condition_get_gene:
        "OMIM:1": [{ target: "HGNC:1", type: Gene }, { target: "HGNC:2", type: Gene }]
support:
  cooccurrence:
    - { a: "DOID:1", b: "OMIM:1", properties: { score: 7 } }
"#;

pub fn fixture(yaml: &str) -> AdapterFixture {
    AdapterFixture::from_yaml(yaml).expect("fixture parses")
}

/// Builder over a fixture with default configuration.
pub fn builder_for(yaml: &str) -> GraphBuilder {
    let fixture = fixture(yaml);
    let type_graph = fixture.type_graph().expect("type graph loads");
    let registry = fixture.registry(true).expect("registry builds");
    GraphBuilder::new(Arc::new(type_graph), Arc::new(registry), BuilderConfig::default())
}
