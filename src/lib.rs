//! kgbuild: query-driven knowledge graph construction
//!
//! A path query over biomedical concept types ("Disease, then Gene, then
//! GeneticCondition") is compiled against a type graph into concrete plans:
//! sequences of adapter operations known to connect those types. Plans are
//! executed against external knowledge sources, and the results are
//! assembled into one provenance-tagged knowledge graph. Synonym edges merge
//! nodes, unreachable nodes are pruned, and support adapters add evidence
//! edges between nodes on start-to-end paths.
//!
//! # Core Concepts
//!
//! - **Concept types**: a closed vocabulary (`ConceptType`) of entity kinds
//! - **Plans**: operation sequences validated by a `TypeGraph`
//! - **Adapters**: `SourceAdapter`s expand nodes, `SupportAdapter`s find
//!   evidence between them, a `Synonymizer` adds alternate identifiers
//! - **Knowledge graph**: an identifier-resolving multigraph of `KNode`s
//!
//! # Example
//!
//! ```
//! use kgbuild::{ConceptType, KNode, UserQuery};
//!
//! let mut query = UserQuery::new(
//!     vec!["DOID:123".to_string()],
//!     ConceptType::Disease,
//!     Some(KNode::named(ConceptType::DiseaseName, "ebola")),
//! );
//! query.add_transition(ConceptType::Gene, 1, 1, None).unwrap();
//! assert_eq!(query.definition().transitions.len(), 1);
//! ```

pub mod adapter;
pub mod builder;
pub mod config;
pub mod graph;
pub mod program;
pub mod query;
pub mod storage;
pub mod typegraph;

pub use adapter::{
    AdapterError, AdapterFixture, AdapterRegistry, CallPolicy, SourceAdapter, SupportAdapter, Synonymizer,
};
pub use builder::{Build, BuildError, BuildReport, BuildResult, BuildStage, GraphBuilder};
pub use config::{BuilderConfig, ConfigError};
pub use graph::{ConceptType, GraphError, KEdge, KNode, KnowledgeGraph, Relationship};
pub use program::Program;
pub use query::{CompiledQuery, PathSpec, Plan, PlanStep, QueryError, UserQuery};
pub use storage::{GraphSink, JsonExport, SqliteSink, StorageError};
pub use typegraph::{InMemoryTypeGraph, TypeGraph, TypeGraphError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
