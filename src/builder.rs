//! Build pipeline: one query in, one assembled knowledge graph out
//!
//! A build walks through fixed stages. Compile failures and a graph with no
//! start-to-end connectivity abort the run; failures of single adapter
//! calls are logged by the executor and never reach this level.

use crate::adapter::AdapterRegistry;
use crate::config::{BuilderConfig, ConfigError};
use crate::graph::{ConceptType, GraphError, KEdge, KnowledgeGraph, NodeIndex, SupportLedger};
use crate::program::Program;
use crate::query::{Anchor, CompiledQuery, QueryError, UserQuery};
use crate::storage::{GraphSink, StorageError};
use crate::typegraph::TypeGraph;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Errors that abort a build
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for builds
pub type BuildResult<T> = Result<T, BuildError>;

/// Pipeline stages, in the order a build reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    Building,
    Compiled,
    Executed,
    Pruned,
    Enhanced,
    Supported,
    Exported,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Building => "building",
            Self::Compiled => "compiled",
            Self::Executed => "executed",
            Self::Pruned => "pruned",
            Self::Enhanced => "enhanced",
            Self::Supported => "supported",
            Self::Exported => "exported",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub stage: BuildStage,
    /// Distinct (plan, start) runs executed
    pub plans: usize,
    pub nodes: usize,
    pub edges: usize,
    pub pruned: usize,
    pub support_edges: usize,
}

impl Default for BuildReport {
    fn default() -> Self {
        Self {
            stage: BuildStage::Building,
            plans: 0,
            nodes: 0,
            edges: 0,
            pruned: 0,
            support_edges: 0,
        }
    }
}

/// A finished build.
#[derive(Debug)]
pub struct Build {
    pub graph: KnowledgeGraph,
    pub anchors: Vec<Anchor>,
    pub report: BuildReport,
}

impl Build {
    /// Graph nodes the start side of the query hangs from: each start
    /// anchor's lookup node when it has one, the anchor itself otherwise.
    pub fn roots(&self) -> Vec<NodeIndex> {
        let mut roots = Vec::new();
        for anchor in self.anchors.iter().filter(|a| !a.reversed) {
            let node = anchor.lookup.as_ref().unwrap_or(&anchor.node);
            if let Some(index) = self.graph.resolve_node(node) {
                if !roots.contains(&index) {
                    roots.push(index);
                }
            }
        }
        roots
    }
}

pub struct GraphBuilder {
    type_graph: Arc<dyn TypeGraph>,
    registry: Arc<AdapterRegistry>,
    config: BuilderConfig,
    sinks: Vec<Arc<dyn GraphSink>>,
}

impl GraphBuilder {
    pub fn new(type_graph: Arc<dyn TypeGraph>, registry: Arc<AdapterRegistry>, config: BuilderConfig) -> Self {
        Self {
            type_graph,
            registry,
            config,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn GraphSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Compile only.
    pub async fn compile(&self, query: &UserQuery) -> BuildResult<CompiledQuery> {
        Ok(query.compile(self.type_graph.as_ref()).await?)
    }

    /// Build the graph for `query` without exporting it.
    pub async fn build(&self, query: &UserQuery) -> BuildResult<Build> {
        let mut report = BuildReport::default();
        let result = self.assemble(query, &mut report).await;
        if let Err(e) = &result {
            error!(stage = %report.stage, error = %e, "build failed");
        }
        result
    }

    /// Build the graph for `query` and write it to every sink under `label`.
    pub async fn run(&self, query: &UserQuery, label: &str) -> BuildResult<Build> {
        let mut build = self.build(query).await?;
        for sink in &self.sinks {
            if let Err(e) = sink.write(&build.graph, label).await {
                error!(sink = sink.name(), label, error = %e, "export failed");
                return Err(e.into());
            }
        }
        build.report.stage = BuildStage::Exported;
        info!(label, sinks = self.sinks.len(), "build exported");
        Ok(build)
    }

    async fn assemble(&self, query: &UserQuery, report: &mut BuildReport) -> BuildResult<Build> {
        let compiled = self.compile(query).await?;
        report.stage = BuildStage::Compiled;

        let anchors = compiled.anchors();
        let mut graph = KnowledgeGraph::new();
        seed(&mut graph, &anchors)?;

        let programs = compiled.programs();
        report.plans = programs.len();
        info!(plans = programs.len(), anchors = anchors.len(), "query compiled");

        for edge in self.execute(&compiled).await {
            match graph.add_edge(edge) {
                Ok(_) => {}
                Err(GraphError::SynonymOfUnknownPair(a, b)) => {
                    warn!(source = %a, target = %b, "synonym edge between unknown nodes skipped");
                }
                Err(e) => return Err(e.into()),
            }
        }
        report.stage = BuildStage::Executed;
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "programs executed");

        let (start_types, end_types) = compiled.terminal_types();
        let protected = self.protected_types(&start_types, &end_types);
        report.pruned = graph.prune(&protected);
        report.stage = BuildStage::Pruned;

        graph.enhance();
        report.stage = BuildStage::Enhanced;

        let mut ledger = SupportLedger::new();
        report.support_edges = graph
            .discover_support(
                self.registry.support(),
                &start_types,
                &end_types,
                &self.config.call_policy(),
                &mut ledger,
            )
            .await?;
        report.stage = BuildStage::Supported;

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        info!(
            nodes = report.nodes,
            edges = report.edges,
            pruned = report.pruned,
            support = report.support_edges,
            "graph assembled"
        );

        Ok(Build {
            graph,
            anchors,
            report: report.clone(),
        })
    }

    /// Run every program concurrently; edges come back in program order.
    async fn execute(&self, compiled: &CompiledQuery) -> Vec<KEdge> {
        let policy = self.config.call_policy();
        let mut tasks = JoinSet::new();
        for (order, run) in compiled.programs().into_iter().enumerate() {
            let mut program = Program::from_run(&run, self.registry.clone(), policy.clone());
            tasks.spawn(async move {
                program.run(vec![run.start]).await;
                (order, program.into_results())
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "program task panicked"),
            }
        }
        results.sort_by_key(|(order, _)| *order);
        results.into_iter().flat_map(|(_, edges)| edges).collect()
    }

    fn protected_types(
        &self,
        start_types: &HashSet<ConceptType>,
        end_types: &HashSet<ConceptType>,
    ) -> HashSet<ConceptType> {
        start_types
            .iter()
            .chain(end_types)
            .chain(&self.config.protected_types)
            .copied()
            .collect()
    }
}

/// Add every anchor, linking lookup nodes to the anchors they name.
fn seed(graph: &mut KnowledgeGraph, anchors: &[Anchor]) -> BuildResult<()> {
    for anchor in anchors {
        graph.add_node(anchor.node.clone());
        if let Some(lookup) = &anchor.lookup {
            graph.add_edge(KEdge::lookup(lookup.clone(), anchor.node.clone()).reversed(anchor.reversed))?;
        }
    }
    Ok(())
}
