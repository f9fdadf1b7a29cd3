//! Support discovery: independent evidence between nodes on result paths

use super::concept::ConceptType;
use super::edge::KEdge;
use super::knowledge::{GraphError, GraphResult, Insertion, KnowledgeGraph};
use super::node::{KNode, NodeIndex};
use crate::adapter::{CallPolicy, SupportAdapter};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Tracks which (pair, adapter) combinations have already been asked.
#[derive(Debug, Clone, Default)]
pub struct SupportLedger {
    asked: HashSet<(String, String, String)>,
}

impl SupportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the question; false if it was asked before.
    fn ask(&mut self, a: &str, b: &str, adapter: &str) -> bool {
        let (x, y) = if a <= b { (a, b) } else { (b, a) };
        self.asked.insert((x.to_string(), y.to_string(), adapter.to_string()))
    }

    pub fn len(&self) -> usize {
        self.asked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asked.is_empty()
    }
}

impl KnowledgeGraph {
    /// Unordered node pairs that co-occur on some shortest path between a
    /// start terminal and an end terminal, in discovery order.
    pub fn support_candidates(
        &self,
        start_types: &HashSet<ConceptType>,
        end_types: &HashSet<ConceptType>,
    ) -> Vec<(NodeIndex, NodeIndex)> {
        let (starts, ends) = self.terminal_nodes(start_types, end_types);
        let mut seen: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        let mut pairs = Vec::new();

        for &start in &starts {
            for &end in &ends {
                if start == end {
                    continue;
                }
                let paths = self.all_shortest_paths(start, end);
                if paths.is_empty() {
                    let err = GraphError::NoPathBetweenTerminals(self.identifier_of(start), self.identifier_of(end));
                    debug!(error = %err, "skipping terminal pair");
                    continue;
                }
                for path in paths {
                    for i in 0..path.len() {
                        for j in i + 1..path.len() {
                            let key = if path[i] <= path[j] {
                                (path[i], path[j])
                            } else {
                                (path[j], path[i])
                            };
                            if seen.insert(key) {
                                pairs.push((path[i], path[j]));
                            }
                        }
                    }
                }
            }
        }
        pairs
    }

    /// Ask every support adapter about every candidate pair and add the
    /// evidence found as support edges. Returns the number of edges added.
    ///
    /// Fails only when no start terminal connects to any end terminal.
    pub async fn discover_support(
        &mut self,
        adapters: &[Arc<dyn SupportAdapter>],
        start_types: &HashSet<ConceptType>,
        end_types: &HashSet<ConceptType>,
        policy: &CallPolicy,
        ledger: &mut SupportLedger,
    ) -> GraphResult<usize> {
        let pairs = self.support_candidates(start_types, end_types);
        if pairs.is_empty() {
            return Err(GraphError::NoCrossPathConnectivity);
        }
        info!(pairs = pairs.len(), adapters = adapters.len(), "discovering support");

        let snapshot: Vec<KNode> = self.nodes().map(|(_, n)| n.clone()).collect();
        for adapter in adapters {
            if let Err(e) = adapter.prepare(&snapshot).await {
                warn!(adapter = adapter.id(), error = %e, "support prepare failed");
            }
        }

        let mut tasks = JoinSet::new();
        for (order, (a, b)) in pairs.iter().enumerate() {
            let (Some(a), Some(b)) = (self.node(*a).cloned(), self.node(*b).cloned()) else {
                continue;
            };
            for adapter in adapters {
                if !ledger.ask(&a.identifier, &b.identifier, adapter.id()) {
                    continue;
                }
                let adapter = adapter.clone();
                let policy = policy.clone();
                let (a, b) = (a.clone(), b.clone());
                tasks.spawn(async move {
                    let result = policy.call(adapter.id(), adapter.term_to_term(&a, &b)).await;
                    (order, adapter.id().to_string(), a, b, result)
                });
            }
        }

        let mut answers = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(answer) => answers.push(answer),
                Err(e) => error!(error = %e, "support task panicked"),
            }
        }
        answers.sort_by(|x, y| (x.0, &x.1).cmp(&(y.0, &y.1)));

        let mut added = 0;
        for (_, adapter, a, b, result) in answers {
            match result {
                Ok(Some(relationship)) => {
                    let mut edge = KEdge::new(a, b, relationship);
                    edge.is_support = true;
                    if let Insertion::Added(_) = self.add_edge(edge)? {
                        added += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(adapter = %adapter, error = %e, "support check failed"),
            }
        }
        info!(added, "support edges added");
        Ok(added)
    }

    fn identifier_of(&self, index: NodeIndex) -> String {
        self.node(index).map(|n| n.identifier.clone()).unwrap_or_default()
    }
}
