//! Plan executor
//!
//! A `Program` walks one plan from its start nodes. Each wave expands every
//! pending (node, position) pair concurrently, bounded by the call policy.
//! Results are collected in worklist order so the produced edge list is
//! deterministic for a given set of adapters.

use crate::adapter::{AdapterError, AdapterRegistry, CallPolicy, Expansion};
use crate::graph::{KEdge, KNode};
use crate::query::{Plan, PlannedRun};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub struct Program {
    plan: Plan,
    reversed: bool,
    registry: Arc<AdapterRegistry>,
    policy: CallPolicy,
    /// Every instance node seen, by identifier
    seen_nodes: HashMap<String, KNode>,
    expanded: HashSet<(String, usize)>,
    worklist: Vec<(KNode, usize)>,
    results: Vec<KEdge>,
}

impl Program {
    pub fn new(plan: Plan, reversed: bool, registry: Arc<AdapterRegistry>, policy: CallPolicy) -> Self {
        Self {
            plan,
            reversed,
            registry,
            policy,
            seen_nodes: HashMap::new(),
            expanded: HashSet::new(),
            worklist: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn from_run(run: &PlannedRun, registry: Arc<AdapterRegistry>, policy: CallPolicy) -> Self {
        Self::new(run.plan.clone(), run.reversed, registry, policy)
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Synonymize `nodes` and queue them at `position`.
    async fn add_instance_nodes(&mut self, nodes: Vec<KNode>, position: usize) {
        for mut node in nodes {
            self.synonymize(&mut node).await;
            self.enqueue(node, position);
        }
    }

    async fn synonymize(&self, node: &mut KNode) {
        if let Err(e) = self.registry.synonymizer().synonymize(node).await {
            warn!(node = %node.identifier, error = %e, "synonymizer failed");
        }
    }

    fn enqueue(&mut self, node: KNode, position: usize) {
        if !self.expanded.insert((node.identifier.clone(), position)) {
            return;
        }
        self.seen_nodes
            .entry(node.identifier.clone())
            .and_modify(|known| known.absorb(&node))
            .or_insert_with(|| node.clone());
        self.worklist.push((node, position));
    }

    /// Expand from `start_nodes` until the worklist empties; returns the
    /// produced edges.
    pub async fn run(&mut self, start_nodes: Vec<KNode>) -> &[KEdge] {
        self.add_instance_nodes(start_nodes, 0).await;

        let mut wave = 0;
        while !self.worklist.is_empty() {
            wave += 1;
            let pending = std::mem::take(&mut self.worklist);
            debug!(plan = %self.plan, wave, pending = pending.len(), "expanding wave");
            let answers = self.expand_wave(pending).await;
            for (node, position, answer) in answers {
                self.accept(node, position, answer).await;
            }
        }
        info!(plan = %self.plan, edges = self.results.len(), nodes = self.seen_nodes.len(), "program finished");
        &self.results
    }

    /// Call every adapter in the wave concurrently, answers in wave order.
    async fn expand_wave(&self, pending: Vec<(KNode, usize)>) -> Vec<(KNode, usize, Result<Expansion, AdapterError>)> {
        let mut tasks = JoinSet::new();
        let mut answers: Vec<Option<(KNode, usize, Result<Expansion, AdapterError>)>> = Vec::new();

        for (order, (node, position)) in pending.into_iter().enumerate() {
            answers.push(None);
            // Position equal to the plan length is terminal
            let Some(step) = self.plan.step(position) else {
                continue;
            };
            let operation = step.operation.clone();
            let adapter = match self.registry.operation(&operation) {
                Ok(adapter) => adapter,
                Err(e) => {
                    error!(operation = %operation, node = %node.identifier, error = %e, "operation not registered");
                    continue;
                }
            };
            let policy = self.policy.clone();
            tasks.spawn(async move {
                let answer = policy.call(&operation, adapter.query(&operation, &node)).await;
                (order, node, position, answer)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((order, node, position, answer)) => answers[order] = Some((node, position, answer)),
                Err(e) => error!(error = %e, "expansion task panicked"),
            }
        }
        answers.into_iter().flatten().collect()
    }

    async fn accept(&mut self, node: KNode, position: usize, answer: Result<Expansion, AdapterError>) {
        let Some(step) = self.plan.step(position).cloned() else {
            return;
        };
        let expansion = match answer {
            Ok(expansion) => expansion,
            Err(e) => {
                error!(operation = %step.operation, node = %node.identifier, error = %e, "adapter call failed");
                return;
            }
        };

        let next = position + 1;
        for (mut relationship, mut target) in expansion {
            self.synonymize(&mut target).await;
            relationship.function = step.operation.clone();
            if relationship.provenance.is_empty() {
                relationship.provenance = step.operation.clone();
            }
            let edge = if step.synonym {
                KEdge::synonym(node.clone(), target.clone(), relationship)
            } else {
                KEdge::new(node.clone(), target.clone(), relationship)
            };
            self.results.push(edge.reversed(self.reversed));
            self.enqueue(target, next);
        }
    }

    /// Edges produced so far.
    pub fn get_results(&self) -> &[KEdge] {
        &self.results
    }

    pub fn into_results(self) -> Vec<KEdge> {
        self.results
    }

    pub fn seen_nodes(&self) -> impl Iterator<Item = &KNode> {
        self.seen_nodes.values()
    }
}
