//! Type graph held in memory, evaluated by enumeration

use super::{TypeGraph, TypeGraphError};
use crate::graph::ConceptType;
use crate::query::{Plan, PlanStep, Transition, TraversalQuery, PLAN_LIMIT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// One adapter operation registered with the type graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub id: String,
    pub from: ConceptType,
    pub to: ConceptType,
    /// Answers assert identity (from and to must be the same type)
    #[serde(default)]
    pub synonym: bool,
    /// CURIE prefixes accepted when this is the very first operation of a
    /// plan; empty accepts any
    #[serde(default)]
    pub prefixes: Vec<String>,
}

impl OperationSpec {
    pub fn new(id: impl Into<String>, from: ConceptType, to: ConceptType) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            synonym: false,
            prefixes: Vec::new(),
        }
    }

    pub fn synonym(id: impl Into<String>, concept: ConceptType) -> Self {
        Self {
            synonym: true,
            ..Self::new(id, concept, concept)
        }
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    fn accepts_prefix(&self, prefix: Option<&str>) -> bool {
        match prefix {
            Some(p) if !self.prefixes.is_empty() => self.prefixes.iter().any(|q| q == p),
            _ => true,
        }
    }

    fn step(&self) -> PlanStep {
        PlanStep {
            from: self.from,
            to: self.to,
            operation: self.id.clone(),
            synonym: self.synonym,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTypeGraph {
    operations: Vec<OperationSpec>,
}

/// A partial walk through one segment.
struct Walk {
    ops: Vec<usize>,
    hops: u32,
}

impl InMemoryTypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(operations: Vec<OperationSpec>) -> Result<Self, TypeGraphError> {
        let mut graph = Self::new();
        for op in operations {
            graph.register(op)?;
        }
        Ok(graph)
    }

    /// Parse a YAML list of operations.
    pub fn from_yaml(yaml: &str) -> Result<Self, TypeGraphError> {
        let operations: Vec<OperationSpec> =
            serde_yaml::from_str(yaml).map_err(|e| TypeGraphError::Definition(e.to_string()))?;
        Self::from_operations(operations)
    }

    pub fn register(&mut self, op: OperationSpec) -> Result<(), TypeGraphError> {
        if self.operations.iter().any(|o| o.id == op.id) {
            return Err(TypeGraphError::Definition(format!("duplicate operation {}", op.id)));
        }
        if op.synonym && op.from != op.to {
            return Err(TypeGraphError::Definition(format!(
                "synonym operation {} connects {} to {}",
                op.id, op.from, op.to
            )));
        }
        self.operations.push(op);
        Ok(())
    }

    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }

    /// Every distinct plan satisfying `query` with the fewest non-synonym
    /// operations, ordered by length then synonym count, at most
    /// `PLAN_LIMIT`.
    pub fn plans(&self, query: &TraversalQuery) -> Vec<Plan> {
        let mut found: Vec<Vec<usize>> = Vec::new();
        self.extend(query, 0, query.segments.first().map(|s| s.in_type), Vec::new(), &mut found);

        let mut seen = HashSet::new();
        let mut plans: Vec<Plan> = found
            .into_iter()
            .filter(|ops| seen.insert(ops.clone()))
            .map(|ops| Plan::new(ops.iter().map(|i| self.operations[*i].step()).collect()))
            .filter(|plan| !plan.is_empty())
            .collect();
        if let Some(shortest) = plans.iter().map(Plan::hop_count).min() {
            plans.retain(|plan| plan.hop_count() == shortest);
        }
        plans.sort_by(|a, b| {
            (a.len(), a.synonym_count())
                .cmp(&(b.len(), b.synonym_count()))
                .then_with(|| a.to_string().cmp(&b.to_string()))
        });
        plans.truncate(PLAN_LIMIT);
        plans
    }

    /// Complete segment `index` from every walk, recursing into the next.
    fn extend(
        &self,
        query: &TraversalQuery,
        index: usize,
        current: Option<ConceptType>,
        prefix_ops: Vec<usize>,
        found: &mut Vec<Vec<usize>>,
    ) {
        let (Some(segment), Some(current)) = (query.segments.get(index), current) else {
            if index == query.segments.len() {
                found.push(prefix_ops);
            }
            return;
        };
        let start_prefix = if prefix_ops.is_empty() {
            query.start_prefix.as_deref()
        } else {
            None
        };

        let mut walks = Vec::new();
        self.walk(
            segment,
            current,
            start_prefix,
            Walk { ops: Vec::new(), hops: 0 },
            &mut walks,
        );
        for walk in walks {
            let next = walk
                .ops
                .last()
                .map(|i| self.operations[*i].to)
                .unwrap_or(current);
            let mut ops = prefix_ops.clone();
            ops.extend(walk.ops);
            self.extend(query, index + 1, Some(next), ops, found);
        }
    }

    fn walk(
        &self,
        segment: &Transition,
        current: ConceptType,
        start_prefix: Option<&str>,
        walk: Walk,
        out: &mut Vec<Walk>,
    ) {
        let max_len = segment.max_path_length() as usize;
        for (i, op) in self.operations.iter().enumerate() {
            if walk.ops.len() >= max_len || walk.ops.contains(&i) || !current.matches(&op.from) {
                continue;
            }
            if walk.ops.is_empty() && !op.accepts_prefix(start_prefix) {
                continue;
            }
            let hops = walk.hops + u32::from(!op.synonym);
            if hops > segment.max_hops {
                continue;
            }
            let mut ops = walk.ops.clone();
            ops.push(i);
            let next = Walk { ops, hops };
            if next.hops >= segment.min_hops && segment.out_type.matches(&op.to) {
                out.push(Walk {
                    ops: next.ops.clone(),
                    hops: next.hops,
                });
            }
            self.walk(segment, op.to, start_prefix, next, out);
        }
    }
}

#[async_trait]
impl TypeGraph for InMemoryTypeGraph {
    async fn get_transitions(&self, query: &TraversalQuery) -> Result<Vec<Plan>, TypeGraphError> {
        let plans = self.plans(query);
        debug!(
            start = query.start_prefix.as_deref().unwrap_or("*"),
            segments = query.segments.len(),
            plans = plans.len(),
            "evaluated traversal pattern"
        );
        Ok(plans)
    }
}
