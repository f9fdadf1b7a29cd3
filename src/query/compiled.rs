//! Compiled queries: one-sided and two-sided query sets with their plans

use super::definition::QueryDefinition;
use super::plan::Plan;
use super::transition::{Transition, TraversalQuery};
use crate::graph::{curie_prefix, ConceptType, KNode};
use crate::typegraph::TypeGraph;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A start or end anchor of a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub node: KNode,
    /// Free-text node the anchor was resolved from
    pub lookup: Option<KNode>,
    /// True for end anchors expanded inward
    pub reversed: bool,
}

/// One plan ready to execute from one anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRun {
    pub plan: Plan,
    pub start: KNode,
    pub reversed: bool,
}

/// A path anchored at a single identifier.
#[derive(Debug, Clone)]
pub struct OneSidedQuery {
    pub start_value: String,
    pub node_types: Vec<ConceptType>,
    pub transitions: Vec<Transition>,
    pub plans: Vec<Plan>,
}

impl OneSidedQuery {
    fn new(start_value: &str, def: &QueryDefinition) -> Self {
        Self {
            start_value: start_value.to_string(),
            node_types: def.node_types.clone(),
            transitions: def.transitions.clone(),
            plans: Vec::new(),
        }
    }

    pub fn start_type(&self) -> ConceptType {
        self.node_types.first().copied().unwrap_or(ConceptType::Unspecified)
    }

    pub fn end_type(&self) -> ConceptType {
        self.node_types.last().copied().unwrap_or(ConceptType::Unspecified)
    }

    /// Start identifier; name types read `Type:value`.
    pub fn start_identifier(&self) -> String {
        let concept = self.start_type();
        let prefix = format!("{}:", concept);
        if concept.is_name_type() && !self.start_value.starts_with(&prefix) {
            format!("{}{}", prefix, self.start_value)
        } else {
            self.start_value.clone()
        }
    }

    pub fn start_node(&self) -> KNode {
        KNode::new(self.start_identifier(), self.start_type())
    }

    pub fn traversal_query(&self) -> TraversalQuery {
        TraversalQuery::new(self.transitions.clone()).with_start_prefix(curie_prefix(&self.start_identifier()))
    }

    /// Ask the type graph for plans. A type-graph failure counts as no plans.
    pub async fn compile(&mut self, type_graph: &dyn TypeGraph) -> bool {
        match type_graph.get_transitions(&self.traversal_query()).await {
            Ok(plans) => self.plans = plans,
            Err(e) => {
                warn!(start = %self.start_value, error = %e, "type graph query failed");
                self.plans.clear();
            }
        }
        debug!(start = %self.start_value, plans = self.plans.len(), "one-sided query compiled");
        !self.plans.is_empty()
    }
}

/// Every start identifier of one definition, sharing its transitions.
#[derive(Debug, Clone)]
pub struct OneSidedQuerySet {
    pub lookup: Option<KNode>,
    pub queries: Vec<OneSidedQuery>,
    /// Expands from an end anchor inward
    pub reversed: bool,
}

impl OneSidedQuerySet {
    pub fn new(def: &QueryDefinition, reversed: bool) -> Self {
        Self {
            lookup: def.start_lookup_node.clone(),
            queries: def.start_values.iter().map(|v| OneSidedQuery::new(v, def)).collect(),
            reversed,
        }
    }

    /// Drop queries that do not validate; true if any survive.
    pub async fn compile(&mut self, type_graph: &dyn TypeGraph) -> bool {
        let mut kept = Vec::with_capacity(self.queries.len());
        for mut query in std::mem::take(&mut self.queries) {
            if query.compile(type_graph).await {
                kept.push(query);
            }
        }
        self.queries = kept;
        !self.queries.is_empty()
    }

    fn start_types(&self) -> HashSet<ConceptType> {
        self.queries.iter().map(OneSidedQuery::start_type).collect()
    }

    fn end_types(&self) -> HashSet<ConceptType> {
        self.queries.iter().map(OneSidedQuery::end_type).collect()
    }

    fn anchors(&self) -> impl Iterator<Item = Anchor> + '_ {
        self.queries.iter().map(|q| Anchor {
            node: q.start_node(),
            lookup: self.lookup.clone(),
            reversed: self.reversed,
        })
    }

    fn runs(&self) -> impl Iterator<Item = PlannedRun> + '_ {
        self.queries.iter().flat_map(move |q| {
            q.plans.iter().map(move |plan| PlannedRun {
                plan: plan.clone(),
                start: q.start_node(),
                reversed: self.reversed,
            })
        })
    }
}

/// Left and right halves of a two-sided query meeting at `split`.
#[derive(Debug, Clone)]
pub struct TwoSidedQuery {
    pub split: usize,
    pub left: OneSidedQuerySet,
    pub right: OneSidedQuerySet,
}

impl TwoSidedQuery {
    /// True only if both halves validate.
    pub async fn compile(&mut self, type_graph: &dyn TypeGraph) -> bool {
        self.left.compile(type_graph).await && self.right.compile(type_graph).await
    }
}

#[derive(Debug, Clone)]
pub struct TwoSidedQuerySet {
    pub queries: Vec<TwoSidedQuery>,
}

impl TwoSidedQuerySet {
    pub fn splits(&self) -> Vec<usize> {
        self.queries.iter().map(|q| q.split).collect()
    }
}

/// A query validated against the type graph.
#[derive(Debug, Clone)]
pub enum CompiledQuery {
    OneSided(OneSidedQuerySet),
    TwoSided(TwoSidedQuerySet),
}

impl CompiledQuery {
    fn sets(&self) -> Vec<&OneSidedQuerySet> {
        match self {
            Self::OneSided(set) => vec![set],
            Self::TwoSided(pairs) => pairs.queries.iter().flat_map(|q| [&q.left, &q.right]).collect(),
        }
    }

    /// Distinct anchors in order, start side first within each split.
    pub fn anchors(&self) -> Vec<Anchor> {
        let mut seen = HashSet::new();
        self.sets()
            .into_iter()
            .flat_map(OneSidedQuerySet::anchors)
            .filter(|a| seen.insert((a.node.identifier.clone(), a.reversed)))
            .collect()
    }

    pub fn start_nodes(&self) -> Vec<KNode> {
        self.anchors().into_iter().map(|a| a.node).collect()
    }

    pub fn lookups(&self) -> Vec<Option<KNode>> {
        self.anchors().into_iter().map(|a| a.lookup).collect()
    }

    pub fn reversed(&self) -> Vec<bool> {
        self.anchors().into_iter().map(|a| a.reversed).collect()
    }

    /// (start types, end types). For two-sided queries the end types are
    /// the start types of the right halves.
    pub fn terminal_types(&self) -> (HashSet<ConceptType>, HashSet<ConceptType>) {
        match self {
            Self::OneSided(set) => (set.start_types(), set.end_types()),
            Self::TwoSided(pairs) => {
                let mut start = HashSet::new();
                let mut end = HashSet::new();
                for q in &pairs.queries {
                    start.extend(q.left.start_types());
                    end.extend(q.right.start_types());
                }
                (start, end)
            }
        }
    }

    /// Every (plan, start, reversed) to execute, duplicates removed.
    pub fn programs(&self) -> Vec<PlannedRun> {
        let mut runs: Vec<PlannedRun> = Vec::new();
        for run in self.sets().into_iter().flat_map(OneSidedQuerySet::runs) {
            if !runs.contains(&run) {
                runs.push(run);
            }
        }
        runs
    }

    pub fn traversal_queries(&self) -> Vec<TraversalQuery> {
        self.sets()
            .into_iter()
            .flat_map(|s| s.queries.iter().map(OneSidedQuery::traversal_query))
            .collect()
    }
}
