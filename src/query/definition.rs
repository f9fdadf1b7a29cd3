//! Path definitions and the incremental query builder

use super::compiled::{CompiledQuery, OneSidedQuerySet, TwoSidedQuery, TwoSidedQuerySet};
use super::transition::Transition;
use crate::graph::{ConceptType, KNode};
use crate::typegraph::TypeGraph;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while defining or compiling a query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Maximum path length {max} is shorter than minimum {min}")]
    InvalidRange { min: u32, max: u32 },

    #[error("Cannot add transitions after the end values are set")]
    QueryAlreadyTerminated,

    #[error("No plan in the type graph satisfies the query")]
    NoSatisfyingPlan,

    #[error("Invalid split point {0}")]
    InvalidSplit(usize),

    #[error("Invalid path specification: {0}")]
    InvalidPathSpec(String),

    #[error("A query needs at least one start identifier")]
    MissingStartValues,
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// The full path specification.
///
/// `node_types` always holds one more entry than `transitions`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDefinition {
    pub start_values: Vec<String>,
    pub start_type: ConceptType,
    pub start_lookup_node: Option<KNode>,
    pub end_values: Option<Vec<String>>,
    pub end_lookup_node: Option<KNode>,
    pub node_types: Vec<ConceptType>,
    pub transitions: Vec<Transition>,
}

impl QueryDefinition {
    fn new(start_values: Vec<String>, start_type: ConceptType, start_lookup_node: Option<KNode>) -> Self {
        Self {
            start_values,
            start_type,
            start_lookup_node,
            end_values: None,
            end_lookup_node: None,
            node_types: vec![start_type],
            transitions: Vec::new(),
        }
    }

    pub fn end_type(&self) -> ConceptType {
        self.node_types.last().copied().unwrap_or(self.start_type)
    }

    pub fn is_two_sided(&self) -> bool {
        self.end_values.is_some()
    }

    /// Split points tried for a two-sided query: `1..=transitions - 1`.
    pub fn split_points(&self) -> std::ops::Range<usize> {
        1..self.transitions.len().max(1)
    }

    fn check_split(&self, split: usize) -> QueryResult<()> {
        if split < 1 || split >= self.transitions.len() {
            return Err(QueryError::InvalidSplit(split));
        }
        Ok(())
    }

    /// The first `split` transitions, anchored at the query start.
    pub fn left(&self, split: usize) -> QueryResult<QueryDefinition> {
        self.check_split(split)?;
        Ok(QueryDefinition {
            start_values: self.start_values.clone(),
            start_type: self.start_type,
            start_lookup_node: self.start_lookup_node.clone(),
            end_values: None,
            end_lookup_node: None,
            node_types: self.node_types[..=split].to_vec(),
            transitions: self.transitions[..split].to_vec(),
        })
    }

    /// The remaining transitions walked inward from the end anchor.
    pub fn right(&self, split: usize) -> QueryResult<QueryDefinition> {
        self.check_split(split)?;
        let mut node_types = self.node_types[split..].to_vec();
        node_types.reverse();
        let transitions = self.transitions[split..].iter().rev().map(Transition::reverse).collect();
        Ok(QueryDefinition {
            start_values: self.end_values.clone().unwrap_or_default(),
            start_type: self.end_type(),
            start_lookup_node: self.end_lookup_node.clone(),
            end_values: None,
            end_lookup_node: None,
            node_types,
            transitions,
        })
    }
}

/// What the rest of the builder uses to describe a query.
#[derive(Debug, Clone)]
pub struct UserQuery {
    definition: QueryDefinition,
}

impl UserQuery {
    pub fn new(start_values: Vec<String>, start_type: ConceptType, start_lookup_node: Option<KNode>) -> Self {
        Self {
            definition: QueryDefinition::new(start_values, start_type, start_lookup_node),
        }
    }

    /// Require the path to pass through `next_type` next.
    ///
    /// `min_hops..=max_hops` bounds the non-synonym operations between the
    /// previous type and this one. Passing `end_values` anchors the path at
    /// this node and closes the definition. A rejected call leaves the
    /// definition unchanged.
    pub fn add_transition(
        &mut self,
        next_type: ConceptType,
        min_hops: u32,
        max_hops: u32,
        end_values: Option<Vec<String>>,
    ) -> QueryResult<()> {
        if min_hops > max_hops {
            return Err(QueryError::InvalidRange { min: min_hops, max: max_hops });
        }
        if self.definition.end_values.is_some() {
            return Err(QueryError::QueryAlreadyTerminated);
        }
        let previous = self.definition.end_type();
        self.definition.node_types.push(next_type);
        self.definition
            .transitions
            .push(Transition::new(previous, next_type, min_hops, max_hops));
        if end_values.is_some() {
            self.definition.end_values = end_values;
        }
        Ok(())
    }

    pub fn add_end_lookup_node(&mut self, node: KNode) {
        self.definition.end_lookup_node = Some(node);
    }

    pub fn definition(&self) -> &QueryDefinition {
        &self.definition
    }

    /// Validate the query against the type graph.
    ///
    /// One-sided queries keep every start identifier with at least one plan.
    /// Two-sided queries keep every split point whose left and right halves
    /// both validate.
    pub async fn compile(&self, type_graph: &dyn TypeGraph) -> QueryResult<CompiledQuery> {
        let def = &self.definition;
        if def.start_values.is_empty() {
            return Err(QueryError::MissingStartValues);
        }

        let compiled = if def.is_two_sided() {
            let mut splits = Vec::new();
            for split in def.split_points() {
                let mut pair = TwoSidedQuery {
                    split,
                    left: OneSidedQuerySet::new(&def.left(split)?, false),
                    right: OneSidedQuerySet::new(&def.right(split)?, true),
                };
                if pair.compile(type_graph).await {
                    splits.push(pair);
                } else {
                    debug!(split, "split point does not validate");
                }
            }
            if splits.is_empty() {
                return Err(QueryError::NoSatisfyingPlan);
            }
            CompiledQuery::TwoSided(TwoSidedQuerySet { queries: splits })
        } else {
            let mut set = OneSidedQuerySet::new(def, false);
            if !set.compile(type_graph).await {
                return Err(QueryError::NoSatisfyingPlan);
            }
            CompiledQuery::OneSided(set)
        };

        info!(
            two_sided = def.is_two_sided(),
            programs = compiled.programs().len(),
            "compiled query"
        );
        Ok(compiled)
    }
}
