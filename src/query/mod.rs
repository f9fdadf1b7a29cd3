//! Query compiler
//!
//! Turns a path specification (concept types, hop bounds and anchors) into
//! plans the type graph confirms are executable.

mod compiled;
mod definition;
mod parse;
mod plan;
mod transition;


pub use compiled::{
    Anchor, CompiledQuery, OneSidedQuery, OneSidedQuerySet, PlannedRun, TwoSidedQuery, TwoSidedQuerySet,
};
pub use definition::{QueryDefinition, QueryError, QueryResult, UserQuery};
pub use parse::{PathElement, PathSpec};
pub use plan::{Plan, PlanStep};
pub use transition::{Transition, TraversalQuery, PLAN_LIMIT};
