//! Plans: concrete operation sequences validated by the type graph

use crate::graph::ConceptType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One adapter operation in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanStep {
    pub from: ConceptType,
    pub to: ConceptType,
    /// Operation id, resolved through the adapter registry at run time
    pub operation: String,
    /// Results assert identity rather than a relationship
    #[serde(default)]
    pub synonym: bool,
}

impl PlanStep {
    pub fn new(from: ConceptType, to: ConceptType, operation: impl Into<String>) -> Self {
        Self {
            from,
            to,
            operation: operation.into(),
            synonym: false,
        }
    }

    pub fn synonym(concept: ConceptType, operation: impl Into<String>) -> Self {
        Self {
            synonym: true,
            ..Self::new(concept, concept, operation)
        }
    }
}

/// A validated, executable realization of a path specification.
///
/// A node at position `i` is expanded by `steps[i]`; its results sit at
/// position `i + 1`. Position `steps.len()` is terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, position: usize) -> Option<&PlanStep> {
        self.steps.get(position)
    }

    /// Number of non-synonym operations.
    pub fn hop_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.synonym).count()
    }

    pub fn synonym_count(&self) -> usize {
        self.steps.iter().filter(|s| s.synonym).count()
    }

    pub fn start_type(&self) -> Option<ConceptType> {
        self.steps.first().map(|s| s.from)
    }

    pub fn end_type(&self) -> Option<ConceptType> {
        self.steps.last().map(|s| s.to)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<&str> = self.steps.iter().map(|s| s.operation.as_str()).collect();
        write!(f, "[{}]", ops.join(" -> "))
    }
}
