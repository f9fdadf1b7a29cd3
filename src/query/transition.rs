//! Transitions and the declarative traversal pattern submitted to the type graph

use crate::graph::ConceptType;
use serde::{Deserialize, Serialize};

/// Maximum number of plans a traversal pattern asks for.
pub const PLAN_LIMIT: usize = 5;

/// One required concept-type hop in a path specification.
///
/// `min_hops..=max_hops` bounds the number of non-synonym operations the type
/// graph may use between `in_type` and `out_type`. Synonym operations are
/// free, up to an overall path length of `2 * max_hops + 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub in_type: ConceptType,
    pub out_type: ConceptType,
    pub min_hops: u32,
    pub max_hops: u32,
}

impl Transition {
    pub fn new(in_type: ConceptType, out_type: ConceptType, min_hops: u32, max_hops: u32) -> Self {
        Self {
            in_type,
            out_type,
            min_hops,
            max_hops,
        }
    }

    /// The same hop walked in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            in_type: self.out_type,
            out_type: self.in_type,
            ..*self
        }
    }

    /// Longest path (synonym operations included) the type graph may use.
    /// Saturates at `u32::MAX` for very large hop bounds.
    pub fn max_path_length(&self) -> u32 {
        self.max_hops.saturating_mul(2).saturating_add(2)
    }

    /// `p{i}=(n{i}:In)-[*min..len]->(n{i+1}:Out)`
    fn path_pattern(&self, index: usize) -> String {
        format!(
            "p{i}=({})-[*{}..{}]->({})",
            node_pattern(index, self.in_type),
            self.min_hops,
            self.max_path_length(),
            node_pattern(index + 1, self.out_type),
            i = index,
        )
    }

    /// WITH clause computing non-synonym (`d{i}`) and synonym (`Syn{i}`)
    /// hop counts for segment `index` and constraining `d{i}`.
    fn with_clause(&self, index: usize, paths: &str) -> String {
        let mut clause = format!("WITH {}", paths);
        for i in 0..index {
            clause.push_str(&format!(", d{i}, Syn{i}", i = i));
        }
        clause.push_str(",\n");
        clause.push_str(&format!(
            "reduce(weight=0, r in relationships(p{i}) | CASE type(r) WHEN \"SYNONYM\" THEN weight ELSE weight + 1 END ) as d{i},\n\
             reduce(weight=0, r in relationships(p{i}) | CASE type(r) WHEN \"SYNONYM\" THEN weight + 1 ELSE weight END ) as Syn{i}",
            i = index
        ));
        if self.min_hops == self.max_hops {
            clause.push_str(&format!("\nWHERE d{} = {}", index, self.min_hops));
        } else {
            clause.push_str(&format!(
                "\nWHERE d{i} >= {} AND d{i} <= {}",
                self.min_hops,
                self.max_hops,
                i = index
            ));
        }
        clause
    }
}

fn node_pattern(index: usize, concept: ConceptType) -> String {
    if concept.is_name_type() {
        format!("n{}{{name:\"{}\"}}", index, concept)
    } else if concept.is_unspecified() {
        format!("n{}", index)
    } else {
        format!("n{}:{}", index, concept)
    }
}

/// Declarative description of a concept-type path, for submission to a
/// type graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalQuery {
    /// CURIE prefix the first type-graph node must carry
    pub start_prefix: Option<String>,
    pub segments: Vec<Transition>,
}

impl TraversalQuery {
    pub fn new(segments: Vec<Transition>) -> Self {
        Self {
            start_prefix: None,
            segments,
        }
    }

    pub fn with_start_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.start_prefix = Some(prefix.into());
        self
    }

    /// Render as a Cypher query for graph-store backed type graphs.
    pub fn to_cypher(&self) -> String {
        let mut buffer: Vec<String> = vec!["MATCH".to_string()];
        let patterns: Vec<String> = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, t)| t.path_pattern(i))
            .collect();
        buffer.push(patterns.join(",\n"));
        buffer.push("WHERE".to_string());
        if let Some(prefix) = &self.start_prefix {
            buffer.push(format!("n0.name=\"{}\" AND", prefix));
        }
        let no_unknowns: Vec<String> = (0..self.segments.len())
            .map(|i| format!("NONE (r in relationships(p{}) WHERE type(r) = \"UNKNOWN\")", i))
            .collect();
        buffer.push(no_unknowns.join("\nAND "));

        let paths = (0..self.segments.len())
            .map(|i| format!("p{}", i))
            .collect::<Vec<_>>()
            .join(",");
        let withs: Vec<String> = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, t)| t.with_clause(i, &paths))
            .collect();
        buffer.push(withs.join("\n"));

        let dvars: Vec<String> = (0..self.segments.len()).map(|i| format!("d{}", i)).collect();
        let svars: Vec<String> = (0..self.segments.len()).map(|i| format!("Syn{}", i)).collect();
        buffer.push(format!(
            "WITH {}, {}, {},\n {} as TD,\n {} as TS",
            paths,
            dvars.join(","),
            svars.join(","),
            dvars.join("+"),
            svars.join("+")
        ));
        buffer.push(format!("WITH {}, TD, TS,", paths));
        buffer.push(" min(TD) as minTD\n WHERE TD = minTD".to_string());
        buffer.push(format!("RETURN {} ORDER BY TS ASC LIMIT {}", paths, PLAN_LIMIT));
        buffer.join("\n")
    }
}
