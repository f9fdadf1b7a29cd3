//! Path specification parser
//!
//! Grammar: elements joined by `-`, each `Type[min..max](id,id,...)`.
//! The hop range applies to the transition into the element and defaults
//! to `1..1`. Identifier lists may appear on the first element (required)
//! and on the last.
//!
//! ```text
//! Disease(DOID:1)-Gene-GeneticCondition[1..2]
//! Drug(CHEMBL:5)-Gene-Process-Cell-Anatomy-Disease(DOID:9)
//! ```

use super::definition::{QueryError, QueryResult, UserQuery};
use crate::graph::{ConceptType, KNode};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub concept: ConceptType,
    pub hops: Option<(u32, u32)>,
    pub anchors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    pub elements: Vec<PathElement>,
}

fn invalid(message: impl Into<String>) -> QueryError {
    QueryError::InvalidPathSpec(message.into())
}

/// Split on `-` outside brackets and parentheses.
fn split_elements(text: &str) -> QueryResult<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(invalid(format!("unbalanced '{}' at {}", c, i)));
                }
            }
            '-' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid("unbalanced brackets"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

impl FromStr for PathElement {
    type Err = QueryError;

    fn from_str(text: &str) -> QueryResult<Self> {
        let text = text.trim();
        let name_end = text.find(|c: char| c == '[' || c == '(').unwrap_or(text.len());
        let concept = ConceptType::from_str(&text[..name_end]).map_err(|e| invalid(e.to_string()))?;
        let mut rest = &text[name_end..];

        let mut hops = None;
        if let Some(body) = rest.strip_prefix('[') {
            let close = body.find(']').ok_or_else(|| invalid("missing ']'"))?;
            let (min, max) = body[..close]
                .split_once("..")
                .ok_or_else(|| invalid(format!("hop range '{}' is not min..max", &body[..close])))?;
            let parse = |s: &str| {
                s.trim()
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("'{}' is not a hop count", s)))
            };
            hops = Some((parse(min)?, parse(max)?));
            rest = &body[close + 1..];
        }

        let mut anchors = Vec::new();
        if let Some(body) = rest.strip_prefix('(') {
            let inner = body.strip_suffix(')').ok_or_else(|| invalid("missing ')'"))?;
            anchors = inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if anchors.is_empty() {
                return Err(invalid(format!("empty identifier list on {}", concept)));
            }
            rest = "";
        }

        if !rest.trim().is_empty() {
            return Err(invalid(format!("unexpected '{}' after {}", rest, concept)));
        }
        Ok(Self { concept, hops, anchors })
    }
}

impl FromStr for PathSpec {
    type Err = QueryError;

    fn from_str(text: &str) -> QueryResult<Self> {
        let elements = split_elements(text)?
            .into_iter()
            .map(PathElement::from_str)
            .collect::<QueryResult<Vec<_>>>()?;
        if elements.len() < 2 {
            return Err(invalid("a path needs at least two concept types"));
        }
        if elements[0].hops.is_some() {
            return Err(invalid("the first element cannot carry a hop range"));
        }
        let last = elements.len() - 1;
        if elements[1..last].iter().any(|e| !e.anchors.is_empty()) {
            return Err(invalid("identifiers are only allowed on the first and last elements"));
        }
        Ok(Self { elements })
    }
}

impl PathSpec {
    pub fn parse(text: &str) -> QueryResult<Self> {
        text.parse()
    }

    /// Build a query. `start_name`/`end_name` become lookup nodes of the
    /// matching name type (`DiseaseName` for Disease and so on).
    pub fn to_user_query(&self, start_name: Option<&str>, end_name: Option<&str>) -> QueryResult<UserQuery> {
        let (Some(first), Some(end)) = (self.elements.first(), self.elements.last()) else {
            return Err(invalid("empty path"));
        };
        if first.anchors.is_empty() {
            return Err(QueryError::MissingStartValues);
        }
        let start_lookup = start_name.map(|n| lookup_node(first.concept, n)).transpose()?;
        let mut query = UserQuery::new(first.anchors.clone(), first.concept, start_lookup);

        let last = self.elements.len() - 1;
        for (i, element) in self.elements.iter().enumerate().skip(1) {
            let (min, max) = element.hops.unwrap_or((1, 1));
            let end_values = (i == last && !element.anchors.is_empty()).then(|| element.anchors.clone());
            query.add_transition(element.concept, min, max, end_values)?;
        }

        if let Some(name) = end_name {
            query.add_end_lookup_node(lookup_node(end.concept, name)?);
        }
        Ok(query)
    }
}

fn lookup_node(concept: ConceptType, text: &str) -> QueryResult<KNode> {
    let name_type = concept
        .name_type_for()
        .ok_or_else(|| invalid(format!("{} has no name type for lookups", concept)))?;
    Ok(KNode::named(name_type, text))
}
