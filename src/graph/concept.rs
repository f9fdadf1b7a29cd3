//! Concept types: the closed set of semantic categories a node can belong to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// High-level semantic category of an entity.
///
/// `Unspecified` stands for "any concrete type" in path specifications and
/// matches every other variant in pruning and termination checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConceptType {
    Drug,
    Gene,
    Process,
    Cell,
    Anatomy,
    Phenotype,
    Disease,
    GeneticCondition,
    DiseaseName,
    DrugName,
    Unspecified,
}

impl ConceptType {
    /// Every variant, in declaration order.
    pub const ALL: [ConceptType; 11] = [
        ConceptType::Drug,
        ConceptType::Gene,
        ConceptType::Process,
        ConceptType::Cell,
        ConceptType::Anatomy,
        ConceptType::Phenotype,
        ConceptType::Disease,
        ConceptType::GeneticCondition,
        ConceptType::DiseaseName,
        ConceptType::DrugName,
        ConceptType::Unspecified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drug => "Drug",
            Self::Gene => "Gene",
            Self::Process => "Process",
            Self::Cell => "Cell",
            Self::Anatomy => "Anatomy",
            Self::Phenotype => "Phenotype",
            Self::Disease => "Disease",
            Self::GeneticCondition => "GeneticCondition",
            Self::DiseaseName => "DiseaseName",
            Self::DrugName => "DrugName",
            Self::Unspecified => "Unspecified",
        }
    }

    /// Free-text name types. Their nodes are lookups, not database entities.
    pub fn is_name_type(&self) -> bool {
        matches!(self, Self::DiseaseName | Self::DrugName)
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    /// The name type used to look up identifiers of this type, if any.
    pub fn name_type_for(&self) -> Option<ConceptType> {
        match self {
            Self::Disease | Self::GeneticCondition => Some(Self::DiseaseName),
            Self::Drug => Some(Self::DrugName),
            _ => None,
        }
    }

    /// True if either side is `Unspecified` or both are the same type.
    pub fn matches(&self, other: &ConceptType) -> bool {
        self.is_unspecified() || other.is_unspecified() || self == other
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a concept type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown concept type: {0}")]
pub struct UnknownConceptType(pub String);

impl FromStr for ConceptType {
    type Err = UnknownConceptType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| UnknownConceptType(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("gene".parse::<ConceptType>().unwrap(), ConceptType::Gene);
        assert_eq!(
            " GeneticCondition ".parse::<ConceptType>().unwrap(),
            ConceptType::GeneticCondition
        );
        assert!("Pathway".parse::<ConceptType>().is_err());
    }

    #[test]
    fn unspecified_matches_everything() {
        for t in ConceptType::ALL {
            assert!(ConceptType::Unspecified.matches(&t));
            assert!(t.matches(&ConceptType::Unspecified));
        }
        assert!(!ConceptType::Gene.matches(&ConceptType::Disease));
    }

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&ConceptType::GeneticCondition).unwrap();
        assert_eq!(json, "\"GeneticCondition\"");
    }

    #[test]
    fn name_types() {
        assert!(ConceptType::DiseaseName.is_name_type());
        assert!(!ConceptType::Disease.is_name_type());
        assert_eq!(ConceptType::Drug.name_type_for(), Some(ConceptType::DrugName));
        assert_eq!(ConceptType::Gene.name_type_for(), None);
    }
}
