//! The closed ten-type semantic relationship taxonomy.
//!
//! Store labels are fixed per variant. Classifier output only reaches the
//! store through [`RelationType::from_classifier_label`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic relationship between a citing and a cited paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationType {
    Extends,
    Solves,
    Outperforms,
    Validates,
    Contradicts,
    Requires,
    Enables,
    #[serde(rename = "Adapts-from")]
    AdaptsFrom,
    Achieves,
    Challenges,
}

impl RelationType {
    pub const ALL: [RelationType; 10] = [
        Self::Extends,
        Self::Solves,
        Self::Outperforms,
        Self::Validates,
        Self::Contradicts,
        Self::Requires,
        Self::Enables,
        Self::AdaptsFrom,
        Self::Achieves,
        Self::Challenges,
    ];

    /// Taxonomy name, as used in prompts and evaluation reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Extends => "Extends",
            Self::Solves => "Solves",
            Self::Outperforms => "Outperforms",
            Self::Validates => "Validates",
            Self::Contradicts => "Contradicts",
            Self::Requires => "Requires",
            Self::Enables => "Enables",
            Self::AdaptsFrom => "Adapts-from",
            Self::Achieves => "Achieves",
            Self::Challenges => "Challenges",
        }
    }

    /// Edge label in the graph store.
    pub fn label(self) -> &'static str {
        match self {
            Self::Extends => "EXTENDS",
            Self::Solves => "SOLVES",
            Self::Outperforms => "OUTPERFORMS",
            Self::Validates => "VALIDATES",
            Self::Contradicts => "CONTRADICTS",
            Self::Requires => "REQUIRES",
            Self::Enables => "ENABLES",
            Self::AdaptsFrom => "ADAPTS_FROM",
            Self::Achieves => "ACHIEVES",
            Self::Challenges => "CHALLENGES",
        }
    }

    /// Parse a taxonomy name (`"Adapts-from"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Parse a store label (`"ADAPTS_FROM"`).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Map a free-form classifier string onto the allow-list.
    ///
    /// Case-insensitive; `-`, `_` and whitespace are interchangeable.
    /// Returns `None` for anything outside the taxonomy.
    pub fn from_classifier_label(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| {
                if c == '-' || c == ' ' || c == '\t' {
                    '_'
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect();
        Self::from_label(&normalized)
    }

    /// Newcomer-benefit group the type belongs to.
    pub fn benefit_group(self) -> BenefitGroup {
        match self {
            Self::Extends | Self::AdaptsFrom => BenefitGroup::LearningPath,
            Self::Solves | Self::Enables => BenefitGroup::ProblemSolution,
            Self::Validates | Self::Contradicts | Self::Challenges => BenefitGroup::Reliability,
            Self::Outperforms | Self::Achieves => BenefitGroup::Performance,
            Self::Requires => BenefitGroup::Prerequisites,
        }
    }

    /// Types that should not appear in both directions between two papers.
    pub fn is_directional(self) -> bool {
        matches!(
            self,
            Self::Extends | Self::Outperforms | Self::Validates | Self::Enables
        )
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pairs of types that contradict each other on the same ordered pair.
pub const CONFLICTING_TYPES: [(RelationType, RelationType); 3] = [
    (RelationType::Validates, RelationType::Contradicts),
    (RelationType::Outperforms, RelationType::Requires),
    (RelationType::Extends, RelationType::Contradicts),
];

/// Classifier confidence for a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of relationship types by what they offer a newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitGroup {
    LearningPath,
    ProblemSolution,
    Reliability,
    Performance,
    Prerequisites,
}

impl BenefitGroup {
    pub const ALL: [BenefitGroup; 5] = [
        Self::LearningPath,
        Self::ProblemSolution,
        Self::Reliability,
        Self::Performance,
        Self::Prerequisites,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_label_allow_list() {
        assert_eq!(RelationType::from_classifier_label("Extends"), Some(RelationType::Extends));
        assert_eq!(
            RelationType::from_classifier_label("adapts-from"),
            Some(RelationType::AdaptsFrom)
        );
        assert_eq!(
            RelationType::from_classifier_label(" Adapts from "),
            Some(RelationType::AdaptsFrom)
        );
        assert_eq!(RelationType::from_classifier_label("Inspires"), None);
        assert_eq!(RelationType::from_classifier_label("CITES"), None);
        assert_eq!(RelationType::from_classifier_label("EXTENDS]->(x) DELETE x //"), None);
    }

    #[test]
    fn test_names_and_labels_roundtrip() {
        for t in RelationType::ALL {
            assert_eq!(RelationType::from_name(t.name()), Some(t));
            assert_eq!(RelationType::from_label(t.label()), Some(t));
        }
    }

    #[test]
    fn test_every_type_has_a_group() {
        let groups: std::collections::HashSet<_> =
            RelationType::ALL.iter().map(|t| t.benefit_group()).collect();
        assert_eq!(groups.len(), BenefitGroup::ALL.len());
    }

    #[test]
    fn test_confidence_serde() {
        let c: Confidence = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(c, Confidence::High);
        assert!(serde_json::from_str::<Confidence>("\"certain\"").is_err());
        assert_eq!(Confidence::parse("Medium"), Some(Confidence::Medium));
    }
}
