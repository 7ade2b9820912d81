//! Serializable metric reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use citegraph_core::BenefitGroup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationDistribution {
    /// Edge count per observed type, taxonomy or not.
    pub type_counts: BTreeMap<String, usize>,
    /// Share of all edges per observed type.
    pub type_distribution: BTreeMap<String, f64>,
    pub benefit_group_distribution: BTreeMap<BenefitGroup, f64>,
    /// `1 - (max group share - min group share)`.
    pub balance_score: f64,
    pub total_edges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeClassificationQuality {
    /// Share of all edges per taxonomy type.
    pub type_distribution: BTreeMap<String, f64>,
    pub type_counts: BTreeMap<String, usize>,
    pub taxonomy_coverage: f64,
    /// Shannon entropy of taxonomy type counts, normalized to [0, 1].
    pub diversity_score: f64,
    pub validity_rate: f64,
    pub invalid_edges: usize,
    pub types_used: Vec<String>,
    pub invalid_types: Vec<String>,
    pub taxonomy_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphCoverage {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub density: f64,
    pub avg_out_degree: f64,
    pub avg_in_degree: f64,
    pub max_out_degree: usize,
    pub max_in_degree: usize,
    pub isolated_nodes: usize,
    pub connectivity_rate: f64,
    pub annotation_completeness: f64,
    /// Weakly connected components, isolated nodes included.
    pub connected_components: usize,
    pub largest_component_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionHeuristics {
    pub self_loops: usize,
    pub duplicate_edges: usize,
    pub semantic_conflicts: usize,
    pub asymmetric_violations: usize,
    pub heuristic_quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationConsistency {
    pub citation_edges: usize,
    /// CITES edges where both endpoint years are known.
    pub dated_citation_edges: usize,
    /// Citing paper published before the paper it cites.
    pub temporal_violations: usize,
    pub temporal_consistency_rate: f64,
    pub semantic_edges: usize,
    /// Semantic edges with no CITES edge between the pair in either
    /// direction. `None` when the snapshot carries no CITES edges.
    pub orphan_semantic_edges: Option<usize>,
    pub orphan_rate: Option<f64>,
}

/// Every metric family together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub identification_distribution: IdentificationDistribution,
    pub type_classification_quality: TypeClassificationQuality,
    pub graph_coverage: GraphCoverage,
    pub relationship_precision: PrecisionHeuristics,
    pub citation_consistency: CitationConsistency,
}
