//! Quality evaluator over a [`GraphSnapshot`].
//!
//! Every metric is computed over all snapshot edges. Edge types outside
//! the ten-type taxonomy (including `CITES`) count as invalid rather
//! than being skipped. Ratios whose denominator would be zero are 0,
//! except `validity_rate`, which is 1 for an empty edge set so that it
//! and the invalid share always sum to 1.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::Direction;
use tracing::info;

use citegraph_core::snapshot::CITES;
use citegraph_core::taxonomy::CONFLICTING_TYPES;
use citegraph_core::{BenefitGroup, GraphSnapshot, RelationType, SnapshotEdge};

use crate::report::*;

const SELF_LOOP_WEIGHT: f64 = 0.2;
const DUPLICATE_WEIGHT: f64 = 0.2;
const CONFLICT_WEIGHT: f64 = 0.3;
const ASYMMETRY_WEIGHT: f64 = 0.3;

/// Pure metric computation; never writes anywhere.
pub struct QualityEvaluator {
    nodes: BTreeSet<String>,
    edges: Vec<SnapshotEdge>,
    years: HashMap<String, i32>,
}

impl QualityEvaluator {
    /// The node set is the snapshot's nodes plus every edge endpoint.
    pub fn new(snapshot: GraphSnapshot) -> Self {
        let nodes = snapshot.all_nodes();
        Self {
            nodes,
            edges: snapshot.edges,
            years: snapshot.years,
        }
    }

    fn taxonomy_type(edge: &SnapshotEdge) -> Option<RelationType> {
        RelationType::from_name(&edge.edge_type)
    }

    fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.edges {
            *counts.entry(e.edge_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Edge count divisor: the edge count, at least 1.
    fn edge_divisor(&self) -> f64 {
        self.edges.len().max(1) as f64
    }

    pub fn identification_distribution(&self) -> IdentificationDistribution {
        let type_counts = self.type_counts();
        let total = self.edge_divisor();

        let type_distribution = type_counts
            .iter()
            .map(|(t, &c)| (t.clone(), c as f64 / total))
            .collect();

        let mut group_counts: BTreeMap<BenefitGroup, usize> =
            BenefitGroup::ALL.iter().map(|&g| (g, 0)).collect();
        for e in &self.edges {
            if let Some(t) = Self::taxonomy_type(e) {
                *group_counts.entry(t.benefit_group()).or_insert(0) += 1;
            }
        }
        let benefit_group_distribution: BTreeMap<BenefitGroup, f64> = group_counts
            .into_iter()
            .map(|(g, c)| (g, c as f64 / total))
            .collect();

        let max = benefit_group_distribution.values().cloned().fold(f64::MIN, f64::max);
        let min = benefit_group_distribution.values().cloned().fold(f64::MAX, f64::min);
        let balance_score = 1.0 - (max - min);

        IdentificationDistribution {
            type_counts,
            type_distribution,
            benefit_group_distribution,
            balance_score,
            total_edges: self.edges.len(),
        }
    }

    pub fn type_classification_quality(&self) -> TypeClassificationQuality {
        let observed = self.type_counts();
        let total = self.edge_divisor();
        let taxonomy_size = RelationType::ALL.len();

        let mut type_counts = BTreeMap::new();
        let mut type_distribution = BTreeMap::new();
        for t in RelationType::ALL {
            let c = observed.get(t.name()).copied().unwrap_or(0);
            type_counts.insert(t.name().to_string(), c);
            type_distribution.insert(t.name().to_string(), c as f64 / total);
        }

        let types_used: Vec<String> = RelationType::ALL
            .iter()
            .filter(|t| observed.contains_key(t.name()))
            .map(|t| t.name().to_string())
            .collect();
        let invalid_types: Vec<String> = observed
            .keys()
            .filter(|t| RelationType::from_name(t).is_none())
            .cloned()
            .collect();

        let valid_total: usize = type_counts.values().sum();
        let diversity_score = if valid_total > 0 {
            let entropy: f64 = type_counts
                .values()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / valid_total as f64;
                    -p * p.log2()
                })
                .sum();
            entropy / (taxonomy_size as f64).log2()
        } else {
            0.0
        };

        let invalid_edges = self.edges.len() - valid_total;
        let validity_rate = if self.edges.is_empty() {
            1.0
        } else {
            valid_total as f64 / self.edges.len() as f64
        };

        TypeClassificationQuality {
            type_distribution,
            type_counts,
            taxonomy_coverage: types_used.len() as f64 / taxonomy_size as f64,
            diversity_score,
            validity_rate,
            invalid_edges,
            types_used,
            invalid_types,
            taxonomy_size,
        }
    }

    pub fn graph_coverage(&self) -> GraphCoverage {
        let num_nodes = self.nodes.len();
        let num_edges = self.edges.len();

        let mut graph: DiGraph<&str, &str> = DiGraph::with_capacity(num_nodes, num_edges);
        let index: HashMap<&str, NodeIndex> = self
            .nodes
            .iter()
            .map(|n| (n.as_str(), graph.add_node(n.as_str())))
            .collect();
        for e in &self.edges {
            graph.add_edge(index[e.source.as_str()], index[e.target.as_str()], e.edge_type.as_str());
        }

        let mut max_out = 0;
        let mut max_in = 0;
        let mut isolated = 0;
        for n in graph.node_indices() {
            let out_deg = graph.edges_directed(n, Direction::Outgoing).count();
            let in_deg = graph.edges_directed(n, Direction::Incoming).count();
            max_out = max_out.max(out_deg);
            max_in = max_in.max(in_deg);
            if out_deg == 0 && in_deg == 0 {
                isolated += 1;
            }
        }

        let mut components = UnionFind::<usize>::new(num_nodes);
        for e in graph.edge_indices() {
            if let Some((a, b)) = graph.edge_endpoints(e) {
                components.union(a.index(), b.index());
            }
        }
        let mut component_sizes: HashMap<usize, usize> = HashMap::new();
        for n in 0..num_nodes {
            *component_sizes.entry(components.find(n)).or_insert(0) += 1;
        }
        let largest = component_sizes.values().copied().max().unwrap_or(0);

        let density = if num_nodes > 1 {
            let possible = (num_nodes * (num_nodes - 1)) as f64;
            (num_edges as f64 / possible).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let per_node = |x: usize| if num_nodes > 0 { x as f64 / num_nodes as f64 } else { 0.0 };
        let annotated = self.edges.iter().filter(|e| Self::taxonomy_type(e).is_some()).count();

        GraphCoverage {
            num_nodes,
            num_edges,
            density,
            avg_out_degree: per_node(num_edges),
            avg_in_degree: per_node(num_edges),
            max_out_degree: max_out,
            max_in_degree: max_in,
            isolated_nodes: isolated,
            connectivity_rate: per_node(num_nodes - isolated),
            annotation_completeness: if num_edges > 0 {
                annotated as f64 / num_edges as f64
            } else {
                0.0
            },
            connected_components: component_sizes.len(),
            largest_component_share: per_node(largest),
        }
    }

    pub fn relationship_precision_heuristics(&self) -> PrecisionHeuristics {
        let self_loops = self.edges.iter().filter(|e| e.source == e.target).count();

        let distinct: HashSet<(&str, &str, &str)> = self
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.edge_type.as_str()))
            .collect();
        let duplicate_edges = self.edges.len() - distinct.len();

        let mut pair_types: HashMap<(&str, &str), HashSet<RelationType>> = HashMap::new();
        for e in &self.edges {
            if let Some(t) = Self::taxonomy_type(e) {
                pair_types
                    .entry((e.source.as_str(), e.target.as_str()))
                    .or_default()
                    .insert(t);
            }
        }

        let semantic_conflicts = pair_types
            .values()
            .map(|types| {
                CONFLICTING_TYPES
                    .iter()
                    .filter(|(a, b)| types.contains(a) && types.contains(b))
                    .count()
            })
            .sum();

        // Each unordered pair is visited once, from its smaller endpoint.
        let mut asymmetric_violations = 0;
        for (&(src, tgt), types) in &pair_types {
            if src >= tgt {
                continue;
            }
            if let Some(reverse) = pair_types.get(&(tgt, src)) {
                asymmetric_violations += types
                    .iter()
                    .filter(|t| t.is_directional() && reverse.contains(*t))
                    .count();
            }
        }

        let total = self.edge_divisor();
        let score = 1.0
            - (self_loops as f64 / total) * SELF_LOOP_WEIGHT
            - (duplicate_edges as f64 / total) * DUPLICATE_WEIGHT
            - (semantic_conflicts as f64 / total) * CONFLICT_WEIGHT
            - (asymmetric_violations as f64 / total) * ASYMMETRY_WEIGHT;

        PrecisionHeuristics {
            self_loops,
            duplicate_edges,
            semantic_conflicts,
            asymmetric_violations,
            heuristic_quality_score: score.max(0.0),
        }
    }

    pub fn citation_consistency(&self) -> CitationConsistency {
        let citations: Vec<&SnapshotEdge> = self.edges.iter().filter(|e| e.edge_type == CITES).collect();
        let semantic: Vec<&SnapshotEdge> = self
            .edges
            .iter()
            .filter(|e| Self::taxonomy_type(e).is_some())
            .collect();

        let mut dated = 0;
        let mut temporal_violations = 0;
        for e in &citations {
            if let (Some(citing), Some(cited)) = (self.years.get(&e.source), self.years.get(&e.target)) {
                dated += 1;
                if citing < cited {
                    temporal_violations += 1;
                }
            }
        }
        let temporal_consistency_rate = if dated > 0 {
            1.0 - temporal_violations as f64 / dated as f64
        } else {
            1.0
        };

        let (orphan_semantic_edges, orphan_rate) = if citations.is_empty() {
            (None, None)
        } else {
            let cited_pairs: HashSet<(&str, &str)> = citations
                .iter()
                .flat_map(|e| {
                    [
                        (e.source.as_str(), e.target.as_str()),
                        (e.target.as_str(), e.source.as_str()),
                    ]
                })
                .collect();
            let orphans = semantic
                .iter()
                .filter(|e| !cited_pairs.contains(&(e.source.as_str(), e.target.as_str())))
                .count();
            let rate = if semantic.is_empty() {
                0.0
            } else {
                orphans as f64 / semantic.len() as f64
            };
            (Some(orphans), Some(rate))
        };

        CitationConsistency {
            citation_edges: citations.len(),
            dated_citation_edges: dated,
            temporal_violations,
            temporal_consistency_rate,
            semantic_edges: semantic.len(),
            orphan_semantic_edges,
            orphan_rate,
        }
    }

    pub fn evaluate_all(&self) -> EvaluationReport {
        let report = EvaluationReport {
            identification_distribution: self.identification_distribution(),
            type_classification_quality: self.type_classification_quality(),
            graph_coverage: self.graph_coverage(),
            relationship_precision: self.relationship_precision_heuristics(),
            citation_consistency: self.citation_consistency(),
        };
        info!(
            "Evaluated {} nodes / {} edges: validity={:.3}, density={:.4}, heuristic score={:.3}",
            report.graph_coverage.num_nodes,
            report.graph_coverage.num_edges,
            report.type_classification_quality.validity_rate,
            report.graph_coverage.density,
            report.relationship_precision.heuristic_quality_score
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(s: &str, t: &str, ty: &str) -> SnapshotEdge {
        if ty == CITES {
            SnapshotEdge::cites(s, t)
        } else {
            SnapshotEdge::semantic(s, t, ty)
        }
    }

    fn evaluator(edges: &[(&str, &str, &str)]) -> QualityEvaluator {
        QualityEvaluator::new(GraphSnapshot::from_edges(
            edges.iter().map(|(s, t, ty)| edge(s, t, ty)).collect(),
        ))
    }

    #[test]
    fn test_empty_and_single_node_graphs() {
        let empty = QualityEvaluator::new(GraphSnapshot::default());
        let report = empty.evaluate_all();
        assert_eq!(report.graph_coverage.density, 0.0);
        assert_eq!(report.graph_coverage.avg_out_degree, 0.0);
        assert_eq!(report.graph_coverage.connectivity_rate, 0.0);
        assert_eq!(report.type_classification_quality.validity_rate, 1.0);
        assert_eq!(report.relationship_precision.heuristic_quality_score, 1.0);

        let single = QualityEvaluator::new(GraphSnapshot::new(vec!["A".to_string()], vec![]));
        let coverage = single.graph_coverage();
        assert_eq!(coverage.num_nodes, 1);
        assert_eq!(coverage.density, 0.0);
        assert_eq!(coverage.isolated_nodes, 1);
        assert_eq!(coverage.connected_components, 1);

        let self_loop = evaluator(&[("A", "A", "Extends")]);
        assert_eq!(self_loop.graph_coverage().density, 0.0);
    }

    #[test]
    fn test_density_is_bounded() {
        let dense = evaluator(&[
            ("A", "B", "Extends"),
            ("A", "B", "Solves"),
            ("A", "B", "Requires"),
            ("B", "A", "Enables"),
        ]);
        let density = dense.graph_coverage().density;
        assert!((0.0..=1.0).contains(&density));
        assert_eq!(density, 1.0);

        let sparse = evaluator(&[("A", "B", "Extends"), ("C", "D", "Solves")]);
        assert!((sparse.graph_coverage().density - 2.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolated_node_count() {
        let snapshot = GraphSnapshot::new(
            ["A", "B", "C"].iter().map(|s| s.to_string()),
            vec![SnapshotEdge::cites("A", "B")],
        );
        let coverage = QualityEvaluator::new(snapshot).graph_coverage();
        assert_eq!(coverage.isolated_nodes, 1);
        assert_eq!(coverage.num_nodes, 3);
        assert!((coverage.connectivity_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(coverage.connected_components, 2);
        assert!((coverage.largest_component_share - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(coverage.annotation_completeness, 0.0);
    }

    #[test]
    fn test_validity_plus_invalid_share_is_one() {
        let cases: Vec<Vec<(&str, &str, &str)>> = vec![
            vec![],
            vec![("A", "B", "Extends")],
            vec![("A", "B", "Extends"), ("B", "C", "Inspires"), ("C", "A", CITES)],
            vec![("A", "B", "unknown"), ("B", "C", "EXTENDS")],
        ];
        for edges in cases {
            let q = evaluator(&edges).type_classification_quality();
            let invalid_share = q.invalid_edges as f64 / edges.len().max(1) as f64;
            assert!((q.validity_rate + invalid_share - 1.0).abs() < 1e-12, "{:?}", edges);
        }

        let q = evaluator(&[("A", "B", "Extends"), ("B", "C", "Inspires")]).type_classification_quality();
        assert_eq!(q.invalid_types, vec!["Inspires".to_string()]);
        assert_eq!(q.types_used, vec!["Extends".to_string()]);
        assert!((q.taxonomy_coverage - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_diversity_score() {
        let single_type = evaluator(&[("A", "B", "Extends"), ("B", "C", "Extends")]);
        assert_eq!(single_type.type_classification_quality().diversity_score, 0.0);

        let uniform: Vec<(String, String, &str)> = RelationType::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| (format!("s{}", i), format!("t{}", i), t.name()))
            .collect();
        let edges: Vec<(&str, &str, &str)> = uniform
            .iter()
            .map(|(s, t, ty)| (s.as_str(), t.as_str(), *ty))
            .collect();
        let diversity = evaluator(&edges).type_classification_quality().diversity_score;
        assert!((diversity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_extends_is_one_asymmetric_violation() {
        let h = evaluator(&[("A", "B", "Extends"), ("B", "A", "Extends")]).relationship_precision_heuristics();
        assert_eq!(h.asymmetric_violations, 1);
        assert_eq!(h.self_loops, 0);
        assert!((h.heuristic_quality_score - (1.0 - 0.5 * 0.3)).abs() < 1e-12);

        let non_directional =
            evaluator(&[("A", "B", "Solves"), ("B", "A", "Solves")]).relationship_precision_heuristics();
        assert_eq!(non_directional.asymmetric_violations, 0);
    }

    #[test]
    fn test_validates_and_contradicts_is_one_conflict() {
        let h = evaluator(&[("A", "B", "Validates"), ("A", "B", "Contradicts")])
            .relationship_precision_heuristics();
        assert_eq!(h.semantic_conflicts, 1);

        let reversed = evaluator(&[("A", "B", "Validates"), ("B", "A", "Contradicts")])
            .relationship_precision_heuristics();
        assert_eq!(reversed.semantic_conflicts, 0);
    }

    #[test]
    fn test_self_loops_and_duplicates() {
        let h = evaluator(&[
            ("A", "A", "Extends"),
            ("A", "B", "Solves"),
            ("A", "B", "Solves"),
            ("B", "C", "Requires"),
        ])
        .relationship_precision_heuristics();
        assert_eq!(h.self_loops, 1);
        assert_eq!(h.duplicate_edges, 1);
        assert!((h.heuristic_quality_score - (1.0 - 0.25 * 0.2 - 0.25 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_benefit_groups_and_balance() {
        let d = evaluator(&[
            ("A", "B", "Extends"),
            ("B", "C", "Adapts-from"),
            ("C", "D", "Solves"),
            ("D", "E", CITES),
        ])
        .identification_distribution();
        assert_eq!(d.total_edges, 4);
        assert_eq!(d.benefit_group_distribution[&BenefitGroup::LearningPath], 0.5);
        assert_eq!(d.benefit_group_distribution[&BenefitGroup::ProblemSolution], 0.25);
        assert_eq!(d.benefit_group_distribution[&BenefitGroup::Prerequisites], 0.0);
        assert!((d.balance_score - 0.5).abs() < 1e-12);
        assert_eq!(d.type_counts[CITES], 1);
    }

    #[test]
    fn test_citation_consistency() {
        let mut years = HashMap::new();
        years.insert("new".to_string(), 2023);
        years.insert("old".to_string(), 2015);
        let snapshot = GraphSnapshot::from_edges(vec![
            SnapshotEdge::cites("new", "old"),
            SnapshotEdge::cites("old", "new"),
            SnapshotEdge::cites("new", "undated"),
            SnapshotEdge::semantic("old", "new", "Validates"),
            SnapshotEdge::semantic("new", "undated", "Extends"),
            SnapshotEdge::semantic("new", "stray", "Solves"),
        ])
        .with_years(years);
        let c = QualityEvaluator::new(snapshot).citation_consistency();
        assert_eq!(c.citation_edges, 3);
        assert_eq!(c.dated_citation_edges, 2);
        assert_eq!(c.temporal_violations, 1);
        assert!((c.temporal_consistency_rate - 0.5).abs() < 1e-12);
        assert_eq!(c.semantic_edges, 3);
        assert_eq!(c.orphan_semantic_edges, Some(1));

        let no_cites = evaluator(&[("A", "B", "Extends")]).citation_consistency();
        assert_eq!(no_cites.orphan_semantic_edges, None);
    }

    #[test]
    fn test_report_serializes() {
        let report = evaluator(&[("A", "B", "Extends")]).evaluate_all();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["identification_distribution"]["benefit_group_distribution"]["learning_path"].is_number());
        assert_eq!(json["relationship_precision"]["asymmetric_violations"], 0);
    }
}
