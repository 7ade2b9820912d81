//! Read-only graph snapshot consumed by the quality evaluator.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Edge type used for plain citation edges.
pub const CITES: &str = "CITES";

/// Category tags attached to snapshot edges.
pub const CATEGORY_CITATION: &str = "citation";
pub const CATEGORY_SEMANTIC: &str = "semantic";

/// A directed, typed edge in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub category: String,
}

impl SnapshotEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type: edge_type.into(),
            category: category.into(),
        }
    }

    /// A semantic edge tagged with its taxonomy name.
    pub fn semantic(source: impl Into<String>, target: impl Into<String>, name: &str) -> Self {
        Self::new(source, target, name, CATEGORY_SEMANTIC)
    }

    /// A plain citation edge.
    pub fn cites(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, CITES, CATEGORY_CITATION)
    }
}

/// Nodes and edges fetched from the store at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: BTreeSet<String>,
    pub edges: Vec<SnapshotEdge>,
    /// Publication year per node, where known.
    #[serde(default)]
    pub years: HashMap<String, i32>,
}

impl GraphSnapshot {
    pub fn new(nodes: impl IntoIterator<Item = String>, edges: Vec<SnapshotEdge>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            edges,
            years: HashMap::new(),
        }
    }

    /// Build a snapshot whose node set is exactly the edge endpoints.
    pub fn from_edges(edges: Vec<SnapshotEdge>) -> Self {
        Self::new(Vec::new(), edges)
    }

    pub fn with_years(mut self, years: HashMap<String, i32>) -> Self {
        self.years = years;
        self
    }

    /// Declared nodes plus every edge endpoint.
    pub fn all_nodes(&self) -> BTreeSet<String> {
        let mut nodes = self.nodes.clone();
        for e in &self.edges {
            nodes.insert(e.source.clone());
            nodes.insert(e.target.clone());
        }
        nodes
    }
}
