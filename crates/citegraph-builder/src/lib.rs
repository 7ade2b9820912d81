//! CiteGraph Builder — resolves a seed paper and its references against
//! the bibliographic source, writes them to the graph store and expands
//! one hop of citing papers.

pub mod builder;
pub mod types;

pub use builder::GraphBuilder;
pub use types::*;
