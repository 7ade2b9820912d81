//! CiteGraph Source — the bibliographic API boundary and its
//! Semantic Scholar implementation.

pub mod semantic_scholar;
pub mod source;

pub use semantic_scholar::SemanticScholarClient;
pub use source::{ExternalSource, PageRequest};
