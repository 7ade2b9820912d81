//! CiteGraph Relate — classifies citing → cited pairs into the semantic
//! relationship taxonomy and persists the typed edges.

pub mod classifier;
pub mod extractor;
pub mod prompts;
pub mod schema;

pub use classifier::{LlmRelationClassifier, RelationClassifier};
pub use extractor::{
    ExtractionReport, FailedTriplet, PersistOutcome, RelationExtractor, TripletOutcome, TripletResult,
};
pub use schema::{Relationship, RelationshipAnalysis};
