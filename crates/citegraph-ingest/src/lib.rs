//! CiteGraph Ingest — PDF text reading, reference-section splitting and
//! bibliography entry parsing.

pub mod pdf;
pub mod pipeline;
pub mod references;

pub use pdf::{LopdfReader, PdfReader};
pub use pipeline::extract_references;
pub use references::{parse_reference, ReferenceExtractor, ReferencePattern};
