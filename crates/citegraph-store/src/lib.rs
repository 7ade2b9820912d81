//! CiteGraph Store — papers, authors, venues and their relationships as a
//! property graph with idempotent upserts.

pub mod graph;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use graph::GraphStore;
pub use sqlite::SqliteGraphStore;
pub use types::*;
