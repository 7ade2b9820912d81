//! CiteGraph Core — shared paper records, relationship taxonomy,
//! configuration, errors and request pacing.

pub mod config;
pub mod error;
pub mod paper;
pub mod rate_limit;
pub mod snapshot;
pub mod taxonomy;

pub use config::CitegraphConfig;
pub use error::{Error, Result};
pub use paper::*;
pub use rate_limit::RateLimiter;
pub use snapshot::{GraphSnapshot, SnapshotEdge};
pub use taxonomy::{BenefitGroup, Confidence, RelationType};
