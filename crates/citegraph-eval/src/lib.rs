//! CiteGraph Eval — structural and heuristic quality metrics computed
//! from a graph snapshot, without ground truth.

pub mod evaluator;
pub mod report;

pub use evaluator::QualityEvaluator;
pub use report::*;
