//! Selects unclassified citation pairs, classifies them and persists the
//! typed edges.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use citegraph_core::{Error, RateLimiter, RelationType, Result};
use citegraph_store::{CitationTriplet, GraphStore, SemanticRelation, TripletFilter, PROVENANCE_LLM};

use crate::classifier::RelationClassifier;
use crate::prompts::{render_extract_prompt, RETRY_INSTRUCTION};
use crate::schema::RelationshipAnalysis;

pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// What `persist` wrote and what it refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistOutcome {
    pub saved: Vec<RelationType>,
    /// Classifier labels outside the taxonomy.
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TripletOutcome {
    Classified {
        relations: Vec<RelationType>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        rejected: Vec<String>,
    },
    NoRelationship {
        reason: Option<String>,
    },
    Unclassified {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripletResult {
    pub citing_id: String,
    pub cited_id: String,
    #[serde(flatten)]
    pub outcome: TripletOutcome,
}

/// A pair whose relationships could not be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTriplet {
    pub citing_id: String,
    pub cited_id: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub total: usize,
    pub classified: usize,
    pub no_relationship: usize,
    pub unclassified: usize,
    pub relations_saved: usize,
    pub results: Vec<TripletResult>,
    pub failed: Vec<FailedTriplet>,
}

/// Drives classification of citation pairs against a graph store.
pub struct RelationExtractor {
    store: Arc<dyn GraphStore>,
    classifier: Arc<dyn RelationClassifier>,
    limiter: RateLimiter,
    max_retries: u32,
}

impl RelationExtractor {
    pub fn new(
        store: Arc<dyn GraphStore>,
        classifier: Arc<dyn RelationClassifier>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            store,
            classifier,
            limiter,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn select_unclassified_triplets(&self, filter: &TripletFilter) -> Result<Vec<CitationTriplet>> {
        self.store.fetch_unclassified_triplets(filter)
    }

    /// Classify one pair; `None` when every attempt failed.
    pub async fn classify(&self, triplet: &CitationTriplet) -> Option<RelationshipAnalysis> {
        self.try_classify(triplet).await.ok()
    }

    /// Validation failures are retried with a stricter instruction; any
    /// other failure ends the attempt. Returns the last error.
    async fn try_classify(&self, triplet: &CitationTriplet) -> Result<RelationshipAnalysis> {
        let mut prompt = render_extract_prompt(triplet);
        let attempts = self.max_retries + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.classifier.classify(&prompt).await {
                Ok(analysis) => return Ok(analysis),
                Err(Error::Validation(msg)) => {
                    warn!(
                        "Attempt {}/{} for {} -> {} returned invalid output: {}",
                        attempt, attempts, triplet.citing_id, triplet.cited_id, msg
                    );
                    if attempt >= attempts {
                        error!(
                            "All retries exhausted for {} -> {}",
                            triplet.citing_id, triplet.cited_id
                        );
                        return Err(Error::Validation(msg));
                    }
                    prompt.push_str(RETRY_INSTRUCTION);
                }
                Err(e) => {
                    error!(
                        "Classification failed for {} -> {}: {}",
                        triplet.citing_id, triplet.cited_id, e
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Write the recognised relationships of `analysis` as typed edges.
    ///
    /// Labels outside the taxonomy are never written; they come back in
    /// `rejected`.
    pub fn persist(
        &self,
        citing_id: &str,
        cited_id: &str,
        analysis: &RelationshipAnalysis,
    ) -> Result<PersistOutcome> {
        let mut outcome = PersistOutcome::default();
        let mut relations = Vec::new();

        for rel in &analysis.relationships {
            match RelationType::from_classifier_label(&rel.relation_type) {
                Some(relation) => relations.push(SemanticRelation {
                    relation,
                    confidence: rel.confidence,
                    evidence: rel.evidence.clone(),
                    explanation: rel.explanation.clone(),
                    provenance: PROVENANCE_LLM.to_string(),
                }),
                None => {
                    warn!(
                        "Rejected relationship type '{}' for {} -> {}",
                        rel.relation_type, citing_id, cited_id
                    );
                    outcome.rejected.push(rel.relation_type.clone());
                }
            }
        }

        if !relations.is_empty() {
            self.store
                .save_semantic_relationships(citing_id, cited_id, &relations)?;
        }
        outcome.saved = relations.into_iter().map(|r| r.relation).collect();
        Ok(outcome)
    }

    /// Classify and persist every pair selected by `filter`.
    ///
    /// Per-pair failures are recorded in the report; only the initial
    /// selection can fail the whole call.
    pub async fn process_all(&self, filter: &TripletFilter) -> Result<ExtractionReport> {
        let triplets = self.select_unclassified_triplets(filter)?;
        let total = triplets.len();
        info!("Found {} triplets to process", total);

        let mut report = ExtractionReport {
            total,
            ..Default::default()
        };

        for (idx, triplet) in triplets.iter().enumerate() {
            info!(
                "Processing {}/{}: {} -> {}",
                idx + 1,
                total,
                triplet.citing_id,
                triplet.cited_id
            );

            self.limiter.wait().await;
            let outcome = match self.try_classify(triplet).await {
                Ok(analysis) if analysis.relationships.is_empty() => {
                    report.no_relationship += 1;
                    TripletOutcome::NoRelationship {
                        reason: analysis.no_relationship_reason,
                    }
                }
                Ok(analysis) => match self.persist(&triplet.citing_id, &triplet.cited_id, &analysis) {
                    Ok(persisted) if persisted.saved.is_empty() => {
                        report.unclassified += 1;
                        TripletOutcome::Unclassified {
                            reason: format!(
                                "no recognised relationship type (rejected: {})",
                                persisted.rejected.join(", ")
                            ),
                        }
                    }
                    Ok(persisted) => {
                        report.classified += 1;
                        report.relations_saved += persisted.saved.len();
                        TripletOutcome::Classified {
                            relations: persisted.saved,
                            rejected: persisted.rejected,
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Failed to save relationships {} -> {}: {}",
                            triplet.citing_id, triplet.cited_id, e
                        );
                        report.failed.push(FailedTriplet {
                            citing_id: triplet.citing_id.clone(),
                            cited_id: triplet.cited_id.clone(),
                            kind: e.kind().to_string(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                },
                Err(e) => {
                    report.unclassified += 1;
                    TripletOutcome::Unclassified {
                        reason: e.to_string(),
                    }
                }
            };

            report.results.push(TripletResult {
                citing_id: triplet.citing_id.clone(),
                cited_id: triplet.cited_id.clone(),
                outcome,
            });
        }

        info!(
            "Extracted relationships for {} of {} triplets ({} relations, {} unclassified, {} failed)",
            report.classified,
            total,
            report.relations_saved,
            report.unclassified,
            report.failed.len()
        );
        Ok(report)
    }
}
