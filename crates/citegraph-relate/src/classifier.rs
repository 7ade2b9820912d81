//! The relation-classification boundary.

use std::sync::Arc;

use async_trait::async_trait;

use citegraph_core::Result;
use citegraph_llm::{StructuredClient, StructuredClientFactory};

use crate::prompts::SYSTEM_PROMPT;
use crate::schema::{output_schema, RelationshipAnalysis};

/// Classifies one rendered prompt into a [`RelationshipAnalysis`].
///
/// Schema-invalid replies must be `Error::Validation` so the caller can
/// retry; any other error ends the attempt.
#[async_trait]
pub trait RelationClassifier: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<RelationshipAnalysis>;
}

/// Classifier backed by a structured language-model client.
pub struct LlmRelationClassifier {
    client: Arc<StructuredClient>,
}

impl LlmRelationClassifier {
    pub fn new(factory: &StructuredClientFactory) -> Self {
        Self {
            client: factory.client_for(output_schema()),
        }
    }
}

#[async_trait]
impl RelationClassifier for LlmRelationClassifier {
    async fn classify(&self, prompt: &str) -> Result<RelationshipAnalysis> {
        let analysis: RelationshipAnalysis = self.client.generate(SYSTEM_PROMPT, prompt).await?;
        analysis.validate()?;
        Ok(analysis)
    }
}
