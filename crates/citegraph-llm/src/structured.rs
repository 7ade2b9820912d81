//! Schema-bound structured output on top of [`LlmClient`].
//!
//! The schema is sent with the system prompt and the reply is parsed into
//! the target type. Any reply that fails to parse is `Error::Validation`,
//! which callers may retry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use citegraph_core::{Error, Result};

use crate::providers::LlmClient;
use crate::types::ChatMessage;

/// A named JSON schema describing the expected reply.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: String,
    pub json_schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, json_schema: Value) -> Self {
        Self {
            name: name.into(),
            json_schema,
        }
    }
}

/// Generates replies that must deserialize into a schema-shaped type.
pub struct StructuredClient {
    llm: Arc<LlmClient>,
    schema: OutputSchema,
}

impl StructuredClient {
    pub fn new(llm: Arc<LlmClient>, schema: OutputSchema) -> Self {
        Self { llm, schema }
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    /// Ask for a reply to `user` under `system` and parse it as `T`.
    pub async fn generate<T: DeserializeOwned>(&self, system: &str, user: &str) -> Result<T> {
        let system = format!(
            "{}\n\nRespond with a single JSON object that conforms to this JSON schema ({}):\n{}",
            system, self.schema.name, self.schema.json_schema
        );
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let reply = self.llm.complete(&messages, true).await?;
        debug!("Structured reply for {}: {} chars", self.schema.name, reply.len());
        parse_reply(&reply)
    }
}

/// Parse a model reply, tolerating code fences and surrounding prose.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let trimmed = reply.trim();
    let body = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => {
            return Err(Error::Validation(format!(
                "reply contains no JSON object: {}",
                truncate(trimmed, 200)
            )))
        }
    };
    serde_json::from_str(body).map_err(|e| Error::Validation(format!("reply does not match schema: {}", e)))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Builds one [`StructuredClient`] per schema name and reuses it.
pub struct StructuredClientFactory {
    llm: Arc<LlmClient>,
    clients: Mutex<HashMap<String, Arc<StructuredClient>>>,
}

impl StructuredClientFactory {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self {
            llm,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// The cached client for `schema.name`, created on first use.
    pub fn client_for(&self, schema: OutputSchema) -> Arc<StructuredClient> {
        let mut clients = self.clients.lock();
        clients
            .entry(schema.name.clone())
            .or_insert_with(|| {
                info!(
                    "Creating structured client for {} ({} / {})",
                    schema.name,
                    self.llm.provider(),
                    self.llm.model()
                );
                Arc::new(StructuredClient::new(self.llm.clone(), schema))
            })
            .clone()
    }

    pub fn cached(&self) -> usize {
        self.clients.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LlmProvider, ResolvedProvider};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Reply {
        answer: String,
    }

    fn llm() -> Arc<LlmClient> {
        let resolved = ResolvedProvider {
            provider: LlmProvider::Groq,
            model: "test-model".into(),
            api_key: "key".into(),
        };
        Arc::new(LlmClient::new(resolved, 0.0, 16).unwrap())
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"answer\": \"yes\"}\n```";
        let parsed: Reply = parse_reply(reply).unwrap();
        assert_eq!(parsed.answer, "yes");
    }

    #[test]
    fn test_invalid_reply_is_validation_error() {
        assert!(matches!(parse_reply::<Reply>("no json here"), Err(Error::Validation(_))));
        assert!(matches!(parse_reply::<Reply>("{\"other\": 1}"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_factory_caches_per_schema_name() {
        let factory = StructuredClientFactory::new(llm());
        let a = factory.client_for(OutputSchema::new("A", json!({"type": "object"})));
        let again = factory.client_for(OutputSchema::new("A", json!({"type": "object"})));
        let b = factory.client_for(OutputSchema::new("B", json!({"type": "object"})));
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cached(), 2);
    }
}
