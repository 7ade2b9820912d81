//! Non-streaming chat completions.
//!
//! OpenAI and Groq share the OpenAI wire format. Anthropic uses the
//! Messages API with the system prompt carried separately.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use citegraph_core::{Error, Result};

use crate::config::LlmConfig;
use crate::types::{ChatMessage, LlmProvider, ResolvedProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A configured chat-completion client for one provider and model.
pub struct LlmClient {
    client: Client,
    resolved: ResolvedProvider,
    temperature: f64,
    max_tokens: usize,
}

impl LlmClient {
    pub fn new(resolved: ResolvedProvider, temperature: f64, max_tokens: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Classification(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            resolved,
            temperature,
            max_tokens,
        })
    }

    /// Build from configuration; a missing API key is `Error::Config`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(config.require_provider()?, config.temperature, config.max_tokens)
    }

    pub fn provider(&self) -> LlmProvider {
        self.resolved.provider
    }

    pub fn model(&self) -> &str {
        &self.resolved.model
    }

    /// Send `messages` and return the assistant text.
    ///
    /// With `json_mode`, OpenAI-compatible providers are asked for a JSON object.
    pub async fn complete(&self, messages: &[ChatMessage], json_mode: bool) -> Result<String> {
        match self.resolved.provider {
            LlmProvider::OpenAI | LlmProvider::Groq => self.complete_openai_compat(messages, json_mode).await,
            LlmProvider::Anthropic => self.complete_anthropic(messages).await,
        }
    }

    async fn complete_openai_compat(&self, messages: &[ChatMessage], json_mode: bool) -> Result<String> {
        let url = self.resolved.provider.endpoint();
        let mut body = json!({
            "model": self.resolved.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        debug!("Completing via {} with model {}", url, self.resolved.model);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.resolved.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Classification(format!("Request failed: {}", e)))?;

        let parsed = Self::read_body(response).await?;
        openai_content(&parsed)
    }

    async fn complete_anthropic(&self, messages: &[ChatMessage]) -> Result<String> {
        let system_msg: Option<&str> = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str());
        let conv_msgs: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();

        let mut body = json!({
            "model": self.resolved.model,
            "messages": conv_msgs,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        if let Some(sys) = system_msg {
            body["system"] = json!(sys);
        }

        debug!("Completing via Anthropic with model {}", self.resolved.model);
        let response = self
            .client
            .post(LlmProvider::Anthropic.endpoint())
            .header("x-api-key", &self.resolved.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Classification(format!("Request failed: {}", e)))?;

        let parsed = Self::read_body(response).await?;
        anthropic_content(&parsed)
    }

    async fn read_body(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("LLM API error {}: {}", status, body);
            return Err(Error::Classification(format!("API error {}: {}", status, body)));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Classification(format!("Unreadable API response: {}", e)))
    }
}

fn openai_content(parsed: &Value) -> Result<String> {
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Classification("response has no message content".into()))
}

fn anthropic_content(parsed: &Value) -> Result<String> {
    let text: String = parsed["content"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect();
    if text.is_empty() {
        return Err(Error::Classification("response has no text content".into()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_content() {
        let parsed = json!({"choices": [{"message": {"role": "assistant", "content": "{\"a\": 1}"}}]});
        assert_eq!(openai_content(&parsed).unwrap(), "{\"a\": 1}");
        assert!(matches!(openai_content(&json!({"choices": []})), Err(Error::Classification(_))));
    }

    #[test]
    fn test_anthropic_content_joins_text_blocks() {
        let parsed = json!({"content": [
            {"type": "text", "text": "{\"relationships\":"},
            {"type": "text", "text": " []}"}
        ]});
        assert_eq!(anthropic_content(&parsed).unwrap(), "{\"relationships\": []}");
        assert!(anthropic_content(&json!({"content": []})).is_err());
    }
}
