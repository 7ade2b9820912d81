//! LLM provider selection from environment variables.

use serde::{Deserialize, Serialize};

use citegraph_core::{Error, Result};

use crate::types::{LlmProvider, ResolvedProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// Keys, models and sampling settings for the classifier's language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `auto`, `openai`, `anthropic` or `groq`.
    pub preferred_provider: String,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub groq_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    pub groq_model: String,
    /// Overrides the per-provider model when set.
    pub model_override: Option<String>,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
            groq_model: DEFAULT_GROQ_MODEL.into(),
            model_override: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(p) = get("CITEGRAPH_LLM_PROVIDER") {
            let p = p.trim().to_ascii_lowercase();
            if !matches!(p.as_str(), "auto" | "openai" | "anthropic" | "groq") {
                return Err(Error::Config(format!(
                    "CITEGRAPH_LLM_PROVIDER must be auto, openai, anthropic or groq, got '{}'",
                    p
                )));
            }
            config.preferred_provider = p;
        }
        config.openai_api_key = get("OPENAI_API_KEY");
        config.anthropic_api_key = get("ANTHROPIC_API_KEY");
        config.groq_api_key = get("GROQ_API_KEY");
        config.model_override = get("CITEGRAPH_LLM_MODEL");

        Ok(config)
    }

    /// Resolve which provider and model to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let pick = |provider: LlmProvider, model: &str, key: &Option<String>| -> Option<ResolvedProvider> {
            key.as_ref().map(|k| ResolvedProvider {
                provider,
                model: self.model_override.clone().unwrap_or_else(|| model.to_string()),
                api_key: k.clone(),
            })
        };
        let openai = || pick(LlmProvider::OpenAI, &self.openai_model, &self.openai_api_key);
        let anthropic = || pick(LlmProvider::Anthropic, &self.anthropic_model, &self.anthropic_api_key);
        let groq = || pick(LlmProvider::Groq, &self.groq_model, &self.groq_api_key);

        match self.preferred_provider.as_str() {
            "openai" => openai(),
            "anthropic" => anthropic(),
            "groq" => groq(),
            // Auto mode: Anthropic > Groq > OpenAI
            "auto" => anthropic().or_else(groq).or_else(openai),
            _ => None,
        }
    }

    /// Like `resolve_provider`, but a missing key is a configuration error.
    pub fn require_provider(&self) -> Result<ResolvedProvider> {
        self.resolve_provider().ok_or_else(|| {
            Error::Config(format!(
                "no API key for LLM provider '{}' (set GROQ_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY)",
                self.preferred_provider
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k| pairs.iter().find(|(key, _)| *key == k).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_auto_prefers_anthropic_then_groq() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "g"),
            ("OPENAI_API_KEY", "o"),
        ]))
        .unwrap();
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LlmProvider::Groq);
        assert_eq!(resolved.model, DEFAULT_GROQ_MODEL);

        let config = LlmConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "g"),
            ("ANTHROPIC_API_KEY", "a"),
        ]))
        .unwrap();
        assert_eq!(config.resolve_provider().unwrap().provider, LlmProvider::Anthropic);
    }

    #[test]
    fn test_explicit_provider_and_model_override() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("CITEGRAPH_LLM_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "o"),
            ("GROQ_API_KEY", "g"),
            ("CITEGRAPH_LLM_MODEL", "gpt-4o"),
        ]))
        .unwrap();
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LlmProvider::OpenAI);
        assert_eq!(resolved.model, "gpt-4o");
        assert_eq!(resolved.api_key, "o");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig::from_lookup(lookup(&[("CITEGRAPH_LLM_PROVIDER", "groq")])).unwrap();
        assert!(matches!(config.require_provider(), Err(Error::Config(_))));

        let err = LlmConfig::from_lookup(lookup(&[("CITEGRAPH_LLM_PROVIDER", "cohere")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
