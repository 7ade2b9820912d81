//! CiteGraph LLM — chat-completion client for OpenAI, Anthropic and Groq,
//! plus a schema-bound structured-output layer.

pub mod config;
pub mod providers;
pub mod structured;
pub mod types;

pub use config::LlmConfig;
pub use providers::LlmClient;
pub use structured::{OutputSchema, StructuredClient, StructuredClientFactory};
pub use types::{ChatMessage, LlmProvider, ResolvedProvider};
