//! Completion Adapter: prompt assembly over a tenant's knowledge base, an
//! OpenAI-compatible HTTP provider, and fallback handling that never lets a
//! provider failure reach the caller.

pub mod assistant;
pub mod openai;
pub mod provider;

pub use assistant::{AiResponse, Assistant, ConversationAnalysis, Outcome, Sentiment};
pub use openai::OpenAiProvider;
pub use provider::{CompletionProvider, CompletionRequest, ProviderError};
