use async_trait::async_trait;

/// One system instruction plus one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no response from AI")]
    Empty,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Free-text completion for `request`. An empty answer is an error.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}
