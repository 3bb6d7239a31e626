use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a rewriting provider
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub text: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Response from a rewriting provider
#[derive(Debug, Clone)]
pub struct RewriteResponse {
    pub content: String,
    pub model: String,
}

/// Trait for text-rewriting providers
#[async_trait]
pub trait RewriteProvider: Send + Sync {
    /// Execute a rewrite request
    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is available (API key set, host reachable config, etc.)
    fn is_available(&self) -> Result<()>;
}
