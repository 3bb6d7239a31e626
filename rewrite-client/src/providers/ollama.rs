//! Ollama provider for local model inference
//!
//! Talks to a local (or LAN) Ollama daemon via its /api/generate endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewriteError};
use crate::provider::{RewriteProvider, RewriteRequest, RewriteResponse};

/// Default Ollama host when none is configured.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Provider backed by a local Ollama daemon
pub struct OllamaProvider {
    model: String,
    host: String,
    client: Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(model: &str, host: Option<String>) -> Result<Self> {
        let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Self {
            model: model.to_string(),
            host: host.trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    model: Option<String>,
}

#[async_trait]
impl RewriteProvider for OllamaProvider {
    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse> {
        // Ollama's generate endpoint has no separate system role; fold the
        // system prompt into the prompt text.
        let prompt = match &request.system_prompt {
            Some(system) => format!("{}\n\n{}", system, request.text),
            None => request.text.clone(),
        };

        let generate_request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.host);

        let response = self
            .client
            .post(&url)
            .json(&generate_request)
            .send()
            .await
            .map_err(|e| RewriteError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();

            if status.as_u16() == 503 {
                return Err(RewriteError::ServerOverloaded { message });
            }

            return Err(RewriteError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let generate_response: GenerateResponse =
            response.json().await.map_err(|e| RewriteError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        Ok(RewriteResponse {
            content: generate_response.response,
            model: generate_response.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    fn name(&self) -> &'static str {
        "Ollama"
    }

    fn is_available(&self) -> Result<()> {
        // No key required; the daemon is assumed reachable at the configured host
        Ok(())
    }
}
