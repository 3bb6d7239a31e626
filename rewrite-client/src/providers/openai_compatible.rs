//! OpenAI-compatible API provider
//!
//! Used for providers that implement the OpenAI chat completions API:
//! - OpenAI itself
//! - OpenRouter
//! - And others

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewriteError};
use crate::provider::{RewriteProvider, RewriteRequest, RewriteResponse};

/// Provider for OpenAI-compatible APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: String,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(model: &str, base_url: &str, api_key: String, name: &'static str) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create an OpenAI provider
    pub fn openai(model: &str, api_key: String) -> Result<Self> {
        Self::new(model, "https://api.openai.com/v1", api_key, "OpenAI")
    }

    /// Create an OpenRouter provider
    pub fn openrouter(model: &str, api_key: String) -> Result<Self> {
        Self::new(model, "https://openrouter.ai/api/v1", api_key, "OpenRouter")
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl RewriteProvider for OpenAICompatibleProvider {
    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse> {
        let mut messages = Vec::new();

        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: request.text.clone(),
        });

        let chat_request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| RewriteError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            // Handle 503 (server overloaded) separately for retry logic
            if status.as_u16() == 503 {
                return Err(RewriteError::ServerOverloaded { message });
            }

            return Err(RewriteError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| RewriteError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(RewriteResponse {
            content,
            model: self.model.clone(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}
