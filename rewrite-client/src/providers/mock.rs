//! Mock rewrite provider for testing
//!
//! Provides a configurable mock provider that can simulate various behaviors
//! like failures, retries, and successful responses.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, RewriteError};
use crate::provider::{RewriteProvider, RewriteRequest, RewriteResponse};

/// A mock provider for testing retry and fallback behavior
pub struct MockProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<RewriteError>>,
    /// Response content to return on success
    success_response: String,
    /// Provider name for display
    name: &'static str,
}

impl MockProvider {
    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: RewriteError, response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            success_response: response.to_string(),
            name: "mock",
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: RewriteError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            success_response: String::new(),
            name: "mock",
        }
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            success_response: response.to_string(),
            name: "mock",
        }
    }

    /// Get the number of times rewrite() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Set a custom provider name (useful for testing fallback scenarios)
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl RewriteProvider for MockProvider {
    async fn rewrite(&self, _request: RewriteRequest) -> Result<RewriteResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let fail_count = self.fail_count.load(Ordering::SeqCst);

        if call_num < fail_count {
            // Should fail on this call
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        // Success
        Ok(RewriteResponse {
            content: self.success_response.clone(),
            model: "mock-model".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a RewriteError (needed because RewriteError doesn't implement Clone)
fn clone_error(err: &RewriteError) -> RewriteError {
    match err {
        RewriteError::ServerOverloaded { message } => RewriteError::ServerOverloaded {
            message: message.clone(),
        },
        RewriteError::MissingApiKey { provider, env_var } => RewriteError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        RewriteError::RateLimited { retry_after } => RewriteError::RateLimited {
            retry_after: *retry_after,
        },
        RewriteError::ApiError {
            message,
            status_code,
        } => RewriteError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        RewriteError::ProviderUnavailable(s) => RewriteError::ProviderUnavailable(s.clone()),
        RewriteError::ConfigError(s) => RewriteError::ConfigError(s.clone()),
        RewriteError::InvalidPreset(s) => RewriteError::InvalidPreset(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        RewriteError::Io(_) => RewriteError::ConfigError("IO error (mock)".to_string()),
        RewriteError::TomlParse(_) => {
            RewriteError::ConfigError("TOML parse error (mock)".to_string())
        }
        RewriteError::TomlSerialize(_) => {
            RewriteError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RewriteRequest {
        RewriteRequest {
            text: "test".to_string(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds("success");

        let result = provider.rewrite(request()).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().content, "success");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(RewriteError::ServerOverloaded {
            message: "overloaded".to_string(),
        });

        for _ in 0..3 {
            let result = provider.rewrite(request()).await;
            assert!(result.is_err());
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let provider = MockProvider::fails_then_succeeds(
            2,
            RewriteError::ServerOverloaded {
                message: "overloaded".to_string(),
            },
            "success",
        );

        // First two calls fail
        assert!(provider.rewrite(request()).await.is_err());
        assert!(provider.rewrite(request()).await.is_err());

        // Third call succeeds
        let result = provider.rewrite(request()).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().content, "success");
        assert_eq!(provider.call_count(), 3);
    }
}
