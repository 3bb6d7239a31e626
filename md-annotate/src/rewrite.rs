//! Optional whole-buffer rewriting capability.
//!
//! The rewriter is an opaque collaborator with no length guarantee, so the
//! outcome is explicit: `Rewritten` means every previously recorded offset
//! is now approximate; `Unchanged` means offsets are still exact. Failure
//! degrades to `Unchanged` rather than aborting the document.

use std::time::Duration;

use log::warn;
use rewrite_client::{Config, RewriteProvider, RewriteRequest, get_provider};

use crate::error::{EnhanceError, Result};

/// Instruction given to the rewriting model.
const SYSTEM_PROMPT: &str = "You are an expert at optimizing academic text for text-to-speech \
     conversion. Make text more natural for spoken delivery while preserving all technical \
     accuracy.";

/// How long to wait for the collaborator before skipping the pass.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Result of a rewrite attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The buffer was replaced; recorded offsets are now approximations.
    Rewritten(String),
    /// Nothing changed; every offset is still exact.
    Unchanged,
}

/// A whole-buffer rewriting collaborator.
pub trait Rewriter {
    fn rewrite(&self, content: &str) -> RewriteOutcome;
}

/// LLM-backed rewriter bridging the async provider client into the
/// synchronous pipeline. The runtime is owned here; the call blocks, per the
/// pipeline's single-threaded model.
pub struct LlmRewriter {
    provider: Box<dyn RewriteProvider>,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
}

impl LlmRewriter {
    pub fn new(provider: Box<dyn RewriteProvider>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EnhanceError::Rewriter(format!("failed to start runtime: {}", e)))?;

        Ok(Self {
            provider,
            runtime,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Build a rewriter from the shared client configuration.
    pub fn from_config(preset: Option<&str>) -> Result<Self> {
        let config = Config::load().map_err(|e| EnhanceError::Rewriter(e.to_string()))?;
        let preset_name = preset.unwrap_or(&config.default_preset);
        let preset = config
            .get_preset(preset_name)
            .map_err(|e| EnhanceError::Rewriter(e.to_string()))?;
        let provider = get_provider(preset, config.get_provider_config(&preset.provider))
            .map_err(|e| EnhanceError::Rewriter(e.to_string()))?;

        Self::new(provider)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Rewriter for LlmRewriter {
    fn rewrite(&self, content: &str) -> RewriteOutcome {
        let request = RewriteRequest {
            text: format!("Optimize this text for audiobook narration:\n\n{}", content),
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: None,
            temperature: None,
        };

        let response = self.runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.provider.rewrite(request)).await
        });

        match response {
            Ok(Ok(response)) if !response.content.trim().is_empty() => {
                RewriteOutcome::Rewritten(response.content)
            }
            Ok(Ok(_)) => {
                warn!("{} returned an empty rewrite, skipping", self.provider.name());
                RewriteOutcome::Unchanged
            }
            Ok(Err(e)) => {
                warn!("rewrite via {} failed, skipping: {}", self.provider.name(), e);
                RewriteOutcome::Unchanged
            }
            Err(_) => {
                warn!(
                    "rewrite via {} timed out after {:?}, skipping",
                    self.provider.name(),
                    self.timeout
                );
                RewriteOutcome::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewrite_client::{MockProvider, RewriteError};

    #[test]
    fn test_successful_rewrite() {
        let rewriter =
            LlmRewriter::new(Box::new(MockProvider::always_succeeds("smoother text"))).unwrap();
        assert_eq!(
            rewriter.rewrite("rough text"),
            RewriteOutcome::Rewritten("smoother text".to_string())
        );
    }

    #[test]
    fn test_provider_failure_degrades_to_unchanged() {
        let rewriter = LlmRewriter::new(Box::new(MockProvider::always_fails(
            RewriteError::ServerOverloaded {
                message: "busy".to_string(),
            },
        )))
        .unwrap();
        assert_eq!(rewriter.rewrite("text"), RewriteOutcome::Unchanged);
    }

    #[test]
    fn test_empty_response_degrades_to_unchanged() {
        let rewriter = LlmRewriter::new(Box::new(MockProvider::always_succeeds("   "))).unwrap();
        assert_eq!(rewriter.rewrite("text"), RewriteOutcome::Unchanged);
    }
}
