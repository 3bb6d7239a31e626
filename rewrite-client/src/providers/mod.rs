//! Rewrite provider implementations

pub mod mock;
mod ollama;
mod openai_compatible;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{Result, RewriteError};
use crate::provider::RewriteProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    OpenAI,
    OpenRouter,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            _ => Err(RewriteError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
        }
    }
}

/// Create a provider instance from a preset and optional config
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn RewriteProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;

    match kind {
        ProviderKind::Ollama => {
            let host = provider_config.and_then(|c| c.host.clone());
            Ok(Box::new(OllamaProvider::new(&preset.model, host)?))
        }
        ProviderKind::OpenAI => {
            let api_key = get_api_key(provider_config, "OPENAI_API_KEY", "OpenAI")?;
            Ok(Box::new(OpenAICompatibleProvider::openai(
                &preset.model,
                api_key,
            )?))
        }
        ProviderKind::OpenRouter => {
            let api_key = get_api_key(provider_config, "OPENROUTER_API_KEY", "OpenRouter")?;
            Ok(Box::new(OpenAICompatibleProvider::openrouter(
                &preset.model,
                api_key,
            )?))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(
    config: Option<&ProviderConfig>,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| RewriteError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}
