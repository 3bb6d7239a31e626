//! md-annotate configuration management.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::optimize::DEFAULT_LONG_SENTENCE_CHARS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Math processing (auto-wrapping + transduction)
    #[serde(default)]
    pub math: MathSettings,

    /// Citation naturalization
    #[serde(default)]
    pub citations: CitationSettings,

    /// Pronunciation dictionary sources
    #[serde(default)]
    pub pronunciation: PronunciationSettings,

    /// Optional whole-buffer rewrite pass
    #[serde(default)]
    pub rewrite: RewriteSettings,

    /// Sentence-level optimization
    #[serde(default)]
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PronunciationSettings {
    /// Inline terms grouped by domain: `[pronunciation.terms.physics]`
    #[serde(default)]
    pub terms: BTreeMap<String, BTreeMap<String, String>>,

    /// Optional external TOML dictionary of term = "pronunciation" pairs
    #[serde(default)]
    pub dictionary_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteSettings {
    /// Run the generative rewrite pass over the finished buffer
    #[serde(default)]
    pub enabled: bool,

    /// Rewrite-client preset name; the client default applies when unset
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Sentences longer than this get pause markers before connectives
    #[serde(default = "default_long_sentence_chars")]
    pub long_sentence_chars: usize,
}

fn default_true() -> bool {
    true
}

fn default_long_sentence_chars() -> usize {
    DEFAULT_LONG_SENTENCE_CHARS
}

impl Default for MathSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for CitationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            long_sentence_chars: DEFAULT_LONG_SENTENCE_CHARS,
        }
    }
}

impl AnnotateConfig {
    /// Get the config file path: ~/.config/cli-programs/md-annotate.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| crate::error::EnhanceError::Config("HOME not set".into()))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("md-annotate.toml"))
    }

    /// Load config from the default location, returning defaults if the
    /// file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AnnotateConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge the inline per-domain terms with the external dictionary file,
    /// if one is configured and present.
    pub fn pronunciation_terms(&self) -> Result<BTreeMap<String, String>> {
        let mut terms = BTreeMap::new();

        for domain_terms in self.pronunciation.terms.values() {
            terms.extend(domain_terms.clone());
        }

        if let Some(path) = &self.pronunciation.dictionary_file {
            if path.exists() {
                let content = fs::read_to_string(path)?;
                let external: BTreeMap<String, String> = toml::from_str(&content)?;
                terms.extend(external);
            }
        }

        Ok(terms)
    }
}
