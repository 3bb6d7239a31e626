use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("malformed document tree: {0}")]
    MalformedTree(String),

    #[error("structural markup parser failed: {0}")]
    Parser(String),

    #[error("invalid pronunciation entry '{term}': {source}")]
    Pronunciation {
        term: String,
        source: regex::Error,
    },

    #[error("rewriter setup failed: {0}")]
    Rewriter(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
