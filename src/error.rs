use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("API key not configured; set the {0} environment variable")]
    MissingApiKey(&'static str),

    #[error("rate limited by {service}: {message}")]
    RateLimited {
        service: &'static str,
        message: String,
    },

    #[error("answer generation failed: {0}")]
    Answer(String),
}

impl Error {
    /// Whether the error is a transient downstream failure that the caller
    /// may retry, as opposed to a configuration problem.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}
