use std::path::Path;

use thiserror::Error;

use crate::cli::i18n::I18nError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Message(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize JSON: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("request to {endpoint} failed: {message}")]
    Http { endpoint: String, message: String },
    #[error("malformed response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Localization(#[from] I18nError),
}

impl AppError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn http(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Http {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}
