//! Error types for credential loading and remote model calls

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a remote model call, already sorted into the categories the
/// chat endpoint knows how to answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Sort a provider error message into a category.
    ///
    /// Matching is done on the lowercased text and the first rule that hits
    /// wins: authentication, then quota, then model availability.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("api_key") || lower.contains("authentication") {
            Self::Authentication(message)
        } else if lower.contains("quota") || lower.contains("limit") {
            Self::Quota(message)
        } else if lower.contains("model") || lower.contains("not found") {
            Self::ModelUnavailable(message)
        } else {
            Self::Other(message)
        }
    }

    /// The provider's original message
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication(m) | Self::Quota(m) | Self::ModelUnavailable(m) | Self::Other(m) => {
                m
            }
        }
    }
}

/// Failure while reading the key-value env file.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
