//! gemini_relay: a thin web chat relay in front of the Gemini API
//!
//! This library provides:
//! - API key lookup from the environment or a local `.env` file
//! - First-available model selection over an ordered list of model names
//! - A chat service mapping every failure to a user-facing reply
//! - An axum router exposing the chat page and `POST /ask`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gemini_relay::{
//!     default_candidates, ChatService, CredentialLoader, GeminiProvider, ModelConfig, Readiness,
//! };
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let credential = CredentialLoader::new().load().map(|(key, _)| key);
//!     let readiness = Readiness::resolve(credential.as_ref(), &default_candidates(), |key| {
//!         GeminiProvider::new(&ModelConfig::new(key.clone()))
//!     })
//!     .await;
//!
//!     let service = Arc::new(ChatService::new(readiness));
//!     gemini_relay::server::serve(([127, 0, 0, 1], 5000).into(), service).await
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Core functionality
pub mod chat;
pub mod logging;
pub mod model;
pub mod server;

// Re-export commonly used types and functions
pub use error::{CredentialError, ModelError, Result};

// Config re-exports
pub use config::{
    demo_replies, get_reply, Credential, CredentialLoader, CredentialSource, API_KEY_VAR,
    DEFAULT_ENV_FILE,
};

// Model re-exports
pub use model::{
    default_candidates, select_model, GeminiProvider, GenerativeModel, ModelConfig, ModelProvider,
    Selection, SelectionFailure, DEFAULT_BASE_URL, DEFAULT_MODEL_CANDIDATES,
};

// Chat re-exports
pub use chat::{ChatService, Readiness};

// Server re-exports
pub use server::{router, AskRequest, AskResponse};
