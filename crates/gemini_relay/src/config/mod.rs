//! Configuration module
//!
//! This module provides:
//! - `credential`: API key lookup from the environment or a `.env` file
//! - `replies`: fixed reply texts shown to the user

pub mod credential;
pub mod replies;

pub use credential::{
    Credential, CredentialLoader, CredentialSource, API_KEY_VAR, DEFAULT_ENV_FILE,
};
pub use replies::{demo_replies, error_reply, get_reply};
