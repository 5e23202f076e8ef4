//! Model access for remote inference
//!
//! This module provides:
//! - `client`: model traits and the Gemini OpenAI-compatible client
//! - `selector`: first-available selection over candidate model names

mod client;
mod selector;

pub use client::{
    GeminiModel, GeminiProvider, GenerativeModel, ModelConfig, ModelProvider, DEFAULT_BASE_URL,
};
pub use selector::{
    default_candidates, select_model, Selection, SelectionFailure, DEFAULT_MODEL_CANDIDATES,
};
