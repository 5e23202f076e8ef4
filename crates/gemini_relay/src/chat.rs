//! Chat handling: startup readiness and per-message reply mapping

use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, error, info};

use crate::config::{demo_replies, error_reply, get_reply, Credential};
use crate::error::ModelError;
use crate::model::{select_model, GenerativeModel, ModelProvider};

/// What startup resolution produced. Built once and never changed.
#[derive(Clone)]
pub enum Readiness {
    /// No API key in the environment or env file
    MissingCredential,
    /// Key present but none of the candidate models could be acquired
    NoModel,
    /// A model handle is available
    Ready {
        model_name: String,
        handle: Arc<dyn GenerativeModel>,
    },
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "MissingCredential"),
            Self::NoModel => write!(f, "NoModel"),
            Self::Ready { model_name, .. } => f
                .debug_struct("Ready")
                .field("model_name", model_name)
                .finish_non_exhaustive(),
        }
    }
}

impl Readiness {
    /// Resolve the model once at startup.
    ///
    /// `make_provider` is only called when a credential exists, so no
    /// handle can be acquired without one.
    pub async fn resolve<F, P>(
        credential: Option<&Credential>,
        candidates: &[String],
        make_provider: F,
    ) -> Self
    where
        F: FnOnce(&Credential) -> P,
        P: ModelProvider,
    {
        let Some(credential) = credential else {
            error!("API key not found in environment variables or env file");
            return Self::MissingCredential;
        };

        let provider = make_provider(credential);
        match select_model(&provider, candidates).await.model {
            Some(handle) => {
                let model_name = handle.name().to_string();
                info!(model = %model_name, key = %credential.masked(), "Gemini API configured");
                Self::Ready { model_name, handle }
            }
            None => Self::NoModel,
        }
    }

    /// Name of the selected model, if any
    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::Ready { model_name, .. } => Some(model_name),
            _ => None,
        }
    }
}

/// Turns user messages into replies. Never fails: every problem becomes
/// reply text.
#[derive(Debug, Clone)]
pub struct ChatService {
    readiness: Readiness,
    demo_fallback: bool,
}

impl ChatService {
    pub fn new(readiness: Readiness) -> Self {
        Self {
            readiness,
            demo_fallback: true,
        }
    }

    /// Answer model-unavailable failures with demo replies (on by default)
    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    /// Produce the reply for one message
    pub async fn respond(&self, message: &str) -> String {
        if message.trim().is_empty() {
            return get_reply("empty_input").to_string();
        }

        let (model_name, handle) = match &self.readiness {
            Readiness::MissingCredential => return get_reply("missing_api_key").to_string(),
            Readiness::NoModel => return get_reply("no_models").to_string(),
            Readiness::Ready { model_name, handle } => (model_name, handle),
        };

        match handle.generate(message).await {
            Ok(text) => {
                let reply = text.trim();
                if reply.is_empty() {
                    debug!(model = %model_name, "Model returned an empty reply");
                    get_reply("empty_response").to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(e) => {
                error!(model = %model_name, error = %e, "Google API error");
                self.failure_reply(&e, message)
            }
        }
    }

    fn failure_reply(&self, err: &ModelError, message: &str) -> String {
        match err {
            ModelError::Authentication(_) => get_reply("invalid_api_key").to_string(),
            ModelError::Quota(_) => get_reply("quota_exceeded").to_string(),
            ModelError::ModelUnavailable(_) if self.demo_fallback => pick_demo_reply(message),
            ModelError::ModelUnavailable(detail) | ModelError::Other(detail) => {
                error_reply(detail)
            }
        }
    }
}

fn pick_demo_reply(message: &str) -> String {
    demo_replies(message)
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}
