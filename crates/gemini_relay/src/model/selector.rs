//! First-available model selection over an ordered candidate list

use std::sync::Arc;

use tracing::{error, info, warn};

use super::client::{GenerativeModel, ModelProvider};
use crate::error::ModelError;

/// Models tried in order when none are configured
pub const DEFAULT_MODEL_CANDIDATES: [&str; 4] = [
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
    "gemini-1.0-pro",
];

/// One failed acquisition attempt
#[derive(Debug, Clone)]
pub struct SelectionFailure {
    pub model_name: String,
    pub error: ModelError,
}

/// Outcome of walking the candidate list
pub struct Selection {
    pub model: Option<Arc<dyn GenerativeModel>>,
    pub failures: Vec<SelectionFailure>,
}

/// Default candidates as owned strings
pub fn default_candidates() -> Vec<String> {
    DEFAULT_MODEL_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

/// Try each candidate in order and keep the first one the provider hands out.
///
/// Later candidates are not contacted once one succeeds. Every failure is
/// logged and recorded, never returned as an error.
pub async fn select_model<P>(provider: &P, candidates: &[String]) -> Selection
where
    P: ModelProvider + ?Sized,
{
    let mut failures = Vec::new();

    for model_name in candidates {
        match provider.acquire(model_name).await {
            Ok(model) => {
                info!(model = %model_name, "Successfully loaded model");
                return Selection {
                    model: Some(model),
                    failures,
                };
            }
            Err(e) => {
                warn!(model = %model_name, error = %e, "Model not available");
                failures.push(SelectionFailure {
                    model_name: model_name.clone(),
                    error: e,
                });
            }
        }
    }

    error!(
        tried = candidates.len(),
        "No available Gemini models found; they may require different API access or billing"
    );
    Selection {
        model: None,
        failures,
    }
}
