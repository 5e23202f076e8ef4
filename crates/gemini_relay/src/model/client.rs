//! Gemini model client for the OpenAI-compatible API

use std::sync::Arc;

use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Credential;
use crate::error::{ModelError, Result};

/// OpenAI-compatible endpoint of the Gemini API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A resolved model that can answer a single prompt.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier this handle talks to
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw text of the first choice
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Hands out model handles by name.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Try to obtain a usable handle for `model_name`
    async fn acquire(&self, model_name: &str) -> Result<Arc<dyn GenerativeModel>>;
}

/// Connection settings for the remote API
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Credential,
}

impl ModelConfig {
    pub fn new(api_key: Credential) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// `GET /models/{name}` response, reduced to what is logged
#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
    #[serde(default)]
    owned_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Provider backed by the Gemini OpenAI-compatible endpoint
#[derive(Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    base_url: String,
    api_key: Credential,
}

impl GeminiProvider {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn handle(&self, model_name: &str) -> GeminiModel {
        GeminiModel {
            name: model_name.to_string(),
            provider: self.clone(),
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn acquire(&self, model_name: &str) -> Result<Arc<dyn GenerativeModel>> {
        let url = format!("{}/models/{}", self.base_url, model_name);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose())
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        let info: ModelInfo = serde_json::from_str(&body)
            .map_err(|e| ModelError::Other(format!("Invalid model metadata: {}", e)))?;
        debug!(model = %info.id, owned_by = ?info.owned_by, "Model metadata retrieved");

        Ok(Arc::new(self.handle(model_name)))
    }
}

/// Handle to one Gemini model
pub struct GeminiModel {
    name: String,
    provider: GeminiProvider,
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.name)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| ModelError::Other(e.to_string()))?
                .into()])
            .build()
            .map_err(|e| ModelError::Other(e.to_string()))?;

        let url = format!("{}/chat/completions", self.provider.base_url);
        let response = self
            .provider
            .http
            .post(&url)
            .bearer_auth(self.provider.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::Other(format!("Invalid response body: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Body text of a successful response, or the classified failure
async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(classify_http_error(status, &text))
    }
}

fn transport_error(err: reqwest::Error) -> ModelError {
    // the URL contains "models/..." and would skew the text rules
    ModelError::classify(err.without_url().to_string())
}

/// `error` object of a provider error body
struct ProviderError {
    message: Option<String>,
    kinds: Vec<String>,
}

/// Read `{"error": {...}}` or Gemini's `[{"error": {...}}]`
fn parse_provider_error(body: &str) -> Option<ProviderError> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = match &value {
        Value::Array(items) => items.first()?.get("error")?,
        other => other.get("error")?,
    };

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    let kinds = ["status", "type", "code"]
        .iter()
        .filter_map(|field| error.get(*field).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    Some(ProviderError { message, kinds })
}

/// Map a failed HTTP response onto a [`ModelError`] category.
///
/// Status and structured error fields are consulted first; the message text
/// decides otherwise.
fn classify_http_error(status: StatusCode, body: &str) -> ModelError {
    let parsed = parse_provider_error(body);
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let detail = if message.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, message)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return ModelError::Authentication(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => return ModelError::Quota(detail),
        _ => {}
    }

    if let Some(err) = parsed
        .iter()
        .flat_map(|e| e.kinds.iter())
        .find_map(|kind| classify_error_type(kind, &detail))
    {
        return err;
    }

    // Gemini reports a bad key as 400 "API key not valid"
    if message.to_lowercase().contains("api key") {
        return ModelError::Authentication(detail);
    }
    if status == StatusCode::NOT_FOUND {
        return ModelError::ModelUnavailable(detail);
    }

    ModelError::classify(detail)
}

/// Category for a provider error `status`/`type`/`code` string, if it is a known one
fn classify_error_type(kind: &str, detail: &str) -> Option<ModelError> {
    let detail = detail.to_string();
    match kind.to_lowercase().as_str() {
        "unauthenticated" | "permission_denied" | "invalid_api_key" | "authentication_error" => {
            Some(ModelError::Authentication(detail))
        }
        "resource_exhausted" | "rate_limit_exceeded" | "insufficient_quota" => {
            Some(ModelError::Quota(detail))
        }
        "not_found" | "model_not_found" => Some(ModelError::ModelUnavailable(detail)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatService, Readiness};
    use axum::{
        http::{HeaderMap, StatusCode as HttpStatus},
        routing::post,
        Json, Router,
    };
    use std::sync::Mutex;

    const CHAT_BODY: &str = r#"{"id":"chatcmpl-1","object":"chat.completion","created":1,"model":"gemini-1.5-flash","choices":[{"index":0,"message":{"role":"assistant","content":" Paris \n"},"finish_reason":"stop"}]}"#;

    /// Serve `app` on an ephemeral port and return its base URL
    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    /// Server answering every request with the same status and body
    async fn fixed_server(status: HttpStatus, body: &'static str) -> GeminiProvider {
        let base_url = spawn(Router::new().fallback(move || async move { (status, body) })).await;
        client_for(&base_url)
    }

    fn client_for(base_url: &str) -> GeminiProvider {
        let key = Credential::new("test-key").unwrap();
        GeminiProvider::new(&ModelConfig::new(key).with_base_url(base_url))
    }

    #[test]
    fn test_model_config_builder() {
        let key = Credential::new("test-key").unwrap();
        let config = ModelConfig::new(key.clone());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let config = config.with_base_url("http://localhost:8080/v1");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.api_key, key);
    }

    #[tokio::test]
    async fn test_acquire_success() {
        let provider = fixed_server(
            HttpStatus::OK,
            r#"{"id":"models/gemini-1.5-flash","object":"model","owned_by":"google"}"#,
        )
        .await;

        let model = provider.acquire("gemini-1.5-flash").await.unwrap();
        assert_eq!(model.name(), "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_acquire_plain_text_401_is_authentication() {
        let provider = fixed_server(HttpStatus::UNAUTHORIZED, "Unauthorized").await;

        let err = provider.acquire("gemini-1.5-flash").await.err().unwrap();
        assert_eq!(
            err,
            ModelError::Authentication("401 Unauthorized: Unauthorized".to_string())
        );
    }

    #[tokio::test]
    async fn test_acquire_404_is_model_unavailable() {
        let provider = fixed_server(
            HttpStatus::NOT_FOUND,
            r#"[{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}]"#,
        )
        .await;

        let err = provider.acquire("gemini-1.0-pro").await.err().unwrap();
        assert!(matches!(err, ModelError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let provider = fixed_server(HttpStatus::OK, CHAT_BODY).await;

        let reply = provider.handle("gemini-1.5-flash").generate("Capital of France?").await;
        assert_eq!(reply.unwrap(), " Paris \n");
    }

    #[tokio::test]
    async fn test_generate_sends_key_and_model() {
        let seen = Arc::new(Mutex::new(None::<(String, Value)>));
        let app = Router::new().route(
            "/chat/completions",
            post({
                let seen = seen.clone();
                move |headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *seen.lock().unwrap() = Some((auth, body));
                    (HttpStatus::OK, CHAT_BODY)
                }
            }),
        );
        let provider = client_for(&spawn(app).await);

        provider.handle("gemini-pro").generate("hello").await.unwrap();

        let (auth, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(auth, "Bearer test-key");
        assert_eq!(body["model"], "gemini-pro");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn test_generate_empty_choices() {
        let provider = fixed_server(HttpStatus::OK, r#"{"choices":[]}"#).await;

        let reply = provider.handle("gemini-pro").generate("hi").await.unwrap();
        assert_eq!(reply, "");

        let service = ChatService::new(Readiness::Ready {
            model_name: "gemini-pro".to_string(),
            handle: Arc::new(provider.handle("gemini-pro")),
        });
        assert_eq!(
            service.respond("hi").await,
            "I couldn't generate a response. Please try again."
        );
    }

    #[tokio::test]
    async fn test_generate_gemini_invalid_key_body() {
        let provider = fixed_server(
            HttpStatus::BAD_REQUEST,
            r#"[{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}]"#,
        )
        .await;

        let err = provider.handle("gemini-pro").generate("hi").await.err().unwrap();
        assert!(matches!(err, ModelError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_generate_429_is_quota() {
        let provider = fixed_server(
            HttpStatus::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;

        let err = provider.handle("gemini-pro").generate("hi").await.err().unwrap();
        assert_eq!(
            err,
            ModelError::Quota("429 Too Many Requests: Resource has been exhausted".to_string())
        );
    }

    #[test]
    fn test_error_kind_takes_precedence_over_message() {
        // message alone would read as a model problem
        let err = classify_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"model gemini-pro is overloaded","type":"insufficient_quota"}}"#,
        );
        assert!(matches!(err, ModelError::Quota(_)));
    }

    #[test]
    fn test_unknown_kind_falls_back_to_text_rules() {
        let err = classify_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"models/gemini-1.0-pro is not supported","type":"invalid_request_error"}}"#,
        );
        assert!(matches!(err, ModelError::ModelUnavailable(_)));

        let err = classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "backend exploded");
        assert_eq!(
            err,
            ModelError::Other("500 Internal Server Error: backend exploded".to_string())
        );
    }
}
