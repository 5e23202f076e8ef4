//! HTTP front-end: the chat page and the `/ask` endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::chat::ChatService;

/// Chat page served at `/`
const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Body of `POST /ask`
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /ask`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
    pub reply: String,
}

/// Build the application router around a resolved chat service
pub fn router(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ask", post(ask))
        .with_state(service)
}

/// Bind `addr` and serve until the process is interrupted
pub async fn serve(addr: SocketAddr, service: Arc<ChatService>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Always answers 200; failures are reported inside `reply`.
async fn ask(
    State(service): State<Arc<ChatService>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Json<AskResponse> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("ask", %request_id);

    async move {
        let request = match payload {
            Ok(Json(request)) => request,
            Err(rejection) => {
                warn!("Unreadable request body: {}", rejection);
                AskRequest::default()
            }
        };

        let reply = service.respond(&request.message).await;
        info!(chars = reply.chars().count(), "Reply sent");
        Json(AskResponse { reply })
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Readiness;
    use crate::error::Result;
    use crate::model::GenerativeModel;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    struct EchoModel;

    #[async_trait]
    impl GenerativeModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!(" echo: {} ", prompt))
        }
    }

    fn echo_ready() -> Readiness {
        Readiness::Ready {
            model_name: "echo".to_string(),
            handle: Arc::new(EchoModel),
        }
    }

    fn app(readiness: Readiness) -> Router {
        router(Arc::new(ChatService::new(readiness)))
    }

    async fn post_ask(app: Router, body: &str) -> (StatusCode, AskResponse) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ask")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ask_relays_model_reply() {
        let (status, body) = post_ask(
            app(echo_ready()),
            r#"{"message": "hello"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.reply, "echo: hello");
    }

    #[tokio::test]
    async fn test_ask_missing_message_field() {
        let (status, body) = post_ask(app(echo_ready()), "{}").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.reply, "Please type something!");
    }

    #[tokio::test]
    async fn test_ask_malformed_body_still_ok() {
        let (status, body) = post_ask(app(Readiness::NoModel), "not json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.reply, "Please type something!");
    }

    #[tokio::test]
    async fn test_ask_reports_configuration_errors_in_body() {
        let (status, body) = post_ask(app(Readiness::MissingCredential), r#"{"message": "hi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.reply.contains("API key not configured"));
    }

    #[tokio::test]
    async fn test_index_serves_chat_page() {
        let response = app(Readiness::NoModel)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("/ask"));
    }
}
