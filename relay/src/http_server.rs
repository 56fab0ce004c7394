use crate::message::IncomingMessage;
use crate::resolver::{ResolveError, Resolver};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use neelakshi_core::types::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

/// Request body for `/chat`.
///
/// Either `message` (plus optional `history`) or an OpenAI-style `messages`
/// list, whose last user entry is the message.
#[derive(Deserialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

impl ChatRequest {
    fn into_incoming(self) -> IncomingMessage {
        if let Some(message) = self.message.filter(|m| !m.trim().is_empty()) {
            return IncomingMessage::new(message).with_history(self.history);
        }

        let mut messages = self.messages;
        match messages.iter().rposition(|m| m.role == Role::User) {
            Some(last_user) => {
                let text = messages.remove(last_user).content;
                messages.truncate(last_user);
                IncomingMessage::new(text).with_history(messages)
            }
            None => IncomingMessage::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    provider: &'static str,
    model: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error type for HTTP server
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::InvalidInput => Self::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                warn!(error = %message, "Rejected chat request");
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
        }
    }
}

/// Build the router. Static widget files are served from `public_dir` when it exists.
pub fn router(state: AppState, public_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/chat", post(handle_chat))
        .route("/status", get(status));

    let router = match public_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            info!("Serving widget from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.route("/", get(banner)),
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn run_server(
    resolver: Resolver,
    addr: SocketAddr,
    public_dir: Option<&Path>,
) -> anyhow::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let app = router(AppState::new(resolver), public_dir);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn banner() -> impl IntoResponse {
    "Neelakshi chat relay is running"
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let (provider, model) = state.resolver.model_info();
    Json(StatusResponse {
        status: "ok",
        provider,
        model,
    })
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let span = info_span!("chat", request_id = %Uuid::new_v4());

    async move {
        let incoming = payload.into_incoming();
        let reply = state.resolver.resolve(incoming).await?;
        Ok::<_, ApiError>(Json(ChatResponse { reply: reply.text }))
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubModel, StubWeather, Stubs};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(stubs: &Stubs) -> Router {
        router(AppState::new(stubs.resolver()), None)
    }

    async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_greeting() {
        let stubs = Stubs::new(StubModel::replying("unused"));
        let (status, body) = post_chat(app(&stubs), json!({"message": "hello"})).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["reply"].as_str().unwrap().starts_with("Hello!"));
    }

    #[tokio::test]
    async fn test_chat_weather() {
        let stubs = Stubs::new(StubModel::replying("unused"))
            .with_weather(StubWeather::reporting(30.0, 10.0));
        let (status, body) = post_chat(app(&stubs), json!({"message": "weather in Jaipur"})).await;

        assert_eq!(status, StatusCode::OK);
        let reply = body["reply"].as_str().unwrap();
        assert!(reply.contains("30") && reply.contains("Jaipur"), "{}", reply);
    }

    #[tokio::test]
    async fn test_chat_empty_message_is_400() {
        let stubs = Stubs::new(StubModel::replying("unused"));

        let (status, body) = post_chat(app(&stubs), json!({"message": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No message provided"}));

        let (status, _) = post_chat(app(&stubs), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(stubs.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_messages_form() {
        let stubs = Stubs::new(StubModel::replying("New Delhi"));
        let (status, body) = post_chat(
            app(&stubs),
            json!({"messages": [
                {"role": "user", "content": "I am planning a trip"},
                {"role": "assistant", "content": "Where to?"},
                {"role": "user", "content": "capital of India"}
            ]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"reply": "New Delhi"}));

        let (_, messages) = stubs.model.last_request().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], ChatMessage::user("I am planning a trip"));
        assert_eq!(messages[1], ChatMessage::assistant("Where to?"));
    }

    #[tokio::test]
    async fn test_chat_history_accepts_model_role() {
        let stubs = Stubs::new(StubModel::replying("Sure"));
        let (status, _) = post_chat(
            app(&stubs),
            json!({
                "message": "and tomorrow?",
                "history": [{"role": "model", "content": "Looks sunny"}]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let (_, messages) = stubs.model.last_request().unwrap();
        assert_eq!(messages[0], ChatMessage::assistant("Looks sunny"));
    }

    #[tokio::test]
    async fn test_status() {
        let stubs = Stubs::new(StubModel::replying("unused"));
        let request = Request::builder().uri("/status").body(Body::empty()).unwrap();
        let response = app(&stubs).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok", "provider": "stub", "model": "stub-model"}));
    }

    #[tokio::test]
    async fn test_root_banner_without_public_dir() {
        let stubs = Stubs::new(StubModel::replying("unused"));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(&stubs).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("running"));
    }

    #[tokio::test]
    async fn test_root_serves_widget() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Neelakshi</h1>").unwrap();

        let stubs = Stubs::new(StubModel::replying("unused"));
        let app = router(AppState::new(stubs.resolver()), Some(dir.path()));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Neelakshi</h1>");
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let stubs = Stubs::new(StubModel::replying("unused"));
        let request = Request::builder()
            .uri("/status")
            .header(header::ORIGIN, "https://example.org")
            .body(Body::empty())
            .unwrap();
        let response = app(&stubs).oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[test]
    fn test_messages_without_user_entry_is_empty() {
        let request = ChatRequest {
            messages: vec![ChatMessage::assistant("hi there")],
            ..ChatRequest::default()
        };
        assert!(request.into_incoming().text.is_empty());
    }
}
