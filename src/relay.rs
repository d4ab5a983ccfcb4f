use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::error::RelayError;

pub const REQUIRED_FIELDS: [&str; 4] = ["model", "max_tokens", "system", "messages"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    config: Arc<RelayConfig>,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: RelayConfig, port: u16) -> anyhow::Result<()> {
    if config.api_key.is_none() {
        tracing::warn!("no API key configured; chat requests will be rejected");
    }
    tracing::info!(upstream = %config.upstream_url, "chat relay configured");

    let app = build_router(RelayState::new(config)?);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("chat relay listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Checks required fields, then the typed shape, without touching upstream.
pub fn validate_request(body: &[u8]) -> Result<ChatRequest, RelayError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| RelayError::InvalidJson)?;
    let object = value.as_object().ok_or(RelayError::InvalidJson)?;

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| object.get(*field).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(RelayError::MissingFields(missing));
    }

    let request: ChatRequest =
        serde_json::from_value(value).map_err(|err| RelayError::InvalidRequest(err.to_string()))?;
    if request.max_tokens == 0 {
        return Err(RelayError::InvalidRequest(
            "max_tokens must be positive".to_string(),
        ));
    }
    Ok(request)
}

async fn chat(State(state): State<RelayState>, body: Bytes) -> Result<Response, RelayError> {
    let api_key = state
        .config
        .api_key
        .as_ref()
        .ok_or(RelayError::MissingApiKey)?;
    let request = validate_request(&body)?;

    let user_turns = request
        .messages
        .iter()
        .filter(|message| message.role == Role::User)
        .count();
    let content_chars: usize = request.messages.iter().map(|m| m.content.len()).sum();
    tracing::info!(
        model = %request.model,
        max_tokens = request.max_tokens,
        system_chars = request.system.len(),
        turns = request.messages.len(),
        user_turns,
        content_chars,
        "forwarding chat request"
    );

    // Forward the caller's bytes unchanged.
    let upstream = state
        .client
        .post(&state.config.upstream_url)
        .header("x-api-key", api_key.expose_secret())
        .header("anthropic-version", &state.config.api_version)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let payload = upstream.bytes().await?;

    if status.is_success() {
        tracing::info!(%status, bytes = payload.len(), "upstream responded");
    } else {
        tracing::warn!(%status, "upstream returned an error; passing it through");
    }

    let mut response = (status, payload).into_response();
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::DEFAULT_API_VERSION;

    fn app(upstream_url: String, api_key: Option<&str>) -> Router {
        let config = RelayConfig::new(
            api_key.map(str::to_string),
            upstream_url,
            DEFAULT_API_VERSION.to_string(),
        );
        build_router(RelayState::new(config).unwrap())
    }

    fn chat_body() -> Value {
        json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 1024,
            "system": "You answer questions about WAC programs.",
            "messages": [
                { "role": "user", "content": "Which institutions are HBCUs?" }
            ]
        })
    }

    fn post_chat(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_response(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_messages_is_rejected_without_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut body = chat_body();
        body.as_object_mut().unwrap().remove("messages");

        let response = app(format!("{}/v1/messages", server.uri()), Some("test-key"))
            .oneshot(post_chat(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_response(response).await;
        assert_eq!(json["error"], "Missing required fields");
        assert_eq!(json["missing"], json!(["messages"]));
        server.verify().await;
    }

    #[tokio::test]
    async fn forwards_request_and_passes_response_through() {
        let server = MockServer::start().await;
        let upstream_reply = json!({
            "id": "msg_01",
            "type": "message",
            "content": [{ "type": "text", "text": "Howard, NC A&T and Spelman." }]
        });
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", DEFAULT_API_VERSION))
            .and(body_json(chat_body()))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream_reply.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(format!("{}/v1/messages", server.uri()), Some("test-key"))
            .oneshot(post_chat(&chat_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_response(response).await, upstream_reply);
        server.verify().await;
    }

    #[tokio::test]
    async fn upstream_errors_pass_through_unchanged() {
        let server = MockServer::start().await;
        let upstream_error = json!({
            "type": "error",
            "error": { "type": "rate_limit_error", "message": "slow down" }
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(upstream_error.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(format!("{}/v1/messages", server.uri()), Some("test-key"))
            .oneshot(post_chat(&chat_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_response(response).await, upstream_error);
    }

    #[tokio::test]
    async fn missing_api_key_is_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let response = app(format!("{}/v1/messages", server.uri()), None)
            .oneshot(post_chat(&chat_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_response(response).await;
        assert_eq!(json["error"], "API key not configured");
        server.verify().await;
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut body = chat_body();
        body["messages"] = json!([{ "role": "system", "content": "hi" }]);

        let response = app(format!("{}/v1/messages", server.uri()), Some("test-key"))
            .oneshot(post_chat(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        server.verify().await;
    }

    #[tokio::test]
    async fn transport_failure_is_wrapped() {
        // Nothing listens on port 9 locally.
        let response = app("http://127.0.0.1:9/v1/messages".to_string(), Some("test-key"))
            .oneshot(post_chat(&chat_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_response(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn preflight_allows_any_origin() {
        let response = app("http://127.0.0.1:9/v1/messages".to_string(), Some("test-key"))
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/chat")
                    .header("origin", "https://dashboard.example.edu")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            HeaderValue::from_static("*")
        );
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app("http://127.0.0.1:9/v1/messages".to_string(), None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_response(response).await["status"], "ok");
    }

    #[test]
    fn validation_reports_every_missing_field() {
        match validate_request(b"{}") {
            Err(RelayError::MissingFields(missing)) => {
                assert_eq!(missing, REQUIRED_FIELDS.to_vec());
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            validate_request(b"[1, 2]"),
            Err(RelayError::InvalidJson)
        ));
        let zero = json!({ "model": "m", "max_tokens": 0, "system": "s", "messages": [] });
        assert!(matches!(
            validate_request(zero.to_string().as_bytes()),
            Err(RelayError::InvalidRequest(_))
        ));
    }
}
