//! Networked transport: MCP over Server-Sent Events
//!
//! `GET /agent/sse` opens a session and streams server messages;
//! the client posts its messages to the endpoint announced in the first
//! event.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use agent_core::{Agent, SessionId};

use crate::state::{AppState, DeliveryError};

pub const SSE_PATH: &str = "/agent/sse";
pub const MESSAGES_PATH: &str = "/agent/messages/";

const KEEP_ALIVE: Duration = Duration::from_secs(15);

pub async fn serve(addr: SocketAddr, agent: Arc<Agent>) -> anyhow::Result<()> {
    let app = router(AppState::new(agent));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Serving MCP over SSE on http://{}", addr);
    tracing::info!("  GET  {SSE_PATH}         - open a session");
    tracing::info!("  POST {MESSAGES_PATH}    - send a message (?session_id=)");
    tracing::info!("  GET  /health             - health check");

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(SSE_PATH, get(open_stream))
        .route(MESSAGES_PATH, post(post_message))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sessions: usize,
}

/// Liveness only; the model is never called from here
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.session_count(),
    })
}

async fn open_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, outbound) = state.open_session();
    tracing::info!(session = %id, "Client connected");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?session_id={id}"));

    let messages = SessionStream {
        inner: ReceiverStream::new(outbound),
        _guard: SessionGuard { state, id },
    }
    .map(|message| Event::default().event("message").data(message.to_string()));

    let stream = tokio_stream::once(endpoint)
        .chain(messages)
        .map(Ok::<_, Infallible>);

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> StatusCode {
    let Some(raw_id) = query.session_id else {
        return StatusCode::BAD_REQUEST;
    };
    if uuid::Uuid::try_parse(&raw_id).is_err() {
        return StatusCode::BAD_REQUEST;
    }
    let Ok(message) = serde_json::from_slice::<Value>(&body) else {
        tracing::debug!(session = %raw_id, "Malformed message body");
        return StatusCode::BAD_REQUEST;
    };

    let id = SessionId::from_string(raw_id);
    match state.deliver(&id, message).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(DeliveryError::UnknownSession) => StatusCode::NOT_FOUND,
    }
}

/// Drops the session from the table when the SSE response goes away
struct SessionGuard {
    state: AppState,
    id: SessionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.close_session(&self.id);
    }
}

/// Outbound messages of one session, tied to its guard
struct SessionStream {
    inner: ReceiverStream<Value>,
    _guard: SessionGuard,
}

impl Stream for SessionStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::Completion;
    use agent_core::provider::mock::ScriptedProvider;
    use axum::body::{Body, BodyDataStream};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn app_with_provider() -> (Router, AppState, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::always(|_| {
            Ok(Completion::text("Chai Tea is on special."))
        }));
        let agent = Agent::builder()
            .provider(provider.clone())
            .name("MenuAgent")
            .build()
            .unwrap();
        let state = AppState::new(Arc::new(agent));
        (router(state.clone()), state, provider)
    }

    fn app() -> (Router, AppState) {
        let (router, state, _) = app_with_provider();
        (router, state)
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn next_event(body: &mut BodyDataStream) -> String {
        let chunk = futures::StreamExt::next(body).await.unwrap().unwrap();
        String::from_utf8(chunk.to_vec()).unwrap()
    }

    fn data_line(event: &str) -> &str {
        event
            .lines()
            .find_map(|l| l.strip_prefix("data: "))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _, scripted) = app_with_provider();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            json!({"status": "healthy", "version": env!("CARGO_PKG_VERSION"), "sessions": 0})
        );
        assert!(scripted.requests().is_empty());
    }

    #[tokio::test]
    async fn test_post_rejections() {
        let (app, _) = app();
        let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string();

        let missing = app
            .clone()
            .oneshot(post(MESSAGES_PATH, ping.clone()))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let garbled = app
            .clone()
            .oneshot(post("/agent/messages/?session_id=not-a-uuid", ping.clone()))
            .await
            .unwrap();
        assert_eq!(garbled.status(), StatusCode::BAD_REQUEST);

        let unknown = format!("{MESSAGES_PATH}?session_id={}", SessionId::new());
        let response = app.oneshot(post(&unknown, ping)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sse_session_round_trip() {
        let (app, state) = app();

        let request = Request::builder().uri(SSE_PATH).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.session_count(), 1);
        let mut events = response.into_body().into_data_stream();

        let first = next_event(&mut events).await;
        assert!(first.starts_with("event: endpoint\n"));
        let endpoint = data_line(&first).to_string();
        assert!(endpoint.starts_with("/agent/messages/?session_id="));

        let malformed = app.clone().oneshot(post(&endpoint, "{oops")).await.unwrap();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

        let call = json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "MenuAgent", "arguments": {"message": "Any specials?"}},
        });
        let accepted = app
            .clone()
            .oneshot(post(&endpoint, call.to_string()))
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::ACCEPTED);

        let reply = next_event(&mut events).await;
        assert!(reply.starts_with("event: message\n"));
        let reply: Value = serde_json::from_str(data_line(&reply)).unwrap();
        assert_eq!(reply["id"], 5);
        assert_eq!(reply["result"]["content"][0]["text"], "Chai Tea is on special.");

        // client disconnect
        drop(events);
        assert_eq!(state.session_count(), 0);
        let gone = app.oneshot(post(&endpoint, call.to_string())).await.unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}
