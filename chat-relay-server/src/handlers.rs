use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    Json,
};
use chat_relay_core::transport::BufferedTransport;
use chat_relay_providers::Message;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::sse::SseTransport;
use crate::state::{AppState, ErrorResponse, MessageRequest, SessionStarted};

const WIDGET_HTML: &str = include_str!("../static/index.html");

pub async fn index_handler() -> Html<&'static str> {
    Html(WIDGET_HTML)
}

pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.handlers.store().len(),
    }))
}

pub async fn create_session_handler(
    State(state): State<AppState>,
) -> Result<Json<SessionStarted>, AppError> {
    let session_id = Uuid::new_v4().to_string();
    let transport = BufferedTransport::new();

    state
        .handlers
        .on_chat_start(&session_id, &transport)
        .await?;

    Ok(Json(SessionStarted {
        session_id,
        messages: transport.take(),
    }))
}

pub async fn post_message_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    if !state.handlers.store().contains(&session_id) {
        return Err(AppError::NotFound(format!("session {} not found", session_id)));
    }

    let (transport, events) = SseTransport::channel();
    let handlers = state.handlers.clone();
    tokio::spawn(async move {
        if let Err(e) = handlers
            .on_message(&session_id, &payload.content, &transport)
            .await
        {
            tracing::warn!(session = %session_id, "Message delivery failed: {}", e);
            transport.fail(e.to_string());
        }
    });

    let stream = UnboundedReceiverStream::new(events).map(|event| Ok(event.into_event()));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn history_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let history = state.handlers.store().history(&session_id).await?;
    Ok(Json(history))
}

pub async fn end_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.handlers.on_chat_end(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session {} not found", session_id)))
    }
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<chat_relay_core::Error> for AppError {
    fn from(err: chat_relay_core::Error) -> Self {
        use chat_relay_core::Error;
        match err {
            Error::Validation(msg) => AppError::BadRequest(msg),
            Error::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
