//! WebSocket handler: binary protobuf frames in, one terminal reply out.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Client sends request frames → dispatch by syscall → `done` or `error`
//! 3. Close → log and drop
//!
//! Handlers are pure business logic over [`AppState`]; they return the reply
//! frame and never touch the socket.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::{
    CODE_NOT_FOUND, CODE_UNKNOWN_SYSCALL, ErrorCode, FIELD_GLOBALS, FIELD_NAME, FIELD_VALUE, Frame, GLOBAL_GET,
    GLOBAL_LIST, GLOBAL_SET, SESSION_CONNECTED, Status,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AppState, SnapshotError};

// =============================================================================
// ERRORS
// =============================================================================

/// Request-level failures, sent back as structured error frames.
#[derive(Debug, thiserror::Error)]
pub enum GlobalError {
    #[error("no global named `{0}`")]
    NotFound(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unknown syscall `{0}`")]
    UnknownSyscall(String),
    #[error("frames must be requests, got {0:?}")]
    NotARequest(Status),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl ErrorCode for GlobalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => CODE_NOT_FOUND,
            Self::MissingField(_) => "missing_field",
            Self::UnknownSyscall(_) => CODE_UNKNOWN_SYSCALL,
            Self::NotARequest(_) => "not_a_request",
            Self::Snapshot(_) => "snapshot_failed",
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let welcome = Frame::request(SESSION_CONNECTED).with_from("confighost").with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }
    info!(%client_id, "ws: client connected");

    while let Some(msg) = socket.recv().await {
        let Ok(msg) = msg else { break };
        let reply = match msg {
            Message::Binary(bytes) => process_inbound_bytes(&state, &bytes).await,
            Message::Text(text) => process_inbound_text(&state, text.as_str()).await,
            Message::Close(_) => break,
            _ => continue,
        };
        if send_frame(&mut socket, &reply).await.is_err() {
            break;
        }
    }
    info!(%client_id, "ws: client disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    if frame.status == Status::Error {
        warn!(id = %frame.id, syscall = %frame.syscall, code = frame.error_code().unwrap_or("-"), "ws: send error");
    } else {
        debug!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Binary(frames::encode_frame(frame).into())).await
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Decode one binary frame and produce the reply.
pub(crate) async fn process_inbound_bytes(state: &AppState, bytes: &[u8]) -> Frame {
    match frames::decode_frame(bytes) {
        Ok(req) => dispatch(state, &req).await,
        Err(e) => {
            warn!(error = %e, "ws: invalid inbound frame");
            Frame::request("gateway:error").error("decode_failed", e.to_string())
        }
    }
}

/// JSON text frames are accepted for debugging with generic websocket tools.
pub(crate) async fn process_inbound_text(state: &AppState, text: &str) -> Frame {
    match serde_json::from_str::<Frame>(text) {
        Ok(req) => dispatch(state, &req).await,
        Err(e) => {
            warn!(error = %e, "ws: invalid inbound json frame");
            Frame::request("gateway:error").error("decode_failed", format!("invalid json: {e}"))
        }
    }
}

async fn dispatch(state: &AppState, req: &Frame) -> Frame {
    debug!(id = %req.id, syscall = %req.syscall, "ws: recv frame");
    let result = if req.status == Status::Request {
        match req.syscall.as_str() {
            GLOBAL_GET => handle_get(state, req).await,
            GLOBAL_SET => handle_set(state, req).await,
            GLOBAL_LIST => Ok(handle_list(state, req).await),
            other => Err(GlobalError::UnknownSyscall(other.to_owned())),
        }
    } else {
        Err(GlobalError::NotARequest(req.status))
    };
    result.unwrap_or_else(|e| req.error_from(&e))
}

// =============================================================================
// HANDLERS
// =============================================================================

fn name_field(req: &Frame) -> Result<&str, GlobalError> {
    req.str_field(FIELD_NAME).filter(|name| !name.is_empty()).ok_or(GlobalError::MissingField(FIELD_NAME))
}

async fn handle_get(state: &AppState, req: &Frame) -> Result<Frame, GlobalError> {
    let name = name_field(req)?;
    let value = state.get(name).await.ok_or_else(|| GlobalError::NotFound(name.to_owned()))?;
    Ok(req.done().with_data(FIELD_NAME, name).with_data(FIELD_VALUE, value))
}

async fn handle_set(state: &AppState, req: &Frame) -> Result<Frame, GlobalError> {
    let name = name_field(req)?;
    let value = match req.data.get(FIELD_VALUE) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => return Err(GlobalError::MissingField(FIELD_VALUE)),
        Some(other) => other.to_string(),
    };
    info!(name, value = %value, "global set");
    state.set(name, value).await?;
    Ok(req.done().with_data(FIELD_NAME, name))
}

async fn handle_list(state: &AppState, req: &Frame) -> Frame {
    let globals: Map<String, Value> = state.list().await.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
    req.done().with_data(FIELD_GLOBALS, Value::Object(globals))
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
