//! Websocket session with the config host, exposed as a [`RemoteStore`].
//!
//! One request is in flight at a time: the socket sits behind an async mutex
//! and every request waits for the terminal reply whose `parent_id` matches.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use configform::{RemoteStore, StoreError};
use frames::{CODE_NOT_FOUND, FIELD_GLOBALS, FIELD_MESSAGE, FIELD_NAME, FIELD_VALUE, Frame, Status};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::CliError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsStore {
    socket: Mutex<Socket>,
    timeout: Duration,
    client_id: Option<String>,
}

impl WsStore {
    /// Connect and wait for the host's `session:connected` greeting.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CliError> {
        let (mut socket, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| CliError::Timeout)?
            .map_err(|e| CliError::WsConnect(Box::new(e)))?;

        let client_id = loop {
            let frame = recv_next(&mut socket, timeout).await?;
            if frame.syscall == frames::SESSION_CONNECTED {
                break frame.str_field("client_id").map(ToOwned::to_owned);
            }
        };
        info!(url, client_id = client_id.as_deref().unwrap_or("-"), "session connected");
        Ok(Self { socket: Mutex::new(socket), timeout, client_id })
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Send `frame` and return its terminal reply, error frames included.
    pub async fn request(&self, frame: Frame) -> Result<Frame, CliError> {
        let mut socket = self.socket.lock().await;
        socket
            .send(Message::Binary(frames::encode_frame(&frame).into()))
            .await
            .map_err(|e| CliError::WsConnect(Box::new(e)))?;
        loop {
            let reply = recv_next(&mut socket, self.timeout).await?;
            if reply.parent_id.as_deref() != Some(frame.id.as_str()) || !reply.status.is_terminal() {
                continue;
            }
            debug!(syscall = %reply.syscall, status = ?reply.status, "reply");
            return Ok(reply);
        }
    }

    /// Every global on the host.
    pub async fn list(&self) -> Result<BTreeMap<String, String>, CliError> {
        let reply = self.request(Frame::request(frames::GLOBAL_LIST)).await?;
        if reply.status == Status::Error {
            return Err(host_error(&reply));
        }
        let Some(Value::Object(globals)) = reply.data.get(FIELD_GLOBALS) else {
            return Err(CliError::MissingField(FIELD_GLOBALS));
        };
        Ok(globals
            .iter()
            .map(|(name, value)| {
                let text = value.as_str().map_or_else(|| value.to_string(), ToOwned::to_owned);
                (name.clone(), text)
            })
            .collect())
    }
}

#[async_trait(?Send)]
impl RemoteStore for WsStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        let request = Frame::request(frames::GLOBAL_GET).with_data(FIELD_NAME, key);
        let reply = self.request(request).await.map_err(transport)?;
        read_reply(key, &reply)
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let request = Frame::request(frames::GLOBAL_SET).with_data(FIELD_NAME, key).with_data(FIELD_VALUE, value);
        let reply = self.request(request).await.map_err(transport)?;
        write_reply(key, &reply)
    }
}

// =============================================================================
// REPLIES
// =============================================================================

/// Interpret a `global:get` reply. `not_found` is an unset key, not a failure.
pub(crate) fn read_reply(key: &str, reply: &Frame) -> Result<Option<String>, StoreError> {
    match reply.status {
        Status::Done => reply
            .str_field(FIELD_VALUE)
            .map(|value| Some(value.to_owned()))
            .ok_or_else(|| StoreError::Transport(format!("reply for `{key}` has no value"))),
        Status::Error if reply.error_code() == Some(CODE_NOT_FOUND) => Ok(None),
        _ => Err(rejected(key, reply)),
    }
}

pub(crate) fn write_reply(key: &str, reply: &Frame) -> Result<(), StoreError> {
    if reply.status == Status::Done {
        return Ok(());
    }
    Err(rejected(key, reply))
}

fn rejected(key: &str, reply: &Frame) -> StoreError {
    let reason = reply.str_field(FIELD_MESSAGE).or_else(|| reply.error_code()).unwrap_or("unexpected reply");
    StoreError::Rejected { key: key.to_owned(), reason: reason.to_owned() }
}

fn transport(err: CliError) -> StoreError {
    match err {
        CliError::WsClosed => StoreError::Closed,
        other => StoreError::Transport(other.to_string()),
    }
}

fn host_error(reply: &Frame) -> CliError {
    CliError::ServerError {
        syscall: reply.syscall.clone(),
        message: reply.str_field(FIELD_MESSAGE).unwrap_or("unknown websocket error").to_owned(),
    }
}

async fn recv_next(socket: &mut Socket, timeout: Duration) -> Result<Frame, CliError> {
    let fut = async {
        loop {
            let Some(message) = socket.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|e| CliError::WsConnect(Box::new(e)))? {
                Message::Binary(bytes) => return frames::decode_frame(&bytes).map_err(CliError::from),
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };
    tokio::time::timeout(timeout, fut).await.map_err(|_| CliError::Timeout)?
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
