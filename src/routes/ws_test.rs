use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::*;

fn request_bytes(syscall: &str, data: &[(&str, Value)]) -> Vec<u8> {
    let frame = data.iter().fold(Frame::request(syscall), |frame, (key, value)| frame.with_data(*key, value.clone()));
    frames::encode_frame(&frame)
}

// =============================================================
// Dispatch
// =============================================================

#[tokio::test]
async fn get_missing_global_is_not_found() {
    let state = AppState::default();
    let reply = process_inbound_bytes(&state, &request_bytes(GLOBAL_GET, &[(FIELD_NAME, "debug".into())])).await;
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.error_code(), Some(CODE_NOT_FOUND));
}

#[tokio::test]
async fn set_then_get_round_trips_as_string() {
    let state = AppState::default();
    let set = process_inbound_bytes(
        &state,
        &request_bytes(GLOBAL_SET, &[(FIELD_NAME, "alertInterval".into()), (FIELD_VALUE, "4".into())]),
    )
    .await;
    assert_eq!(set.status, Status::Done);
    assert_eq!(set.str_field(FIELD_NAME), Some("alertInterval"));

    let get = process_inbound_bytes(&state, &request_bytes(GLOBAL_GET, &[(FIELD_NAME, "alertInterval".into())])).await;
    assert_eq!(get.status, Status::Done);
    assert_eq!(get.str_field(FIELD_VALUE), Some("4"));
}

#[tokio::test]
async fn non_string_values_are_stored_as_json_text() {
    let state = AppState::default();
    process_inbound_bytes(&state, &request_bytes(GLOBAL_SET, &[(FIELD_NAME, "debug".into()), (FIELD_VALUE, true.into())]))
        .await;
    assert_eq!(state.get("debug").await.as_deref(), Some("true"));
}

#[tokio::test]
async fn set_requires_name_and_value() {
    let state = AppState::default();
    let reply = process_inbound_bytes(&state, &request_bytes(GLOBAL_SET, &[(FIELD_NAME, "x".into())])).await;
    assert_eq!(reply.error_code(), Some("missing_field"));
    let reply = process_inbound_bytes(&state, &request_bytes(GLOBAL_SET, &[(FIELD_VALUE, "1".into())])).await;
    assert_eq!(reply.error_code(), Some("missing_field"));
}

#[tokio::test]
async fn list_returns_every_global() {
    let state = AppState::default();
    state.set("a", "1".into()).await.expect("set");
    state.set("b", "2".into()).await.expect("set");
    let reply = process_inbound_bytes(&state, &request_bytes(GLOBAL_LIST, &[])).await;
    assert_eq!(reply.data.get(FIELD_GLOBALS), Some(&serde_json::json!({"a": "1", "b": "2"})));
}

#[tokio::test]
async fn unknown_syscall_is_rejected() {
    let state = AppState::default();
    let reply = process_inbound_bytes(&state, &request_bytes("scene:switch", &[])).await;
    assert_eq!(reply.error_code(), Some(CODE_UNKNOWN_SYSCALL));
    assert_eq!(reply.syscall, "scene:switch");
}

#[tokio::test]
async fn malformed_bytes_yield_decode_error() {
    let reply = process_inbound_bytes(&AppState::default(), &[0xff, 0x00, 0x01]).await;
    assert_eq!(reply.error_code(), Some("decode_failed"));
}

#[tokio::test]
async fn json_text_frames_are_accepted() {
    let state = AppState::default();
    state.set("scene", "other".into()).await.expect("set");
    let req = Frame::request(GLOBAL_GET).with_data(FIELD_NAME, "scene");
    let reply = process_inbound_text(&state, &serde_json::to_string(&req).expect("json")).await;
    assert_eq!(reply.str_field(FIELD_VALUE), Some("other"));
    assert_eq!(reply.parent_id.as_deref(), Some(req.id.as_str()));
}

// =============================================================
// End to end
// =============================================================

async fn next_frame<S>(stream: &mut S) -> Frame
where
    S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timely frame")
            .expect("open stream")
            .expect("message");
        if let WsMessage::Binary(bytes) = message {
            return frames::decode_frame(&bytes).expect("decode");
        }
    }
}

#[tokio::test]
async fn websocket_session_end_to_end() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(axum::serve(listener, crate::routes::app(AppState::default())).into_future());

    let (mut stream, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    let welcome = next_frame(&mut stream).await;
    assert_eq!(welcome.syscall, SESSION_CONNECTED);

    let set = Frame::request(GLOBAL_SET).with_data(FIELD_NAME, "debug").with_data(FIELD_VALUE, "false");
    stream.send(WsMessage::Binary(frames::encode_frame(&set).into())).await.expect("send");
    let ack = next_frame(&mut stream).await;
    assert_eq!(ack.parent_id.as_deref(), Some(set.id.as_str()));
    assert_eq!(ack.status, Status::Done);

    let get = Frame::request(GLOBAL_GET).with_data(FIELD_NAME, "debug");
    stream.send(WsMessage::Binary(frames::encode_frame(&get).into())).await.expect("send");
    let reply = next_frame(&mut stream).await;
    assert_eq!(reply.str_field(FIELD_VALUE), Some("false"));

    server.abort();
}
