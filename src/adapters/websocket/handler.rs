//! WebSocket upgrade handler and HTTP routes for the gateway.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Authenticate the credential (query `apiKey` or `x-api-key` header)
//! 2. Upgrade to WebSocket
//! 3. Attach to the socket directory and register with the registry
//! 4. Write queued frames and answer client pings until either side closes
//! 5. Detach and deregister

use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::application::{BroadcastFanOut, ConnectionRegistry};
use crate::domain::backpressure::DisconnectReason;
use crate::domain::foundation::ConnectionId;
use crate::domain::messages::{error_codes, make_error, serialize, WireMessage};
use crate::ports::ConnectionAuthenticator;

use super::directory::{CloseSignal, OutboundReceiver, SocketDirectory};
use super::messages::reply_to;

/// Header carrying the API key when it is not in the query string.
pub const API_KEY_HEADER: &str = "x-api-key";

/// State shared by the gateway routes.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<ConnectionRegistry>,
    pub fan_out: Arc<BroadcastFanOut>,
    pub directory: Arc<SocketDirectory>,
    pub authenticator: Arc<dyn ConnectionAuthenticator>,
}

/// Query parameters accepted on `/ws`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    connections: usize,
    slow_consumers: Vec<SlowConsumer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlowConsumer {
    id: ConnectionId,
    outstanding_bytes: u64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
///
/// Credentials are checked before the upgrade, so a refused client gets a
/// plain 401 and never reaches the registry.
pub async fn ws_handler(
    ws: Option<WebSocketUpgrade>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<GatewayState>,
) -> Response {
    let credential = params.api_key.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    });

    if let Err(e) = state.authenticator.authenticate(credential.as_deref()).await {
        tracing::debug!(error = %e, "WebSocket upgrade refused");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                code: "UNAUTHORIZED",
                message: e.to_string(),
            }),
        )
            .into_response();
    }

    let Some(ws) = ws else {
        return (
            StatusCode::UPGRADE_REQUIRED,
            Json(ErrorBody {
                code: "UPGRADE_REQUIRED",
                message: "WebSocket upgrade required".to_string(),
            }),
        )
            .into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Report live connections and slow consumers.
///
/// Route: `GET /health`
pub async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    let slow_consumers = state
        .registry
        .slow_consumers()
        .into_iter()
        .map(|record| SlowConsumer {
            id: *record.id(),
            outstanding_bytes: record.outstanding_bytes(),
        })
        .collect();

    Json(HealthResponse {
        status: "ok",
        connections: state.registry.count(),
        slow_consumers,
    })
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection. The writer and reader run as
/// separate tasks; when either finishes the other is aborted.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let id = ConnectionId::new();
    let (outbound, close) = state.directory.attach(id);
    state.registry.add(id);
    tracing::info!(connection_id = %id, "Client connected");

    let (sender, receiver) = socket.split();

    let mut send_task = tokio::spawn(write_loop(
        id,
        sender,
        outbound,
        close,
        state.registry.clone(),
    ));
    let mut recv_task = tokio::spawn(read_loop(id, receiver, state.fan_out.clone()));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.directory.detach(&id);
    if let Some(record) = state.registry.remove(&id) {
        tracing::info!(
            connection_id = %id,
            messages_sent = record.messages_sent(),
            "Client disconnected"
        );
    }
}

/// Forward queued frames to the socket until closed.
///
/// A close signal takes priority over queued frames: the client receives a
/// final error frame and a close frame, and the backlog is discarded.
async fn write_loop(
    id: ConnectionId,
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: OutboundReceiver,
    mut close: CloseSignal,
    registry: Arc<ConnectionRegistry>,
) {
    loop {
        tokio::select! {
            biased;

            changed = close.changed() => {
                if changed.is_err() {
                    break;
                }
                let reason = close.borrow_and_update().clone();
                if let Some(reason) = reason {
                    send_final_frames(id, &mut sender, &reason).await;
                    break;
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                let len = frame.len() as u64;
                // axum 0.7's Message::Text owns its String, so the shared
                // frame is copied once here, at write time, per socket.
                if let Err(e) = sender.send(Message::Text(frame.to_string())).await {
                    tracing::debug!(connection_id = %id, error = %e, "Send error, closing connection");
                    break;
                }
                registry.record_drain(&id, len);
            }
        }
    }
}

async fn send_final_frames(
    id: ConnectionId,
    sender: &mut SplitSink<WebSocket, Message>,
    reason: &DisconnectReason,
) {
    let (code, text, frame_code) = match reason {
        DisconnectReason::BufferOverflow => (
            error_codes::BUFFER_OVERFLOW,
            "Connection buffer overflow, client too slow",
            close_code::POLICY,
        ),
        DisconnectReason::ServerShutdown => (
            error_codes::SERVER_SHUTDOWN,
            "Server shutting down",
            close_code::AWAY,
        ),
        DisconnectReason::Other(_) => {
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    match serialize(&WireMessage::from(make_error(code, text))) {
        Ok(message) => {
            if sender
                .send(Message::Text(message.as_str().to_owned()))
                .await
                .is_err()
            {
                return;
            }
        }
        Err(e) => tracing::error!(connection_id = %id, error = %e, "Failed to encode final frame"),
    }

    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: frame_code,
            reason: reason.as_str().to_owned().into(),
        })))
        .await;
}

/// Process client frames until the client closes.
async fn read_loop(
    id: ConnectionId,
    mut receiver: SplitStream<WebSocket>,
    fan_out: Arc<BroadcastFanOut>,
) {
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = match serialize(&reply_to(&text)) {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::error!(connection_id = %id, error = %e, "Failed to encode reply");
                        continue;
                    }
                };
                if let Err(e) = fan_out.send_to(&id, &reply) {
                    tracing::debug!(connection_id = %id, error = %e, "Reply not delivered");
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!(connection_id = %id, "Received unsupported binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // WebSocket protocol ping/pong - handled automatically by axum
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Receive error");
                break;
            }
        }
    }
}

/// Create the gateway router with request tracing.
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
