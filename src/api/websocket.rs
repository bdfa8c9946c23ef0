//! WebSocket handler for live session updates.
//!
//! A relay subscribes to one session and receives every re-render, including
//! those driven by timers rather than input. It may also send interactions
//! over the same socket; their re-renders arrive as ordinary `render`
//! messages and only notices are answered directly.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::handlers::AppState;
use super::types::WsMessage;
use crate::session::{Reply, SessionId};

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn send(sink: &mut SplitSink<WebSocket, Message>, message: &WsMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode WebSocket message");
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    let (mut sink, mut stream) = socket.split();

    let subscription = match session_id.parse::<SessionId>() {
        Ok(id) => state.sessions.subscribe(&id).await.map(|sub| (id, sub)),
        Err(e) => Err(e),
    };
    let (id, (current, mut updates)) = match subscription {
        Ok(found) => found,
        Err(e) => {
            let err = WsMessage::Error {
                code: "SESSION_NOT_FOUND".to_string(),
                message: e.to_string(),
            };
            send(&mut sink, &err).await;
            return;
        }
    };

    if !send(&mut sink, &WsMessage::Render { message: current }).await {
        return;
    }
    debug!(session = %id, "WebSocket subscribed");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(message) => {
                    if !send(&mut sink, &WsMessage::Render { message }).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(session = %id, skipped, "WebSocket subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    send(&mut sink, &WsMessage::Closed).await;
                    break;
                }
            },
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };

                let reply = match serde_json::from_str::<WsMessage>(&text) {
                    Ok(WsMessage::Interact { user_id, interaction }) => {
                        match state.sessions.interact(&id, user_id, &interaction).await {
                            Ok(Reply::Notice { code, notice, .. }) => Some(WsMessage::Notice {
                                code: code.to_string(),
                                notice,
                            }),
                            // Updates reach this socket through the subscription.
                            Ok(Reply::Update { .. }) => None,
                            Err(e) => Some(WsMessage::Error {
                                code: "INTERACTION_FAILED".to_string(),
                                message: e.to_string(),
                            }),
                        }
                    }
                    Ok(WsMessage::Ping) => Some(WsMessage::Pong),
                    Ok(_) => None,
                    Err(e) => Some(WsMessage::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: e.to_string(),
                    }),
                };

                if let Some(reply) = reply {
                    if !send(&mut sink, &reply).await {
                        break;
                    }
                }
            }
        }
    }
    debug!(session = %id, "WebSocket closed");
}
