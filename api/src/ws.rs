use crate::extract::ApiPath;
use crate::models::reject;
use crate::AppState;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use common::infra::broadcast::{BroadcastMessage, Channel};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};

/// `GET /ws/:channel` streams every message published on the channel.
pub async fn subscribe(
    ApiPath(channel): ApiPath<String>,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Ok(channel) = channel.parse::<Channel>() else {
        return reject(404, format!("Unknown channel: {}", channel));
    };
    let Some(receiver) = state.services.broadcaster.subscribe(channel) else {
        return reject(404, format!("Unknown channel: {}", channel.as_str()));
    };

    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| forward(socket, channel, receiver))
            .into_response(),
        Err(rejection) => reject(400, rejection.body_text()),
    }
}

async fn forward(socket: WebSocket, channel: Channel, mut receiver: Receiver<BroadcastMessage>) {
    tracing::debug!(channel = channel.as_str(), "websocket subscriber connected");
    let (mut sender, mut incoming) = socket.split();

    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Ok(message) => {
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("failed to encode broadcast: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = channel.as_str(), skipped, "websocket subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            frame = incoming.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("websocket receive error: {}", e);
                    break;
                }
            },
        }
    }

    tracing::debug!(channel = channel.as_str(), "websocket subscriber disconnected");
}
