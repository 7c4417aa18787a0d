//! services/api/src/web/ws_handler.rs
//!
//! The entry point and control loop for a reminder-watcher WebSocket
//! connection. It owns the watch task's lifecycle and delegates the periodic
//! checking to `watch_task`.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
    watch_task::watch_process,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{stream::StreamExt, SinkExt};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>, // from auth middleware
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Uuid) {
    info!("New watcher WebSocket connection for user: {}", user_id);

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender = Arc::new(Mutex::new(sender));

    let mut watch_task_handle: Option<JoinHandle<()>> = None;
    let mut cancellation_token = CancellationToken::new();

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::StartWatch) => {
                    let already_running = watch_task_handle
                        .as_ref()
                        .map(|h| !h.is_finished())
                        .unwrap_or(false);
                    if already_running {
                        warn!("StartWatch received while a watch is already running.");
                        continue;
                    }

                    cancellation_token = CancellationToken::new();
                    let task = {
                        let app_state = app_state.clone();
                        let ws_sender = ws_sender.clone();
                        let token = cancellation_token.clone();
                        tokio::spawn(async move {
                            if let Err(e) =
                                watch_process(app_state, user_id, ws_sender, token).await
                            {
                                error!("Watch process failed: {:?}", e);
                            }
                        })
                    };
                    watch_task_handle = Some(task);
                }
                Ok(ClientMessage::StopWatch) => {
                    info!("StopWatch received; cancelling watch task.");
                    cancellation_token.cancel();
                    watch_task_handle = None;

                    let stop_msg = ServerMessage::WatchStopped;
                    let stop_json = serde_json::to_string(&stop_msg).unwrap();
                    if ws_sender
                        .lock()
                        .await
                        .send(Message::Text(stop_json.into()))
                        .await
                        .is_err()
                    {
                        error!("Failed to send WatchStopped message.");
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to deserialize client message: {}", e);
                    let err_msg = ServerMessage::Error {
                        message: "Unrecognized message.".to_string(),
                    };
                    let err_json = serde_json::to_string(&err_msg).unwrap();
                    if ws_sender
                        .lock()
                        .await
                        .send(Message::Text(err_json.into()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            },
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // Cleanup: make sure the periodic task dies with the connection.
    cancellation_token.cancel();
    if let Some(handle) = watch_task_handle {
        handle.abort();
    }
    info!("Watcher WebSocket connection closed.");
}
