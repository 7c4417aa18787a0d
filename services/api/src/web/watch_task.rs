//! services/api/src/web/watch_task.rs
//!
//! The asynchronous "worker" task behind the reminder watcher: a cancellable
//! periodic check of the user's schedule, pushing results over the WebSocket.
//! This replaces the blocking check-every-minute loop the feature started as;
//! nothing here ever blocks the connection's message loop.

use crate::web::{protocol::ServerMessage, state::AppState};
use axum::extract::ws::{Message, WebSocket};
use futures::{stream::SplitSink, SinkExt};
use medminder_core::ports::{PortError, PortResult};
use medminder_core::schedule::evaluate_due;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The main asynchronous task for the periodic due-medicine check.
///
/// Ticks on a fixed interval (the first check runs immediately), evaluates
/// the schedule, and pushes a message per tick. It is designed to be
/// gracefully cancelled via a `CancellationToken`.
pub async fn watch_process(
    app_state: Arc<AppState>,
    user_id: Uuid,
    ws_sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    cancellation_token: CancellationToken,
) -> PortResult<()> {
    info!("Reminder watch started for user {}", user_id);

    let start_msg = ServerMessage::WatchStarted;
    let start_json = serde_json::to_string(&start_msg).unwrap();
    if ws_sender.lock().await.send(Message::Text(start_json.into())).await.is_err() {
        return Err(PortError::Unexpected(
            "Failed to send WatchStarted message.".to_string(),
        ));
    }

    let mut interval =
        tokio::time::interval(Duration::from_secs(app_state.config.check_interval_secs));

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Reminder watch cancelled for user {}", user_id);
                return Ok(());
            }
            _ = interval.tick() => {
                if let Err(e) = run_check(&app_state, user_id, &ws_sender).await {
                    error!("Reminder check failed: {:?}", e);
                    // Tell the client the watch is dead before bailing out;
                    // otherwise it believes checks are still running.
                    let err_msg = ServerMessage::Error {
                        message: "Reminder check failed; the watch has stopped.".to_string(),
                    };
                    let err_json = serde_json::to_string(&err_msg).unwrap();
                    let _ = ws_sender
                        .lock()
                        .await
                        .send(Message::Text(err_json.into()))
                        .await;
                    return Err(e);
                }
            }
        }
    }
}

/// Runs one due-medicine check and pushes the result to the client.
async fn run_check(
    app_state: &Arc<AppState>,
    user_id: Uuid,
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
) -> PortResult<()> {
    let medicines = app_state.db.list_medicines(user_id).await?;
    let reminders = app_state.db.list_reminders(user_id).await?;

    let now = chrono::Local::now().time();
    let report = evaluate_due(&medicines, &reminders, now);
    let checked_at = now.format("%H:%M").to_string();

    if report.is_empty() {
        let msg = ServerMessage::NothingDue { checked_at };
        let json = serde_json::to_string(&msg).unwrap();
        if ws_sender.lock().await.send(Message::Text(json.into())).await.is_err() {
            return Err(PortError::Unexpected(
                "Failed to send NothingDue message.".to_string(),
            ));
        }
        return Ok(());
    }

    let announcement = report.summary();
    let msg = ServerMessage::ReminderDue {
        checked_at,
        message: announcement.clone(),
    };
    let json = serde_json::to_string(&msg).unwrap();
    if ws_sender.lock().await.send(Message::Text(json.into())).await.is_err() {
        return Err(PortError::Unexpected(
            "Failed to send ReminderDue message.".to_string(),
        ));
    }

    // Speak the announcement. Audio frames go through the shared sink one at
    // a time, so utterances never overlap. A synthesis failure is tolerated;
    // the text message already went out.
    match app_state.tts_adapter.generate_audio(&announcement).await {
        Ok(audio) => {
            if ws_sender.lock().await.send(Message::Binary(audio.into())).await.is_err() {
                return Err(PortError::Unexpected(
                    "Failed to send announcement audio.".to_string(),
                ));
            }
        }
        Err(e) => {
            warn!("Failed to synthesize reminder announcement: {:?}", e);
        }
    }

    Ok(())
}
