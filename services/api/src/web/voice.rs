//! services/api/src/web/voice.rs
//!
//! The voice-command endpoint: transcribe the user's speech, parse it into a
//! structured command, act on the schedule store, and speak the reply back.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use base64::Engine;
use bytes::Bytes;
use medminder_core::intent::{parse_command, VoiceCommand};
use medminder_core::schedule::evaluate_due;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Response Type
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct VoiceCommandResponse {
    /// What the transcription service heard.
    pub transcript: String,
    /// The recognized intent ("list_medicines", "check_due", "add_reminder",
    /// "unrecognized").
    pub intent: String,
    /// The spoken/written reply.
    pub reply: String,
    /// The reply synthesized to audio, base64-encoded. Absent when synthesis
    /// failed; the text reply still stands.
    pub audio_base64: Option<String>,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /voice/command - Execute a spoken command
///
/// The request body is raw PCM16 mono audio at 48 kHz, the same framing the
/// reminder watcher uses for its audio frames.
#[utoipa::path(
    post,
    path = "/voice/command",
    request_body(content_type = "application/octet-stream", description = "Raw PCM16 mono audio at 48 kHz."),
    responses(
        (status = 200, description = "Command processed", body = VoiceCommandResponse),
        (status = 400, description = "Empty audio payload"),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "Transcription service failed")
    )
)]
pub async fn voice_command_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Empty audio payload".to_string()));
    }

    let transcript = state.sst_adapter.transcribe_audio(&body).await.map_err(|e| {
        error!("Transcription failed: {:?}", e);
        (
            StatusCode::BAD_GATEWAY,
            "Could not transcribe the audio".to_string(),
        )
    })?;
    info!("Transcribed voice command: '{}'", transcript);

    let command = parse_command(&transcript);
    let (intent, reply) = execute_command(&state, user_id, &command).await?;

    // Synthesis failure is tolerated; the text reply is the contract.
    let audio_base64 = match state.tts_adapter.generate_audio(&reply).await {
        Ok(audio) => Some(base64::engine::general_purpose::STANDARD.encode(audio)),
        Err(e) => {
            warn!("Failed to synthesize voice reply: {:?}", e);
            None
        }
    };

    Ok(Json(VoiceCommandResponse {
        transcript,
        intent: intent.to_string(),
        reply,
        audio_base64,
    }))
}

/// Runs the parsed command against the schedule store and composes the reply.
async fn execute_command(
    state: &AppState,
    user_id: Uuid,
    command: &VoiceCommand,
) -> Result<(&'static str, String), (StatusCode, String)> {
    let internal = |e| {
        error!("Voice command failed against the store: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to execute command".to_string(),
        )
    };

    match command {
        VoiceCommand::ListMedicines => {
            let medicines = state.db.list_medicines(user_id).await.map_err(internal)?;
            let reply = if medicines.is_empty() {
                "You have no medicines in your schedule yet.".to_string()
            } else {
                let names: Vec<String> = medicines
                    .iter()
                    .map(|m| format!("{} ({})", m.name, m.dosage))
                    .collect();
                format!("Your medicines are: {}.", names.join(", "))
            };
            Ok(("list_medicines", reply))
        }
        VoiceCommand::CheckDue => {
            let medicines = state.db.list_medicines(user_id).await.map_err(internal)?;
            let reminders = state.db.list_reminders(user_id).await.map_err(internal)?;
            let report = evaluate_due(&medicines, &reminders, chrono::Local::now().time());
            Ok(("check_due", report.summary()))
        }
        VoiceCommand::AddReminder { medicine, time } => {
            let medicines = state.db.list_medicines(user_id).await.map_err(internal)?;
            let matched = medicines
                .iter()
                .find(|m| m.name.eq_ignore_ascii_case(medicine));

            match matched {
                Some(m) => {
                    state
                        .db
                        .add_reminder(user_id, m.id, *time, &m.dosage)
                        .await
                        .map_err(internal)?;
                    Ok((
                        "add_reminder",
                        format!(
                            "Reminder set for {} at {}.",
                            m.name,
                            time.format("%H:%M")
                        ),
                    ))
                }
                None => Ok((
                    "add_reminder",
                    format!(
                        "I couldn't find '{}' in your schedule. Add it first, then try again.",
                        medicine
                    ),
                )),
            }
        }
        VoiceCommand::Unrecognized => Ok((
            "unrecognized",
            "Sorry, I didn't catch that. You can ask me to list your medicines, \
             check what's due, or set a reminder."
                .to_string(),
        )),
    }
}
