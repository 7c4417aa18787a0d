//! services/api/src/web/documents.rs
//!
//! Prescription upload and the due-medicine check.
//!
//! Uploading rebuilds the user's session-scoped similarity index from
//! scratch. The check endpoint answers from a structured time-window lookup
//! against the schedule store; retrieved prescription text and the guidance
//! model only add an explanation on top of that result.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveTime;
use medminder_core::{
    chunk::{split_text, CHUNK_OVERLAP, CHUNK_SIZE},
    index::DocumentIndex,
    schedule::evaluate_due,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::pdf::extract_pdf_text;
use crate::web::state::AppState;

/// The fixed retrieval query used when asking for guidance.
const RELEVANCE_QUERY: &str = "what medicine context is relevant";
/// Number of chunks retrieved as context for the guidance model.
const TOP_K: usize = 4;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// Number of chunks embedded into the new index.
    pub chunk_count: usize,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct CheckRequest {
    /// Optional "HH:MM" override of the evaluation time; defaults to now.
    pub at: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DueReminderDto {
    pub reminder_id: Uuid,
    pub medicine_name: String,
    pub time: String,
    pub dosage: String,
}

#[derive(Serialize, ToSchema)]
pub struct DueDoseDto {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
}

#[derive(Serialize, ToSchema)]
pub struct CheckResponse {
    pub checked_at: String,
    pub period: String,
    pub due_reminders: Vec<DueReminderDto>,
    pub period_medicines: Vec<DueDoseDto>,
    /// Human-readable rendering of the structured result.
    pub summary: String,
    /// Free-text guidance from the language model, present only when a
    /// prescription index is loaded and the model call succeeded.
    pub guidance: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /prescriptions - Upload a prescription PDF and build the session index
#[utoipa::path(
    post,
    path = "/prescriptions",
    request_body(content_type = "multipart/form-data", description = "The prescription PDF to upload."),
    responses(
        (status = 201, description = "PDF processed and indexed", body = UploadResponse),
        (status = 400, description = "Missing file or malformed PDF"),
        (status = 422, description = "The PDF contains no extractable text"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn upload_prescription_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Multipart form must include a PDF file".to_string(),
        ))?;

    let pdf_bytes = field.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read file bytes: {}", e),
        )
    })?;

    let text = extract_pdf_text(&pdf_bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    if text.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "The PDF contains no extractable text".to_string(),
        ));
    }

    let chunks = split_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);
    let vectors = state.embedding_adapter.embed(&chunks).await.map_err(|e| {
        error!("Failed to embed prescription chunks: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to embed document".to_string(),
        )
    })?;

    let index = DocumentIndex::new(chunks, vectors).map_err(|e| {
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    let chunk_count = index.len();
    info!(
        "Built prescription index with {} chunks for user {}",
        chunk_count, user_id
    );

    // Replaces any previous index; each upload rebuilds from scratch.
    state.store_index(user_id, index).await;

    Ok((StatusCode::CREATED, Json(UploadResponse { chunk_count })))
}

/// POST /prescriptions/check - Check whether any medicine is due now
#[utoipa::path(
    post,
    path = "/prescriptions/check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Due-medicine report", body = CheckResponse),
        (status = 400, description = "Invalid time override"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn check_medicines_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CheckRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let now = match &req.at {
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("'{}' is not a valid HH:MM time", raw),
            )
        })?,
        None => chrono::Local::now().time(),
    };

    let medicines = state.db.list_medicines(user_id).await.map_err(|e| {
        error!("Failed to list medicines: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load schedule".to_string(),
        )
    })?;
    let reminders = state.db.list_reminders(user_id).await.map_err(|e| {
        error!("Failed to list reminders: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load reminders".to_string(),
        )
    })?;

    let report = evaluate_due(&medicines, &reminders, now);

    // The guidance model is explanation only. Any failure is caught here and
    // the structured report is returned on its own.
    let guidance = match state.get_index(user_id).await {
        Some(index) => match guidance_for(&state, &index, now).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Guidance call failed, returning structured report: {:?}", e);
                None
            }
        },
        None => None,
    };

    let response = CheckResponse {
        checked_at: now.format("%H:%M").to_string(),
        period: report
            .period
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
        due_reminders: report
            .due_reminders
            .iter()
            .map(|r| DueReminderDto {
                reminder_id: r.reminder_id,
                medicine_name: r.medicine_name.clone(),
                time: r.time.format("%H:%M").to_string(),
                dosage: r.dosage.clone(),
            })
            .collect(),
        period_medicines: report
            .period_medicines
            .iter()
            .map(|m| DueDoseDto {
                medicine_id: m.medicine_id,
                medicine_name: m.medicine_name.clone(),
                dosage: m.dosage.clone(),
            })
            .collect(),
        summary: report.summary(),
        guidance,
    };

    Ok(Json(response))
}

/// Retrieves the most relevant prescription chunks and asks the guidance
/// model whether anything is due at `now`.
async fn guidance_for(
    state: &AppState,
    index: &DocumentIndex,
    now: NaiveTime,
) -> medminder_core::ports::PortResult<String> {
    let query_vectors = state
        .embedding_adapter
        .embed(&[RELEVANCE_QUERY.to_string()])
        .await?;
    let query = query_vectors.first().ok_or_else(|| {
        medminder_core::ports::PortError::Unexpected("Empty query embedding".to_string())
    })?;

    let context = index
        .search(query, TOP_K)
        .into_iter()
        .map(|c| c.text)
        .collect::<Vec<_>>()
        .join("\n\n");

    let current_time = now.format("%I:%M %p").to_string();
    state
        .guidance_adapter
        .check_medicine_time(&current_time, &context)
        .await
}
