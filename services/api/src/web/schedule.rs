//! services/api/src/web/schedule.rs
//!
//! Axum handlers for the medication schedule and reminder CRUD endpoints.
//! Updates and deletes key on the generated id, never on the medicine name,
//! so duplicate names cannot make an edit ambiguous.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveTime;
use medminder_core::domain::{Medicine, Reminder};
use medminder_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct MedicineRequest {
    pub name: String,
    #[serde(default)]
    pub morning: bool,
    #[serde(default)]
    pub afternoon: bool,
    #[serde(default)]
    pub night: bool,
    pub dosage: String,
}

#[derive(Serialize, ToSchema)]
pub struct MedicineResponse {
    pub id: Uuid,
    pub name: String,
    pub morning: bool,
    pub afternoon: bool,
    pub night: bool,
    pub dosage: String,
}

impl From<Medicine> for MedicineResponse {
    fn from(m: Medicine) -> Self {
        Self {
            id: m.id,
            name: m.name,
            morning: m.morning,
            afternoon: m.afternoon,
            night: m.night,
            dosage: m.dosage,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateReminderRequest {
    pub medicine_id: Uuid,
    /// Wall-clock time in "HH:MM" form.
    pub time: String,
    /// Defaults to the medicine's dosage when omitted.
    pub dosage: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReminderRequest {
    pub time: String,
    pub dosage: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReminderResponse {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub time: String,
    pub dosage: String,
}

impl From<Reminder> for ReminderResponse {
    fn from(r: Reminder) -> Self {
        Self {
            id: r.id,
            medicine_id: r.medicine_id,
            medicine_name: r.medicine_name,
            time: r.time.format("%H:%M").to_string(),
            dosage: r.dosage,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn validate_medicine(req: &MedicineRequest) -> Result<(), (StatusCode, String)> {
    if req.name.trim().is_empty() || req.dosage.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a valid medicine name and dosage".to_string(),
        ));
    }
    Ok(())
}

fn parse_time(raw: &str) -> Result<NaiveTime, (StatusCode, String)> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a valid HH:MM time", raw),
        )
    })
}

fn port_error_response(e: PortError, context: &str) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        other => {
            error!("{}: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

//=========================================================================================
// Medicine Handlers
//=========================================================================================

/// POST /medicines - Add a medicine to the schedule
#[utoipa::path(
    post,
    path = "/medicines",
    request_body = MedicineRequest,
    responses(
        (status = 201, description = "Medicine added", body = MedicineResponse),
        (status = 400, description = "Missing name or dosage"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn add_medicine_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<MedicineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_medicine(&req)?;

    let medicine = Medicine {
        id: Uuid::new_v4(),
        user_id,
        name: req.name.trim().to_string(),
        morning: req.morning,
        afternoon: req.afternoon,
        night: req.night,
        dosage: req.dosage.trim().to_string(),
    };

    let created = state
        .db
        .add_medicine(medicine)
        .await
        .map_err(|e| port_error_response(e, "Failed to add medicine"))?;

    Ok((StatusCode::CREATED, Json(MedicineResponse::from(created))))
}

/// GET /medicines - List the user's medicine schedule
#[utoipa::path(
    get,
    path = "/medicines",
    responses(
        (status = 200, description = "The user's schedule", body = [MedicineResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_medicines_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let medicines = state
        .db
        .list_medicines(user_id)
        .await
        .map_err(|e| port_error_response(e, "Failed to list medicines"))?;

    let body: Vec<MedicineResponse> = medicines.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// PUT /medicines/{id} - Update a medicine by its stable id
#[utoipa::path(
    put,
    path = "/medicines/{id}",
    request_body = MedicineRequest,
    params(("id" = Uuid, Path, description = "Medicine id")),
    responses(
        (status = 200, description = "Medicine updated", body = MedicineResponse),
        (status = 404, description = "No such medicine for this user"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn update_medicine_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<MedicineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_medicine(&req)?;

    let medicine = Medicine {
        id,
        user_id,
        name: req.name.trim().to_string(),
        morning: req.morning,
        afternoon: req.afternoon,
        night: req.night,
        dosage: req.dosage.trim().to_string(),
    };

    let updated = state
        .db
        .update_medicine(user_id, medicine)
        .await
        .map_err(|e| port_error_response(e, "Failed to update medicine"))?;

    Ok(Json(MedicineResponse::from(updated)))
}

/// DELETE /medicines/{id} - Remove a medicine (and its reminders) by id
#[utoipa::path(
    delete,
    path = "/medicines/{id}",
    params(("id" = Uuid, Path, description = "Medicine id")),
    responses(
        (status = 204, description = "Medicine deleted"),
        (status = 404, description = "No such medicine for this user"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn delete_medicine_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_medicine(user_id, id)
        .await
        .map_err(|e| port_error_response(e, "Failed to delete medicine"))?;

    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Reminder Handlers
//=========================================================================================

/// POST /reminders - Set a reminder for a medicine already in the schedule
#[utoipa::path(
    post,
    path = "/reminders",
    request_body = CreateReminderRequest,
    responses(
        (status = 201, description = "Reminder set", body = ReminderResponse),
        (status = 400, description = "Invalid time"),
        (status = 404, description = "No such medicine for this user"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn add_reminder_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let time = parse_time(&req.time)?;

    // Dosage defaults from the medicine itself when the request omits it.
    let dosage = match req.dosage {
        Some(d) if !d.trim().is_empty() => d.trim().to_string(),
        _ => {
            state
                .db
                .get_medicine_by_id(user_id, req.medicine_id)
                .await
                .map_err(|e| port_error_response(e, "Failed to look up medicine"))?
                .dosage
        }
    };

    let reminder = state
        .db
        .add_reminder(user_id, req.medicine_id, time, &dosage)
        .await
        .map_err(|e| port_error_response(e, "Failed to set reminder"))?;

    Ok((StatusCode::CREATED, Json(ReminderResponse::from(reminder))))
}

/// GET /reminders - List the user's reminders
#[utoipa::path(
    get,
    path = "/reminders",
    responses(
        (status = 200, description = "The user's reminders", body = [ReminderResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_reminders_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let reminders = state
        .db
        .list_reminders(user_id)
        .await
        .map_err(|e| port_error_response(e, "Failed to list reminders"))?;

    let body: Vec<ReminderResponse> = reminders.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// PUT /reminders/{id} - Update a reminder's time and dosage by id
#[utoipa::path(
    put,
    path = "/reminders/{id}",
    request_body = UpdateReminderRequest,
    params(("id" = Uuid, Path, description = "Reminder id")),
    responses(
        (status = 200, description = "Reminder updated", body = ReminderResponse),
        (status = 404, description = "No such reminder for this user"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn update_reminder_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReminderRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let time = parse_time(&req.time)?;
    if req.dosage.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Dosage is required".to_string()));
    }

    let updated = state
        .db
        .update_reminder(user_id, id, time, req.dosage.trim())
        .await
        .map_err(|e| port_error_response(e, "Failed to update reminder"))?;

    Ok(Json(ReminderResponse::from(updated)))
}

/// DELETE /reminders/{id} - Remove a reminder by id
#[utoipa::path(
    delete,
    path = "/reminders/{id}",
    params(("id" = Uuid, Path, description = "Reminder id")),
    responses(
        (status = 204, description = "Reminder deleted"),
        (status = 404, description = "No such reminder for this user"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn delete_reminder_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_reminder(user_id, id)
        .await
        .map_err(|e| port_error_response(e, "Failed to delete reminder"))?;

    Ok(StatusCode::NO_CONTENT)
}
