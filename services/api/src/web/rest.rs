//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the informational endpoints and the master
//! definition for the OpenAPI specification.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use medminder_core::domain::DosePeriod;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        dashboard_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::schedule::add_medicine_handler,
        crate::web::schedule::list_medicines_handler,
        crate::web::schedule::update_medicine_handler,
        crate::web::schedule::delete_medicine_handler,
        crate::web::schedule::add_reminder_handler,
        crate::web::schedule::list_reminders_handler,
        crate::web::schedule::update_reminder_handler,
        crate::web::schedule::delete_reminder_handler,
        crate::web::documents::upload_prescription_handler,
        crate::web::documents::check_medicines_handler,
        crate::web::voice::voice_command_handler,
    ),
    components(
        schemas(
            AppInfo,
            DashboardResponse,
            PeriodGroup,
            PeriodMedicine,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            crate::web::schedule::MedicineRequest,
            crate::web::schedule::MedicineResponse,
            crate::web::schedule::CreateReminderRequest,
            crate::web::schedule::UpdateReminderRequest,
            crate::web::schedule::ReminderResponse,
            crate::web::documents::UploadResponse,
            crate::web::documents::CheckRequest,
            crate::web::documents::CheckResponse,
            crate::web::documents::DueReminderDto,
            crate::web::documents::DueDoseDto,
            crate::web::voice::VoiceCommandResponse,
        )
    ),
    tags(
        (name = "MedMinder API", description = "API endpoints for the medication reminder service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Serialize, ToSchema)]
pub struct PeriodMedicine {
    pub name: String,
    pub dosage: String,
}

#[derive(Serialize, ToSchema)]
pub struct PeriodGroup {
    pub period: String,
    pub medicines: Vec<PeriodMedicine>,
}

/// The quick-overview numbers plus the per-period schedule breakdown.
#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub total_medicines: usize,
    pub active_reminders: usize,
    pub periods: Vec<PeriodGroup>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET / - Application info
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Application info", body = AppInfo))
)]
pub async fn root_handler() -> impl IntoResponse {
    Json(AppInfo {
        name: "MedMinder".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Track, organize, and stay on top of your medication schedule.".to_string(),
    })
}

/// GET /dashboard - Schedule overview for the logged-in user
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard overview", body = DashboardResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let load_failed = |e| {
        error!("Failed to load dashboard data: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load dashboard".to_string(),
        )
    };

    let medicines = state.db.list_medicines(user_id).await.map_err(load_failed)?;
    let reminders = state.db.list_reminders(user_id).await.map_err(load_failed)?;

    let periods = [DosePeriod::Morning, DosePeriod::Afternoon, DosePeriod::Night]
        .into_iter()
        .map(|period| PeriodGroup {
            period: period.as_str().to_string(),
            medicines: medicines
                .iter()
                .filter(|m| match period {
                    DosePeriod::Morning => m.morning,
                    DosePeriod::Afternoon => m.afternoon,
                    DosePeriod::Night => m.night,
                })
                .map(|m| PeriodMedicine {
                    name: m.name.clone(),
                    dosage: m.dosage.clone(),
                })
                .collect(),
        })
        .collect();

    Ok(Json(DashboardResponse {
        total_medicines: medicines.len(),
        active_reminders: reminders.len(),
        periods,
    }))
}
