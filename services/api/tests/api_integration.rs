//! services/api/tests/api_integration.rs
//!
//! End-to-end tests for the HTTP API, run against the real router with
//! in-memory implementations of the service ports. No database or external
//! API is needed.

use api_lib::config::Config;
use api_lib::web::{api_router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveTime, Utc};
use medminder_core::domain::{Medicine, Reminder, User, UserCredentials};
use medminder_core::index::DocumentIndex;
use medminder_core::ports::{
    DatabaseService, EmbeddingService, GuidanceService, PortError, PortResult,
    SpeechToTextService, TextToSpeechService,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::Level;
use uuid::Uuid;

//=========================================================================================
// In-memory port implementations
//=========================================================================================

#[derive(Default)]
struct MockDbInner {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, Uuid>,
    medicines: Vec<Medicine>,
    reminders: Vec<Reminder>,
}

#[derive(Default)]
struct MockDb {
    inner: Mutex<MockDbInner>,
}

#[async_trait]
impl DatabaseService for MockDb {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.username == username) {
            return Err(PortError::AlreadyExists(username.to_string()));
        }
        let user_id = Uuid::new_v4();
        inner.users.push(UserCredentials {
            user_id,
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(User {
            user_id,
            username: username.to_string(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(username.to_string()))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(session_id.to_string(), user_id);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .copied()
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.inner.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn add_medicine(&self, medicine: Medicine) -> PortResult<Medicine> {
        self.inner.lock().unwrap().medicines.push(medicine.clone());
        Ok(medicine)
    }

    async fn list_medicines(&self, user_id: Uuid) -> PortResult<Vec<Medicine>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .medicines
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_medicine(&self, user_id: Uuid, medicine: Medicine) -> PortResult<Medicine> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .medicines
            .iter_mut()
            .find(|m| m.id == medicine.id && m.user_id == user_id)
            .ok_or_else(|| PortError::NotFound("medicine".to_string()))?;
        *slot = medicine.clone();
        Ok(medicine)
    }

    async fn delete_medicine(&self, user_id: Uuid, medicine_id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.medicines.len();
        inner
            .medicines
            .retain(|m| !(m.id == medicine_id && m.user_id == user_id));
        if inner.medicines.len() == before {
            return Err(PortError::NotFound("medicine".to_string()));
        }
        // Reminders are removed with their medicine.
        inner.reminders.retain(|r| r.medicine_id != medicine_id);
        Ok(())
    }

    async fn get_medicine_by_id(&self, user_id: Uuid, medicine_id: Uuid) -> PortResult<Medicine> {
        self.inner
            .lock()
            .unwrap()
            .medicines
            .iter()
            .find(|m| m.id == medicine_id && m.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("medicine".to_string()))
    }

    async fn add_reminder(
        &self,
        user_id: Uuid,
        medicine_id: Uuid,
        time: NaiveTime,
        dosage: &str,
    ) -> PortResult<Reminder> {
        let mut inner = self.inner.lock().unwrap();
        let medicine_name = inner
            .medicines
            .iter()
            .find(|m| m.id == medicine_id && m.user_id == user_id)
            .map(|m| m.name.clone())
            .ok_or_else(|| PortError::NotFound("medicine".to_string()))?;
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id,
            medicine_id,
            medicine_name,
            time,
            dosage: dosage.to_string(),
        };
        inner.reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn list_reminders(&self, user_id: Uuid) -> PortResult<Vec<Reminder>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_reminder(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        time: NaiveTime,
        dosage: &str,
    ) -> PortResult<Reminder> {
        let mut inner = self.inner.lock().unwrap();
        let reminder = inner
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder_id && r.user_id == user_id)
            .ok_or_else(|| PortError::NotFound("reminder".to_string()))?;
        reminder.time = time;
        reminder.dosage = dosage.to_string();
        Ok(reminder.clone())
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.reminders.len();
        inner
            .reminders
            .retain(|r| !(r.id == reminder_id && r.user_id == user_id));
        if inner.reminders.len() == before {
            return Err(PortError::NotFound("reminder".to_string()));
        }
        Ok(())
    }
}

struct MockEmbedding;

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed(&self, texts: &[String]) -> PortResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

struct MockGuidance;

#[async_trait]
impl GuidanceService for MockGuidance {
    async fn check_medicine_time(&self, current_time: &str, _context: &str) -> PortResult<String> {
        Ok(format!("Checked your prescription at {}.", current_time))
    }
}

struct MockStt {
    transcript: String,
}

#[async_trait]
impl SpeechToTextService for MockStt {
    async fn transcribe_audio(&self, _audio_data: &[u8]) -> PortResult<String> {
        Ok(self.transcript.clone())
    }
}

struct MockTts;

#[async_trait]
impl TextToSpeechService for MockTts {
    async fn generate_audio(&self, _text: &str) -> PortResult<Vec<u8>> {
        Ok(vec![1, 2, 3, 4])
    }
}

//=========================================================================================
// Test harness
//=========================================================================================

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: Level::INFO,
        openai_api_key: None,
        embedding_model: "test-embedding".to_string(),
        guidance_model: "test-guidance".to_string(),
        sst_model: "test-sst".to_string(),
        tts_voice: "alloy".to_string(),
        check_interval_secs: 60,
    }
}

fn test_state(transcript: &str) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(MockDb::default()),
        Arc::new(test_config()),
        Arc::new(MockEmbedding),
        Arc::new(MockGuidance),
        Arc::new(MockStt {
            transcript: transcript.to_string(),
        }),
        Arc::new(MockTts),
    ))
}

fn test_app() -> (Router, Arc<AppState>) {
    let state = test_state("what are my medicines");
    (api_router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Signs up a fresh user and returns the `session=<id>` cookie pair.
async fn signup(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": username, "password": "hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("signup must set a session cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

async fn add_medicine(app: &Router, cookie: &str, name: &str, morning: bool) -> Uuid {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/medicines",
            Some(cookie),
            json!({
                "name": name,
                "morning": morning,
                "night": false,
                "dosage": "1 tablet"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn signup_then_duplicate_username_conflicts() {
    let (app, _) = test_app();
    signup(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": "alice", "password": "other" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The rejected duplicate must not have touched the account: the first
    // password still logs in, the attempted one never does.
    let first_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "alice", "password": "hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(first_password.status(), StatusCode::OK);

    let attempted_password = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "alice", "password": "other" }),
        ))
        .await
        .unwrap();
    assert_eq!(attempted_password.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_empty_credentials() {
    let (app, _) = test_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": "  ", "password": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user_alike() {
    let (app, _) = test_app();
    signup(&app, "bob").await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "bob", "password": "not-hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown_user = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "nobody", "password": "hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_correct_password_sets_session() {
    let (app, _) = test_app();
    signup(&app, "carol").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "carol", "password": "hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let body = body_json(response).await;
    assert_eq!(body["username"], "carol");
}

#[tokio::test]
async fn login_trims_username_the_same_way_signup_does() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": "  pam  ", "password": "hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Both the padded string the user typed and the stored trimmed form work.
    for username in ["  pam  ", "pam"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                json!({ "username": username, "password": "hunter2" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (app, _) = test_app();
    let cookie = signup(&app, "dave").await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/medicines")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/medicines")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

//=========================================================================================
// Schedule CRUD
//=========================================================================================

#[tokio::test]
async fn medicine_crud_round_trip() {
    let (app, _) = test_app();
    let cookie = signup(&app, "erin").await;
    let id = add_medicine(&app, &cookie, "Aspirin", true).await;

    let list = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/medicines")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(list).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Aspirin");
    assert_eq!(body[0]["morning"], true);

    let update = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/medicines/{}", id),
            Some(&cookie),
            json!({
                "name": "Aspirin",
                "morning": false,
                "night": true,
                "dosage": "2 tablets"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::OK);
    let updated = body_json(update).await;
    assert_eq!(updated["night"], true);
    assert_eq!(updated["dosage"], "2 tablets");

    let delete = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/medicines/{}", id))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::NO_CONTENT);

    let empty = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/medicines")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(empty).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_unknown_medicine_is_not_found() {
    let (app, _) = test_app();
    let cookie = signup(&app, "frank").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/medicines/{}", Uuid::new_v4()))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_cannot_touch_each_others_medicines() {
    let (app, _) = test_app();
    let cookie_a = signup(&app, "grace").await;
    let cookie_b = signup(&app, "heidi").await;
    let id = add_medicine(&app, &cookie_a, "Metformin", true).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/medicines/{}", id))
                .header(header::COOKIE, &cookie_b)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reminder_defaults_dosage_from_the_medicine() {
    let (app, _) = test_app();
    let cookie = signup(&app, "ivan").await;
    let id = add_medicine(&app, &cookie, "Lisinopril", true).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reminders",
            Some(&cookie),
            json!({ "medicine_id": id, "time": "08:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["medicine_name"], "Lisinopril");
    assert_eq!(body["time"], "08:00");
    assert_eq!(body["dosage"], "1 tablet");
}

#[tokio::test]
async fn reminder_rejects_invalid_time_and_unknown_medicine() {
    let (app, _) = test_app();
    let cookie = signup(&app, "judy").await;
    let id = add_medicine(&app, &cookie, "Aspirin", true).await;

    let bad_time = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reminders",
            Some(&cookie),
            json!({ "medicine_id": id, "time": "25:99" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad_time.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .oneshot(json_request(
            "POST",
            "/reminders",
            Some(&cookie),
            json!({ "medicine_id": Uuid::new_v4(), "time": "08:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reminder_update_changes_time_and_dosage() {
    let (app, _) = test_app();
    let cookie = signup(&app, "mallory").await;
    let id = add_medicine(&app, &cookie, "Aspirin", true).await;

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reminders",
            Some(&cookie),
            json!({ "medicine_id": id, "time": "08:00" }),
        ))
        .await
        .unwrap();
    let reminder_id = body_json(created).await["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/reminders/{}", reminder_id),
            Some(&cookie),
            json!({ "time": "21:30", "dosage": "half a tablet" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["time"], "21:30");
    assert_eq!(body["dosage"], "half a tablet");
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[tokio::test]
async fn dashboard_groups_medicines_by_period() {
    let (app, _) = test_app();
    let cookie = signup(&app, "nina").await;
    let id = add_medicine(&app, &cookie, "Aspirin", true).await;
    add_medicine(&app, &cookie, "Melatonin", false).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/reminders",
            Some(&cookie),
            json!({ "medicine_id": id, "time": "08:00" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/dashboard")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_medicines"], 2);
    assert_eq!(body["active_reminders"], 1);

    let periods = body["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 3);
    assert_eq!(periods[0]["period"], "Morning");
    assert_eq!(periods[0]["medicines"][0]["name"], "Aspirin");
    assert!(periods[2]["medicines"].as_array().unwrap().is_empty());
}

//=========================================================================================
// Due-medicine check
//=========================================================================================

#[tokio::test]
async fn check_reports_reminders_inside_the_due_window() {
    let (app, _) = test_app();
    let cookie = signup(&app, "oscar").await;
    let id = add_medicine(&app, &cookie, "Aspirin", true).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/reminders",
            Some(&cookie),
            json!({ "medicine_id": id, "time": "08:00" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/prescriptions/check",
            Some(&cookie),
            json!({ "at": "08:02" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["checked_at"], "08:02");
    assert_eq!(body["period"], "Morning");
    assert_eq!(body["due_reminders"].as_array().unwrap().len(), 1);
    assert_eq!(body["due_reminders"][0]["medicine_name"], "Aspirin");
    assert_eq!(body["period_medicines"][0]["medicine_name"], "Aspirin");
    // No prescription uploaded, so there is no model guidance.
    assert!(body["guidance"].is_null());
}

#[tokio::test]
async fn check_outside_any_scheduled_period_reports_nothing() {
    let (app, _) = test_app();
    let cookie = signup(&app, "peggy").await;
    add_medicine(&app, &cookie, "Aspirin", true).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/prescriptions/check",
            Some(&cookie),
            json!({ "at": "03:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["period"], "Night");
    assert!(body["due_reminders"].as_array().unwrap().is_empty());
    assert!(body["period_medicines"].as_array().unwrap().is_empty());
    assert_eq!(body["summary"], "No medicines scheduled for now.");
}

#[tokio::test]
async fn check_adds_guidance_once_an_index_is_loaded() {
    let (app, state) = test_app();
    let cookie = signup(&app, "quentin").await;
    add_medicine(&app, &cookie, "Aspirin", true).await;

    // Plant an index directly, as if a prescription had been uploaded.
    let session = cookie.strip_prefix("session=").unwrap();
    let user_id = state.db.validate_auth_session(session).await.unwrap();
    let index = DocumentIndex::new(
        vec!["Take one aspirin every morning with food.".to_string()],
        vec![vec![1.0, 0.0, 0.0]],
    )
    .unwrap();
    state.store_index(user_id, index).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/prescriptions/check",
            Some(&cookie),
            json!({ "at": "08:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["guidance"], "Checked your prescription at 08:00 AM.");
}

/// Assembles a syntactically valid single-page PDF whose page carries no
/// content stream, so text extraction succeeds but yields nothing.
fn minimal_textless_pdf() -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    let objects = [
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n",
        "2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n",
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n",
    ];
    let mut offsets = Vec::new();
    for obj in objects {
        offsets.push(out.len());
        out.extend_from_slice(obj.as_bytes());
    }

    let xref_pos = out.len();
    let mut xref = String::from("xref\n0 4\n0000000000 65535 f \n");
    for offset in &offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.extend_from_slice(xref.as_bytes());
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            xref_pos
        )
        .as_bytes(),
    );
    out
}

fn multipart_pdf_request(cookie: &str, pdf_bytes: Vec<u8>) -> Request<Body> {
    let boundary = "test-boundary";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"rx.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend_from_slice(&pdf_bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/prescriptions")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_rejects_a_pdf_with_no_extractable_text() {
    let (app, state) = test_app();
    let cookie = signup(&app, "wendy").await;

    let response = app
        .oneshot(multipart_pdf_request(&cookie, minimal_textless_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The failed ingest must not leave an empty index behind.
    let session = cookie.strip_prefix("session=").unwrap();
    let user_id = state.db.validate_auth_session(session).await.unwrap();
    assert!(state.get_index(user_id).await.is_none());
}

#[tokio::test]
async fn upload_rejects_a_malformed_pdf() {
    let (app, _) = test_app();
    let cookie = signup(&app, "ruth").await;

    let response = app
        .oneshot(multipart_pdf_request(&cookie, b"this is not a pdf".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Voice commands
//=========================================================================================

#[tokio::test]
async fn voice_command_lists_medicines() {
    let (app, _) = test_app();
    let cookie = signup(&app, "sybil").await;
    add_medicine(&app, &cookie, "Aspirin", true).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice/command")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from(vec![0u8; 16]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["transcript"], "what are my medicines");
    assert_eq!(body["intent"], "list_medicines");
    assert!(body["reply"].as_str().unwrap().contains("Aspirin"));
    assert!(body["audio_base64"].is_string());
}

#[tokio::test]
async fn voice_command_sets_a_reminder_by_name() {
    let state = test_state("remind me to take aspirin at 8:30 pm");
    let app = api_router(state);
    let cookie = signup(&app, "trent").await;
    add_medicine(&app, &cookie, "Aspirin", true).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice/command")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from(vec![0u8; 16]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["intent"], "add_reminder");
    assert!(body["reply"].as_str().unwrap().contains("20:30"));

    let reminders = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/reminders")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(reminders).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["time"], "20:30");
}

#[tokio::test]
async fn voice_command_rejects_empty_audio() {
    let (app, _) = test_app();
    let cookie = signup(&app, "victor").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice/command")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
