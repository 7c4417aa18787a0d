//! crates/medminder_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::{Medicine, Reminder, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Medicine Schedule ---
    async fn add_medicine(&self, medicine: Medicine) -> PortResult<Medicine>;

    /// Lists the user's medicines in creation order.
    async fn list_medicines(&self, user_id: Uuid) -> PortResult<Vec<Medicine>>;

    async fn update_medicine(&self, user_id: Uuid, medicine: Medicine) -> PortResult<Medicine>;

    async fn delete_medicine(&self, user_id: Uuid, medicine_id: Uuid) -> PortResult<()>;

    async fn get_medicine_by_id(&self, user_id: Uuid, medicine_id: Uuid) -> PortResult<Medicine>;

    // --- Reminders ---
    async fn add_reminder(
        &self,
        user_id: Uuid,
        medicine_id: Uuid,
        time: NaiveTime,
        dosage: &str,
    ) -> PortResult<Reminder>;

    async fn list_reminders(&self, user_id: Uuid) -> PortResult<Vec<Reminder>>;

    async fn update_reminder(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        time: NaiveTime,
        dosage: &str,
    ) -> PortResult<Reminder>;

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds a batch of text chunks into fixed-dimension vectors,
    /// one vector per input chunk, in input order.
    async fn embed(&self, texts: &[String]) -> PortResult<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait GuidanceService: Send + Sync {
    /// Asks the language model whether any medicine is due at `current_time`,
    /// given retrieved prescription context. Returns free-text guidance.
    async fn check_medicine_time(&self, current_time: &str, context: &str) -> PortResult<String>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes a slice of audio data into text.
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String>;
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates audio data from a string of text.
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>>;
}
