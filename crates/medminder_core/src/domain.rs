//! crates/medminder_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

// Represents a user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub username: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A single medicine in a user's schedule, with time-of-day dose flags.
///
/// The `id` is the stable identity used for updates and deletes, so two
/// medicines with the same name never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct Medicine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub morning: bool,
    pub afternoon: bool,
    pub night: bool,
    pub dosage: String,
}

/// A timed reminder for a medicine already present in the user's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    /// Wall-clock time of day, minute resolution.
    pub time: NaiveTime,
    pub dosage: String,
}

/// The three dose periods a medicine can be flagged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DosePeriod {
    Morning,
    Afternoon,
    Night,
}

impl DosePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosePeriod::Morning => "Morning",
            DosePeriod::Afternoon => "Afternoon",
            DosePeriod::Night => "Night",
        }
    }
}

/// A reminder that fell inside the due window at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct DueReminder {
    pub reminder_id: Uuid,
    pub medicine_name: String,
    pub time: NaiveTime,
    pub dosage: String,
}

/// A medicine flagged for the dose period the evaluation time falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct DueDose {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
}

/// The result of evaluating a user's schedule against a point in time.
///
/// This is the structured source of truth for "is anything due now";
/// any language-model guidance is layered on top of it, never instead of it.
#[derive(Debug, Clone, Default)]
pub struct DueReport {
    pub period: Option<DosePeriod>,
    pub due_reminders: Vec<DueReminder>,
    pub period_medicines: Vec<DueDose>,
}

impl DueReport {
    pub fn is_empty(&self) -> bool {
        self.due_reminders.is_empty() && self.period_medicines.is_empty()
    }

    /// Renders the report as a short human-readable message, used both as
    /// the fallback when the guidance model is unavailable and as the text
    /// spoken by the reminder watcher.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No medicines scheduled for now.".to_string();
        }

        let mut parts = Vec::new();
        for r in &self.due_reminders {
            parts.push(format!(
                "It is time to take {} ({}) at {}.",
                r.medicine_name,
                r.dosage,
                r.time.format("%H:%M")
            ));
        }
        if let (Some(period), false) = (self.period, self.period_medicines.is_empty()) {
            let names: Vec<String> = self
                .period_medicines
                .iter()
                .map(|m| format!("{} ({})", m.medicine_name, m.dosage))
                .collect();
            parts.push(format!(
                "Scheduled for the {} period: {}.",
                period.as_str().to_lowercase(),
                names.join(", ")
            ));
        }
        parts.join(" ")
    }
}
