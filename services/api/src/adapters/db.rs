//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use medminder_core::domain::{Medicine, Reminder, User, UserCredentials};
use medminder_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_db_error(e: sqlx::Error, not_found: &str) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(not_found.to_string()),
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            PortError::AlreadyExists(db_err.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    username: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            username: self.username,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct MedicineRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    morning: bool,
    afternoon: bool,
    night: bool,
    dosage: String,
}
impl MedicineRecord {
    fn to_domain(self) -> Medicine {
        Medicine {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            morning: self.morning,
            afternoon: self.afternoon,
            night: self.night,
            dosage: self.dosage,
        }
    }
}

#[derive(FromRow)]
struct ReminderRecord {
    id: Uuid,
    user_id: Uuid,
    medicine_id: Uuid,
    medicine_name: String,
    remind_at: NaiveTime,
    dosage: String,
}
impl ReminderRecord {
    fn to_domain(self) -> Reminder {
        Reminder {
            id: self.id,
            user_id: self.user_id,
            medicine_id: self.medicine_id,
            medicine_name: self.medicine_name,
            time: self.remind_at,
            dosage: self.dosage,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let user_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (user_id, username, hashed_password) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(username)
        .bind(hashed_password)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "user"))?;

        Ok(User {
            user_id,
            username: username.to_string(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, username, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, &format!("User '{}' not found", username)))?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: (Uuid, DateTime<Utc>) = sqlx::query_as(
            "SELECT user_id, expires_at FROM auth_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|_| PortError::Unauthorized)?;

        if row.1 < Utc::now() {
            return Err(PortError::Unauthorized);
        }
        Ok(row.0)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn add_medicine(&self, medicine: Medicine) -> PortResult<Medicine> {
        let record = sqlx::query_as::<_, MedicineRecord>(
            "INSERT INTO medicines (id, user_id, name, morning, afternoon, night, dosage) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, name, morning, afternoon, night, dosage",
        )
        .bind(medicine.id)
        .bind(medicine.user_id)
        .bind(&medicine.name)
        .bind(medicine.morning)
        .bind(medicine.afternoon)
        .bind(medicine.night)
        .bind(&medicine.dosage)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn list_medicines(&self, user_id: Uuid) -> PortResult<Vec<Medicine>> {
        let records = sqlx::query_as::<_, MedicineRecord>(
            "SELECT id, user_id, name, morning, afternoon, night, dosage \
             FROM medicines WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_medicine_by_id(&self, user_id: Uuid, medicine_id: Uuid) -> PortResult<Medicine> {
        let record = sqlx::query_as::<_, MedicineRecord>(
            "SELECT id, user_id, name, morning, afternoon, night, dosage \
             FROM medicines WHERE id = $1 AND user_id = $2",
        )
        .bind(medicine_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, &format!("Medicine {} not found", medicine_id)))?;

        Ok(record.to_domain())
    }

    async fn update_medicine(&self, user_id: Uuid, medicine: Medicine) -> PortResult<Medicine> {
        let record = sqlx::query_as::<_, MedicineRecord>(
            "UPDATE medicines SET name = $1, morning = $2, afternoon = $3, night = $4, dosage = $5 \
             WHERE id = $6 AND user_id = $7 \
             RETURNING id, user_id, name, morning, afternoon, night, dosage",
        )
        .bind(&medicine.name)
        .bind(medicine.morning)
        .bind(medicine.afternoon)
        .bind(medicine.night)
        .bind(&medicine.dosage)
        .bind(medicine.id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, &format!("Medicine {} not found", medicine.id)))?;

        Ok(record.to_domain())
    }

    async fn delete_medicine(&self, user_id: Uuid, medicine_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1 AND user_id = $2")
            .bind(medicine_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Medicine {} not found",
                medicine_id
            )));
        }
        Ok(())
    }

    async fn add_reminder(
        &self,
        user_id: Uuid,
        medicine_id: Uuid,
        time: NaiveTime,
        dosage: &str,
    ) -> PortResult<Reminder> {
        // The medicine must exist and belong to the user.
        let medicine = self.get_medicine_by_id(user_id, medicine_id).await?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO reminders (id, user_id, medicine_id, remind_at, dosage) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(user_id)
        .bind(medicine_id)
        .bind(time)
        .bind(dosage)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Reminder {
            id,
            user_id,
            medicine_id,
            medicine_name: medicine.name,
            time,
            dosage: dosage.to_string(),
        })
    }

    async fn list_reminders(&self, user_id: Uuid) -> PortResult<Vec<Reminder>> {
        let records = sqlx::query_as::<_, ReminderRecord>(
            "SELECT r.id, r.user_id, r.medicine_id, m.name AS medicine_name, r.remind_at, r.dosage \
             FROM reminders r JOIN medicines m ON m.id = r.medicine_id \
             WHERE r.user_id = $1 ORDER BY r.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_reminder(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        time: NaiveTime,
        dosage: &str,
    ) -> PortResult<Reminder> {
        let record = sqlx::query_as::<_, ReminderRecord>(
            "UPDATE reminders r SET remind_at = $1, dosage = $2 \
             FROM medicines m \
             WHERE r.id = $3 AND r.user_id = $4 AND m.id = r.medicine_id \
             RETURNING r.id, r.user_id, r.medicine_id, m.name AS medicine_name, r.remind_at, r.dosage",
        )
        .bind(time)
        .bind(dosage)
        .bind(reminder_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, &format!("Reminder {} not found", reminder_id)))?;

        Ok(record.to_domain())
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1 AND user_id = $2")
            .bind(reminder_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Reminder {} not found",
                reminder_id
            )));
        }
        Ok(())
    }
}
