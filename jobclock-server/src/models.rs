use jobclock_common::domain::{EntryStatus, Favorite, GeoFix, TimeEntry};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

// start_time/end_time/created_at/updated_at/expires_at -> unix seconds
// start_location/end_location/favorites -> json text columns

fn decode<E>(err: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(err.into())
}

fn timestamp(row: &SqliteRow, column: &str) -> sqlx::Result<OffsetDateTime> {
    let raw: i64 = row.try_get(column)?;
    OffsetDateTime::from_unix_timestamp(raw).map_err(decode)
}

fn fixes(row: &SqliteRow, column: &str) -> sqlx::Result<Vec<GeoFix>> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(v) if !v.is_empty() => serde_json::from_str(&v).map_err(decode),
        _ => Ok(vec![]),
    }
}

pub struct DbTimeEntry(pub TimeEntry);

impl<'r> FromRow<'r, SqliteRow> for DbTimeEntry {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let end_time: Option<i64> = row.try_get("end_time")?;

        Ok(Self(TimeEntry {
            id: row
                .try_get("id")
                .and_then(|x: &str| Uuid::parse_str(x).map_err(decode))?,
            job_no: row.try_get("job_no")?,
            job_name: row.try_get("job_name")?,
            employee_code: row.try_get("employee_code")?,
            employee_name: row.try_get("employee_name")?,
            account_no: row.try_get("account_no")?,
            account_name: row.try_get("account_name")?,
            start_time: timestamp(row, "start_time")?,
            end_time: end_time
                .map(OffsetDateTime::from_unix_timestamp)
                .transpose()
                .map_err(decode)?,
            total_seconds: row.try_get("total_seconds")?,
            comment: row.try_get("comment")?,
            status: row
                .try_get("status")
                .and_then(|x: &str| EntryStatus::from_str(x).map_err(decode))?,
            spire_status: row.try_get("spire_status")?,
            start_location: fixes(row, "start_location")?,
            end_location: fixes(row, "end_location")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

/// Fields for a new time entry once the handler has normalized the
/// request and injected the owner from the session.
#[derive(Debug)]
pub struct NewTimeEntry {
    pub job_no: String,
    pub job_name: String,
    pub employee_code: String,
    pub employee_name: Option<String>,
    pub account_no: Option<String>,
    pub account_name: Option<String>,
    pub comment: Option<String>,
    pub status: EntryStatus,
    pub total_seconds: i64,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub start_location: Vec<GeoFix>,
    pub end_location: Vec<GeoFix>,
}

/// Whitelisted partial update. Anything not in here cannot be changed
/// through the api.
#[derive(Debug, Default)]
pub struct EntryPatch {
    pub job_no: Option<String>,
    pub job_name: Option<String>,
    pub employee_code: Option<String>,
    pub employee_name: Option<String>,
    pub account_no: Option<String>,
    pub account_name: Option<String>,
    pub comment: Option<String>,
    pub spire_status: Option<String>,
    pub status: Option<EntryStatus>,
    pub total_seconds: Option<i64>,
    pub start_time: Option<OffsetDateTime>,
    pub start_location: Option<Vec<GeoFix>>,
    pub end_location: Option<Vec<GeoFix>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.job_no.is_none()
            && self.job_name.is_none()
            && self.employee_code.is_none()
            && self.employee_name.is_none()
            && self.account_no.is_none()
            && self.account_name.is_none()
            && self.comment.is_none()
            && self.spire_status.is_none()
            && self.status.is_none()
            && self.total_seconds.is_none()
            && self.start_time.is_none()
            && self.start_location.is_none()
            && self.end_location.is_none()
    }
}

/// Final values attached to the terminal stop call.
#[derive(Debug, Default)]
pub struct StopFinal {
    pub total_seconds: Option<i64>,
    pub comment: Option<String>,
    pub end_location: Option<Vec<GeoFix>>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub emp_code: String,
    pub emp_name: Option<String>,
    pub password: String,
    pub verified: bool,
    pub favorites: Vec<Favorite>,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let favorites: Option<String> = row.try_get("favorites")?;
        let favorites = match favorites {
            Some(v) if !v.is_empty() => serde_json::from_str(&v).map_err(decode)?,
            _ => vec![],
        };

        Ok(Self {
            id: row
                .try_get("id")
                .and_then(|x: &str| Uuid::parse_str(x).map_err(decode))?,
            emp_code: row.try_get("emp_code")?,
            emp_name: row.try_get("emp_name")?,
            password: row.try_get("password")?,
            verified: row.try_get("verified")?,
            favorites,
            created: timestamp(row, "created")?,
            updated: timestamp(row, "updated")?,
        })
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub emp_code: String,
    pub emp_name: Option<String>,
    /// Argon2 PHC string, hashed before it reaches the store.
    pub password: String,
}

#[derive(Debug)]
pub struct Session {
    pub user_id: Uuid,
    pub emp_code: String,
    pub verified: bool,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl<'r> FromRow<'r, SqliteRow> for Session {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            user_id: row
                .try_get("user_id")
                .and_then(|x: &str| Uuid::parse_str(x).map_err(decode))?,
            emp_code: row.try_get("emp_code")?,
            verified: row.try_get("verified")?,
            token: row.try_get("token")?,
            expires_at: timestamp(row, "expires_at")?,
        })
    }
}

#[derive(Debug)]
pub struct NewSession {
    pub user_id: Uuid,
    pub emp_code: String,
    pub verified: bool,
    pub token: String,
    pub expires_at: OffsetDateTime,
}
