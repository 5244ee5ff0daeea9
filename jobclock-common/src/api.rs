use crate::domain::{Favorite, GeoFix, TimeEntry};
use time::OffsetDateTime;
use uuid::Uuid;

/// Uniform success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Uniform failure envelope. `code` carries the machine-readable auth
/// codes (USER_DELETED, USER_NOT_VERIFIED, ...) when one applies.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthCheckResponse {
    pub success: bool,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub environment: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub emp_code: String,
    #[serde(default)]
    pub emp_name: Option<String>,
    pub verified: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SignupRequest {
    pub emp_code: String,
    #[serde(default)]
    pub emp_name: Option<String>,
    pub password: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    pub emp_code: String,
    pub password: String,
    /// Extends the session from 24 hours to 7 days.
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct LoginResponse {
    pub session: String,
    pub user: UserInfo,
}

/// Body for POST /api/time-entries. The owning employee_code is injected
/// server-side from the session, never taken from the body.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AddEntryRequest {
    pub job_no: String,
    pub job_name: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub account_no: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Defaults to "active" when omitted.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_seconds: Option<i64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub start_location: Vec<GeoFix>,
    #[serde(default)]
    pub end_location: Vec<GeoFix>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AddEntryResponse {
    pub id: Uuid,
}

/// Body for PUT /api/time-entries/:id. Only the whitelisted fields exist
/// here; anything else in the payload is dropped at deserialization.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub job_no: Option<String>,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub employee_code: Option<String>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub account_no: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub spire_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_seconds: Option<i64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub start_location: Option<Vec<GeoFix>>,
    #[serde(default)]
    pub end_location: Option<Vec<GeoFix>>,
}

/// Optional final values for PUT /api/time-entries/:id/stop. When
/// total_seconds is omitted the server computes it from start_time.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct StopEntryRequest {
    #[serde(default)]
    pub total_seconds: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub end_location: Option<Vec<GeoFix>>,
}

pub type EntryResponse = ApiSuccess<TimeEntry>;
pub type EntryListResponse = ApiSuccess<Vec<TimeEntry>>;
pub type FavoritesResponse = ApiSuccess<Vec<Favorite>>;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AddFavoriteRequest {
    pub job_no: String,
    pub job_name: String,
    #[serde(default)]
    pub acc_no: Option<String>,
    #[serde(default)]
    pub acc_name: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct RemoveFavoriteRequest {
    pub job_no: String,
}

/// Normalized job row proxied from the ERP.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JobSummary {
    pub job_no: String,
    pub job_name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmployeeSummary {
    pub employee_code: String,
    pub employee_name: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccountSummary {
    pub account_no: String,
    pub account_name: String,
}
