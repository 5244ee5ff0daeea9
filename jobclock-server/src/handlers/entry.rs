use crate::authentication::AuthedUser;
use crate::error::ServerError;
use crate::handlers::db_error;
use crate::models::{EntryPatch, NewTimeEntry, StopFinal};
use crate::router::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use jobclock_common::api::{
    AddEntryRequest, AddEntryResponse, ApiSuccess, EntryListResponse, EntryResponse,
    StopEntryRequest, UpdateEntryRequest,
};
use jobclock_common::domain::EntryStatus;
use time::OffsetDateTime;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

pub async fn list(
    user: AuthedUser,
    state: State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let entries = state
        .database
        .list_entries(limit, Some(&user.emp_code))
        .await
        .map_err(|e| db_error(e, "Time entry not found"))?;

    Ok(Json(ApiSuccess::new(entries)))
}

pub async fn active(
    user: AuthedUser,
    state: State<AppState>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let entries = state
        .database
        .active_entries(Some(&user.emp_code))
        .await
        .map_err(|e| db_error(e, "Time entry not found"))?;

    Ok(Json(ApiSuccess::new(entries)))
}

pub async fn get_one(
    user: AuthedUser,
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryResponse>, ServerError> {
    let entry = state
        .database
        .entry(id, Some(&user.emp_code))
        .await
        .map_err(|e| db_error(e, "Time entry not found"))?;

    Ok(Json(ApiSuccess::new(entry)))
}

pub async fn create(
    user: AuthedUser,
    state: State<AppState>,
    Json(req): Json<AddEntryRequest>,
) -> Result<Json<ApiSuccess<AddEntryResponse>>, ServerError> {
    if req.job_no.trim().is_empty() {
        return Err(ServerError::Validation("job_no is required"));
    }

    let status = match req.status.as_deref() {
        None => EntryStatus::Active,
        Some(raw) => raw
            .parse()
            .map_err(|_| ServerError::Validation("Unknown entry status"))?,
    };

    let now = OffsetDateTime::now_utc();
    let entry = NewTimeEntry {
        job_no: req.job_no,
        job_name: req.job_name,
        // the owner always comes from the session, never the body
        employee_code: user.emp_code.clone(),
        employee_name: req.employee_name,
        account_no: req.account_no,
        account_name: req.account_name,
        comment: req.comment,
        status,
        total_seconds: req.total_seconds.unwrap_or(0).max(0),
        start_time: req.start_time.unwrap_or(now),
        end_time: match (status, req.end_time) {
            // a manual back-fill lands already closed
            (EntryStatus::Completed, None) => Some(now),
            (_, end_time) => end_time,
        },
        start_location: req.start_location,
        end_location: req.end_location,
    };

    let id = state
        .database
        .create_entry(entry)
        .await
        .map_err(|e| db_error(e, "Time entry not found"))?;

    Ok(Json(ApiSuccess::new(AddEntryResponse { id })))
}

pub async fn update(
    user: AuthedUser,
    state: State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<EntryResponse>, ServerError> {
    let status = match req.status.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.parse::<EntryStatus>()
                .map_err(|_| ServerError::Validation("Unknown entry status"))?,
        ),
    };

    let patch = EntryPatch {
        job_no: req.job_no,
        job_name: req.job_name,
        employee_code: req.employee_code,
        employee_name: req.employee_name,
        account_no: req.account_no,
        account_name: req.account_name,
        comment: req.comment,
        spire_status: req.spire_status,
        status,
        total_seconds: req.total_seconds.map(|v| v.max(0)),
        start_time: req.start_time,
        start_location: req.start_location,
        end_location: req.end_location,
    };

    if patch.is_empty() {
        return Err(ServerError::Validation("No updatable fields provided"));
    }

    let entry = state
        .database
        .update_entry(id, patch, Some(&user.emp_code))
        .await
        .map_err(|e| db_error(e, "Time entry not found"))?;

    Ok(Json(ApiSuccess::new(entry)))
}

pub async fn stop(
    user: AuthedUser,
    state: State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<StopEntryRequest>>,
) -> Result<Json<EntryResponse>, ServerError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let fin = StopFinal {
        total_seconds: req.total_seconds.map(|v| v.max(0)),
        comment: req.comment,
        end_location: req.end_location,
    };

    let entry = state
        .database
        .stop_entry(id, Some(&user.emp_code), fin)
        .await
        .map_err(|e| db_error(e, "Time entry not found or already stopped"))?;

    Ok(Json(ApiSuccess::new(entry)))
}

pub async fn delete(
    user: AuthedUser,
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryResponse>, ServerError> {
    let entry = state
        .database
        .delete_entry(id, Some(&user.emp_code))
        .await
        .map_err(|e| db_error(e, "Time entry not found"))?;

    Ok(Json(ApiSuccess::new(entry)))
}
