use crate::authentication::AuthedUser;
use crate::error::ServerError;
use crate::router::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use jobclock_common::api::{AccountSummary, ApiSuccess, EmployeeSummary, JobSummary};
use tracing::error;

fn upstream(err: eyre::Report) -> ServerError {
    error!("spire request failed: {err}");
    ServerError::Upstream(err.to_string())
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

pub async fn jobs(
    _user: AuthedUser,
    state: State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiSuccess<Vec<JobSummary>>>, ServerError> {
    let jobs = state
        .spire
        .jobs(params.search.as_deref())
        .await
        .map_err(upstream)?;

    Ok(Json(ApiSuccess::new(jobs)))
}

pub async fn employees(
    _user: AuthedUser,
    state: State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiSuccess<Vec<EmployeeSummary>>>, ServerError> {
    let employees = state
        .spire
        .employees(params.search.as_deref())
        .await
        .map_err(upstream)?;

    Ok(Json(ApiSuccess::new(employees)))
}

#[derive(Debug, serde::Deserialize)]
pub struct AccountParams {
    #[serde(rename = "jobCode")]
    pub job_code: String,
}

pub async fn accounts(
    _user: AuthedUser,
    state: State<AppState>,
    Query(params): Query<AccountParams>,
) -> Result<Json<ApiSuccess<Vec<AccountSummary>>>, ServerError> {
    let accounts = state
        .spire
        .job_accounts(&params.job_code)
        .await
        .map_err(upstream)?;

    Ok(Json(ApiSuccess::new(accounts)))
}
