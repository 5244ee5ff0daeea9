use crate::database::DbError;
use crate::error::ServerError;
use crate::router::AppState;
use axum::extract::State;
use axum::response::Json;
use jobclock_common::api::HealthCheckResponse;
use time::OffsetDateTime;
use tracing::error;

pub mod entry;
pub mod erp;
pub mod user;

pub async fn health(state: State<AppState>) -> Json<HealthCheckResponse> {
    let message = if state.database.is_degraded() {
        "Server is degraded"
    } else {
        "Server is healthy"
    };
    Json(HealthCheckResponse {
        success: true,
        message: message.to_string(),
        timestamp: OffsetDateTime::now_utc(),
        environment: state.settings.environment.clone(),
    })
}

/// Map a store failure onto the HTTP taxonomy; unexpected detail stays in
/// the server log only.
pub(crate) fn db_error(err: DbError, not_found: &'static str) -> ServerError {
    match err {
        DbError::NotFound => ServerError::NotFound(not_found),
        DbError::Conflict(msg) => ServerError::Conflict(msg),
        DbError::Other(err) => {
            error!("database error: {err}");
            ServerError::DatabaseError("query failed")
        }
    }
}
