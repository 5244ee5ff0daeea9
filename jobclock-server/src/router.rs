use crate::database::Database;
use crate::erp::SpireClient;
use crate::handlers;
use crate::settings::Settings;
use axum::routing::{get, post, put};
use axum::Router;
use eyre::Result;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Everything a request handler needs, built once at startup and cloned
/// into each handler instead of living in globals.
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub settings: Arc<Settings>,
    pub spire: SpireClient,
}

impl AppState {
    pub fn new(settings: Settings, database: Database) -> Result<Self> {
        let spire = SpireClient::new(&settings)?;
        Ok(Self {
            database,
            settings: Arc::new(settings),
            spire,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/time-entries",
            get(handlers::entry::list).post(handlers::entry::create),
        )
        .route("/api/time-entries/active", get(handlers::entry::active))
        .route(
            "/api/time-entries/:id",
            get(handlers::entry::get_one)
                .put(handlers::entry::update)
                .delete(handlers::entry::delete),
        )
        .route("/api/time-entries/:id/stop", put(handlers::entry::stop))
        .route("/api/jobs", get(handlers::erp::jobs))
        .route("/api/employees", get(handlers::erp::employees))
        .route("/api/job-costing-accounts", get(handlers::erp::accounts))
        .route("/api/users/signup", post(handlers::user::signup))
        .route("/api/users/login", post(handlers::user::login))
        .route("/api/users/logout", post(handlers::user::logout))
        .route("/api/users/validate", get(handlers::user::validate))
        .route(
            "/api/users/:emp_code/favorites",
            get(handlers::user::favorites_list),
        )
        .route(
            "/api/users/favorites",
            post(handlers::user::favorites_add).delete(handlers::user::favorites_remove),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
