use crate::models::{NewSession, Session, User};
use eyre::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod schema;
pub mod time_entries;
pub mod users;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] eyre::Report),
}

impl From<schema::SchemaError> for DbError {
    fn from(err: schema::SchemaError) -> Self {
        DbError::Other(eyre::Report::new(err))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            other => DbError::Other(eyre::Report::new(other)),
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed")
    )
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    degraded: bool,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        debug!("opening database at {:?}", path);
        if !path.starts_with("sqlite:") {
            let file = Path::new(path);
            if !file.exists() {
                if let Some(dir) = file.parent() {
                    fs_err::create_dir_all(dir)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(path)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new();
        // an in-memory database exists per connection
        if path.contains(":memory:") {
            pool_options = pool_options.max_connections(1);
        }
        let pool = pool_options.connect_with(options).await?;

        let failures = schema::ensure_all(&pool).await;
        if !failures.is_empty() {
            warn!(
                "starting degraded: {} table(s) failed the schema ensure",
                failures.len()
            );
        }

        Ok(Self {
            pool,
            degraded: !failures.is_empty(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub async fn add_session(&self, session: NewSession) -> Result<(), DbError> {
        sqlx::query(
            r#"
            insert into sessions(user_id, emp_code, verified, token, expires_at)
            values(?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(session.user_id.to_string())
        .bind(session.emp_code.as_str())
        .bind(session.verified)
        .bind(session.token.as_str())
        .bind(session.expires_at.unix_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn session(&self, token: &str) -> Result<Session, DbError> {
        let session: Session = sqlx::query_as("select * from sessions where token = ?1")
            .bind(token)
            .fetch_one(&self.pool)
            .await?;

        Ok(session)
    }

    pub async fn remove_session(&self, token: &str) -> Result<(), DbError> {
        let res = sqlx::query("delete from sessions where token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    /// Drop sessions past their expiry. Called opportunistically, never
    /// required for correctness since the gate checks expires_at itself.
    pub async fn prune_sessions(&self) -> Result<u64, DbError> {
        let res = sqlx::query("delete from sessions where expires_at < ?1")
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }

    pub async fn user_by_id(&self, id: Uuid) -> Result<User, DbError> {
        let user: User = sqlx::query_as("select * from users where id = ?1")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }
}
