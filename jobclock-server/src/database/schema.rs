use sqlx::{Connection, Row, SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

/// v4-shaped uuid generated inside sqlite, so the legacy-id migration can
/// regenerate primary keys in a single set-based insert.
const SQL_UUID_V4: &str = "lower(hex(randomblob(4)) || '-' || hex(randomblob(2)) || '-4' || \
     substr(hex(randomblob(2)), 2) || '-' || \
     substr('89ab', (abs(random()) % 4) + 1, 1) || substr(hex(randomblob(2)), 2) || '-' || \
     hex(randomblob(6)))";

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("unsafe table name {0:?}")]
    InvalidIdent(String),

    #[error("schema statement failed: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Only names safe to interpolate into DDL: `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct ColumnSpec {
    name: &'static str,
    /// Declaration used by `alter table add column`; must carry a default
    /// so old rows evolve forward without a manual migration.
    decl: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    TimeEntries,
    Users,
    Sessions,
}

pub const ALL_TABLES: [TableKind; 3] = [TableKind::TimeEntries, TableKind::Users, TableKind::Sessions];

impl TableKind {
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::TimeEntries => "time_entries",
            TableKind::Users => "users",
            TableKind::Sessions => "sessions",
        }
    }

    fn uuid_pk(&self) -> bool {
        !matches!(self, TableKind::Sessions)
    }

    fn create_sql(&self) -> &'static str {
        match self {
            TableKind::TimeEntries => {
                "create table time_entries (
                    id text primary key not null,
                    job_no text not null,
                    job_name text not null default '',
                    employee_code text not null default '',
                    employee_name text,
                    account_no text,
                    account_name text,
                    start_time integer not null,
                    end_time integer,
                    total_seconds integer not null default 0,
                    comment text,
                    status text not null default 'active',
                    spire_status text not null default 'new',
                    start_location text not null default '[]',
                    end_location text not null default '[]',
                    created_at integer not null,
                    updated_at integer not null
                )"
            }
            TableKind::Users => {
                "create table users (
                    id text primary key not null,
                    emp_code text not null unique,
                    emp_name text,
                    password text not null,
                    verified integer not null default 0,
                    favorites text not null default '[]',
                    created integer not null,
                    updated integer not null
                )"
            }
            TableKind::Sessions => {
                "create table sessions (
                    id integer primary key autoincrement,
                    user_id text not null,
                    emp_code text not null default '',
                    verified integer not null default 0,
                    token text not null,
                    expires_at integer not null
                )"
            }
        }
    }

    fn column_names(&self) -> &'static [&'static str] {
        match self {
            TableKind::TimeEntries => &[
                "id",
                "job_no",
                "job_name",
                "employee_code",
                "employee_name",
                "account_no",
                "account_name",
                "start_time",
                "end_time",
                "total_seconds",
                "comment",
                "status",
                "spire_status",
                "start_location",
                "end_location",
                "created_at",
                "updated_at",
            ],
            TableKind::Users => &[
                "id", "emp_code", "emp_name", "password", "verified", "favorites", "created",
                "updated",
            ],
            TableKind::Sessions => &["id", "user_id", "emp_code", "verified", "token", "expires_at"],
        }
    }

    /// Columns added by feature evolution after the table first shipped.
    /// Deployments created before a column existed pick it up here.
    fn evolved_columns(&self) -> &'static [ColumnSpec] {
        match self {
            TableKind::TimeEntries => &[
                ColumnSpec {
                    name: "employee_code",
                    decl: "text not null default ''",
                },
                ColumnSpec {
                    name: "employee_name",
                    decl: "text",
                },
                ColumnSpec {
                    name: "account_no",
                    decl: "text",
                },
                ColumnSpec {
                    name: "account_name",
                    decl: "text",
                },
                ColumnSpec {
                    name: "comment",
                    decl: "text",
                },
                ColumnSpec {
                    name: "spire_status",
                    decl: "text not null default 'new'",
                },
                ColumnSpec {
                    name: "start_location",
                    decl: "text not null default '[]'",
                },
                ColumnSpec {
                    name: "end_location",
                    decl: "text not null default '[]'",
                },
            ],
            TableKind::Users => &[
                ColumnSpec {
                    name: "emp_name",
                    decl: "text",
                },
                ColumnSpec {
                    name: "verified",
                    decl: "integer not null default 0",
                },
                ColumnSpec {
                    name: "favorites",
                    decl: "text not null default '[]'",
                },
            ],
            TableKind::Sessions => &[
                ColumnSpec {
                    name: "emp_code",
                    decl: "text not null default ''",
                },
                ColumnSpec {
                    name: "verified",
                    decl: "integer not null default 0",
                },
            ],
        }
    }

    fn indexes(&self) -> &'static [&'static str] {
        match self {
            TableKind::TimeEntries => &[
                "create index if not exists idx_time_entries_job_no on time_entries(job_no)",
                "create index if not exists idx_time_entries_status on time_entries(status)",
                "create index if not exists idx_time_entries_start_time on time_entries(start_time)",
                "create index if not exists idx_time_entries_spire_status on time_entries(spire_status)",
                "create index if not exists idx_time_entries_employee_code on time_entries(employee_code)",
                // Storage-level backstop for the one-active-timer rule; the
                // application pre-check only produces the friendlier message.
                "create unique index if not exists idx_time_entries_one_active \
                 on time_entries(job_no, employee_code) \
                 where status = 'active' and end_time is null",
            ],
            TableKind::Users => &[
                "create unique index if not exists idx_users_emp_code on users(emp_code)",
                "create index if not exists idx_users_verified on users(verified)",
            ],
            TableKind::Sessions => &[
                "create unique index if not exists idx_sessions_token on sessions(token)",
            ],
        }
    }
}

async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool, SchemaError> {
    let row: (i64,) =
        sqlx::query_as("select count(1) from sqlite_master where type = 'table' and name = ?1")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;

    Ok(row.0 > 0)
}

/// Live (name, declared type) pairs for a table.
pub(crate) async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<(String, String)>, SchemaError> {
    if !valid_ident(table) {
        return Err(SchemaError::InvalidIdent(table.to_string()));
    }

    let rows = sqlx::query("select name, type from pragma_table_info(?1)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>("name"), row.get::<String, _>("type")))
        .collect())
}

/// Rebuild a table whose `id` column predates the uuid primary key.
///
/// Runs as one transaction: snapshot into a backup table, drop, recreate
/// with the target DDL, re-insert with regenerated ids, drop the backup.
/// Sqlite allows DDL inside transactions, so a mid-sequence failure rolls
/// the whole thing back instead of stranding data in the backup table.
async fn migrate_uuid_pk(conn: &mut SqliteConnection, kind: TableKind) -> Result<(), SchemaError> {
    let table = kind.name();
    let backup = format!("{table}_migration_backup");
    if !valid_ident(&backup) {
        return Err(SchemaError::InvalidIdent(backup));
    }

    warn!("table {table} has a legacy integer primary key, migrating to uuid");

    let shared: Vec<String> = table_columns(conn, table)
        .await?
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| name != "id" && kind.column_names().contains(&name.as_str()))
        .collect();

    let mut tx = conn.begin().await?;

    sqlx::query(&format!("drop table if exists {backup}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("create table {backup} as select * from {table}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("drop table {table}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(kind.create_sql()).execute(&mut *tx).await?;

    if !shared.is_empty() {
        let cols = shared.join(", ");
        sqlx::query(&format!(
            "insert into {table} (id, {cols}) select {SQL_UUID_V4}, {cols} from {backup}"
        ))
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(&format!("drop table {backup}"))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("migrated {table} to uuid primary keys");
    Ok(())
}

/// Idempotently bring one table up to the expected shape. Safe to call on
/// every process start.
pub async fn ensure(pool: &SqlitePool, kind: TableKind) -> Result<(), SchemaError> {
    let table = kind.name();
    if !valid_ident(table) {
        return Err(SchemaError::InvalidIdent(table.to_string()));
    }

    let mut conn = pool.acquire().await?;

    if !table_exists(&mut conn, table).await? {
        sqlx::query(kind.create_sql()).execute(&mut *conn).await?;
        info!("created table {table}");
    } else if kind.uuid_pk() {
        let id_type = table_columns(&mut conn, table)
            .await?
            .into_iter()
            .find(|(name, _)| name == "id")
            .map(|(_, ctype)| ctype);

        if let Some(ctype) = id_type {
            if !ctype.eq_ignore_ascii_case("text") {
                migrate_uuid_pk(&mut conn, kind).await?;
            }
        }
    }

    let live: Vec<String> = table_columns(&mut conn, table)
        .await?
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    for col in kind.evolved_columns() {
        if !live.iter().any(|name| name == col.name) {
            sqlx::query(&format!(
                "alter table {table} add column {} {}",
                col.name, col.decl
            ))
            .execute(&mut *conn)
            .await?;
            info!("added column {}.{}", table, col.name);
        }
    }

    for stmt in kind.indexes() {
        sqlx::query(stmt).execute(&mut *conn).await?;
    }

    Ok(())
}

/// Ensure every table. Failures are logged and returned instead of
/// thrown, so startup can continue degraded.
pub async fn ensure_all(pool: &SqlitePool) -> Vec<SchemaError> {
    let mut failures = vec![];
    for kind in ALL_TABLES {
        if let Err(err) = ensure(pool, kind).await {
            error!("failed to ensure table {}: {err}", kind.name());
            failures.push(err);
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn ident_validation() {
        assert!(valid_ident("time_entries"));
        assert!(valid_ident("_t2"));
        assert!(!valid_ident("2fast"));
        assert!(!valid_ident("drop table; --"));
        assert!(!valid_ident(""));
        assert!(!valid_ident("time-entries"));
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let pool = memory_pool().await;
        for _ in 0..3 {
            for kind in ALL_TABLES {
                ensure(&pool, kind).await.unwrap();
            }
        }

        let mut conn = pool.acquire().await.unwrap();
        let cols = table_columns(&mut conn, "time_entries").await.unwrap();
        assert_eq!(cols.len(), TableKind::TimeEntries.column_names().len());
    }

    #[tokio::test]
    async fn legacy_integer_pk_is_migrated() {
        let pool = memory_pool().await;
        sqlx::query(
            "create table users (
                id integer primary key autoincrement,
                emp_code text not null unique,
                password text not null,
                created integer not null,
                updated integer not null
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("insert into users (emp_code, password, created, updated) values ('E1', 'x', 0, 0)")
            .execute(&pool)
            .await
            .unwrap();

        ensure(&pool, TableKind::Users).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let cols = table_columns(&mut conn, "users").await.unwrap();
        let id_type = cols.iter().find(|(n, _)| n == "id").unwrap().1.clone();
        assert!(id_type.eq_ignore_ascii_case("text"));

        // data survived with a regenerated uuid id
        let row: (String, String) = sqlx::query_as("select id, emp_code from users")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(row.1, "E1");
        assert!(uuid::Uuid::parse_str(&row.0).is_ok());

        // backup table is gone
        let exists = table_exists(&mut conn, "users_migration_backup").await.unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn evolved_columns_are_added() {
        let pool = memory_pool().await;
        sqlx::query(
            "create table time_entries (
                id text primary key not null,
                job_no text not null,
                job_name text not null default '',
                start_time integer not null,
                end_time integer,
                total_seconds integer not null default 0,
                status text not null default 'active',
                created_at integer not null,
                updated_at integer not null
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        ensure(&pool, TableKind::TimeEntries).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let cols: Vec<String> = table_columns(&mut conn, "time_entries")
            .await
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        for col in ["spire_status", "employee_code", "start_location", "end_location"] {
            assert!(cols.iter().any(|c| c == col), "missing {col}");
        }
    }
}
