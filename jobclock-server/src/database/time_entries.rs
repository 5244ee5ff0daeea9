use super::{is_unique_violation, schema, Database, DbError};
use crate::models::{DbTimeEntry, EntryPatch, NewTimeEntry, StopFinal};
use eyre::Result;
use futures_util::TryStreamExt;
use jobclock_common::domain::{EntryStatus, TimeEntry};
use sql_builder::{quote, SqlBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

/// Value staged for the dynamic insert.
enum Bind {
    Text(String),
    OptText(Option<String>),
    Int(i64),
    OptInt(Option<i64>),
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    values: &'q [Bind],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for value in values {
        query = match value {
            Bind::Text(v) => query.bind(v.as_str()),
            Bind::OptText(v) => query.bind(v.as_deref()),
            Bind::Int(v) => query.bind(*v),
            Bind::OptInt(v) => query.bind(*v),
        };
    }
    query
}

impl Database {
    async fn count_active(&self, job_no: &str, employee_code: &str) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as(
            "select count(1) from time_entries \
             where job_no = ?1 and employee_code = ?2 \
             and status = 'active' and end_time is null",
        )
        .bind(job_no)
        .bind(employee_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Insert a new entry. Active entries are checked against the
    /// one-active-timer rule first; the partial unique index backs the
    /// check up against concurrent starts. Only columns present in the
    /// live schema are written, so a partially migrated deployment does
    /// not fail the insert outright.
    pub async fn create_entry(&self, entry: NewTimeEntry) -> Result<Uuid, DbError> {
        if entry.status == EntryStatus::Active {
            let active = self.count_active(&entry.job_no, &entry.employee_code).await?;
            if active > 0 {
                return Err(DbError::Conflict(format!(
                    "An active timer already exists for job {} and employee {}",
                    entry.job_no, entry.employee_code
                )));
            }
        }

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let start_location =
            serde_json::to_string(&entry.start_location).map_err(|e| DbError::Other(e.into()))?;
        let end_location =
            serde_json::to_string(&entry.end_location).map_err(|e| DbError::Other(e.into()))?;

        let candidates: Vec<(&str, Bind)> = vec![
            ("id", Bind::Text(id.to_string())),
            ("job_no", Bind::Text(entry.job_no.clone())),
            ("job_name", Bind::Text(entry.job_name)),
            ("employee_code", Bind::Text(entry.employee_code)),
            ("employee_name", Bind::OptText(entry.employee_name)),
            ("account_no", Bind::OptText(entry.account_no)),
            ("account_name", Bind::OptText(entry.account_name)),
            ("start_time", Bind::Int(entry.start_time.unix_timestamp())),
            (
                "end_time",
                Bind::OptInt(entry.end_time.map(|x| x.unix_timestamp())),
            ),
            ("total_seconds", Bind::Int(entry.total_seconds)),
            ("comment", Bind::OptText(entry.comment)),
            ("status", Bind::Text(entry.status.as_str().to_string())),
            ("spire_status", Bind::Text("new".to_string())),
            ("start_location", Bind::Text(start_location)),
            ("end_location", Bind::Text(end_location)),
            ("created_at", Bind::Int(now)),
            ("updated_at", Bind::Int(now)),
        ];

        let mut conn = self.pool.acquire().await?;
        let live: Vec<String> = schema::table_columns(&mut conn, "time_entries")
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        let present: Vec<(&str, Bind)> = candidates
            .into_iter()
            .filter(|(name, _)| live.iter().any(|c| c == name))
            .collect();

        let columns: Vec<&str> = present.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "insert into time_entries ({}) values ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        let values: Vec<Bind> = present.into_iter().map(|(_, value)| value).collect();

        bind_all(sqlx::query(&sql), &values)
            .execute(&mut *conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    DbError::Conflict(format!(
                        "An active timer already exists for job {}",
                        entry.job_no
                    ))
                } else {
                    err.into()
                }
            })?;

        Ok(id)
    }

    pub async fn entry(
        &self,
        id: Uuid,
        employee_code: Option<&str>,
    ) -> Result<TimeEntry, DbError> {
        let mut query = SqlBuilder::select_from("time_entries");
        query.field("*").and_where_eq("id", quote(id.to_string()));
        if let Some(code) = employee_code {
            query.and_where_eq("employee_code", quote(code));
        }

        let sql = query.sql().expect("Failed to build query");
        let DbTimeEntry(entry) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;

        Ok(entry)
    }

    /// All open entries (end_time is null), newest start first.
    pub async fn active_entries(
        &self,
        employee_code: Option<&str>,
    ) -> Result<Vec<TimeEntry>, DbError> {
        let mut query = SqlBuilder::select_from("time_entries");
        query
            .field("*")
            .and_where_is_null("end_time")
            .order_desc("start_time");
        if let Some(code) = employee_code {
            query.and_where_eq("employee_code", quote(code));
        }

        let sql = query.sql().expect("Failed to build query");
        let res = sqlx::query_as(&sql)
            .fetch(&self.pool)
            .map_ok(|DbTimeEntry(entry)| entry)
            .try_collect()
            .await?;

        Ok(res)
    }

    pub async fn list_entries(
        &self,
        limit: i64,
        employee_code: Option<&str>,
    ) -> Result<Vec<TimeEntry>, DbError> {
        let mut query = SqlBuilder::select_from("time_entries");
        query
            .field("*")
            .order_desc("created_at")
            .order_desc("rowid")
            .limit(limit);
        if let Some(code) = employee_code {
            query.and_where_eq("employee_code", quote(code));
        }

        let sql = query.sql().expect("Failed to build query");
        let res = sqlx::query_as(&sql)
            .fetch(&self.pool)
            .map_ok(|DbTimeEntry(entry)| entry)
            .try_collect()
            .await?;

        Ok(res)
    }

    /// Whitelist-based partial update. Pause and resume are expressed
    /// through this: pause freezes total_seconds and resets start_time,
    /// resume sets status back to active and resets start_time again, so
    /// total_seconds always covers time strictly before start_time.
    pub async fn update_entry(
        &self,
        id: Uuid,
        patch: EntryPatch,
        employee_code: Option<&str>,
    ) -> Result<TimeEntry, DbError> {
        let mut query = SqlBuilder::update_table("time_entries");

        if let Some(v) = &patch.job_no {
            query.set("job_no", quote(v));
        }
        if let Some(v) = &patch.job_name {
            query.set("job_name", quote(v));
        }
        if let Some(v) = &patch.employee_code {
            query.set("employee_code", quote(v));
        }
        if let Some(v) = &patch.employee_name {
            query.set("employee_name", quote(v));
        }
        if let Some(v) = &patch.account_no {
            query.set("account_no", quote(v));
        }
        if let Some(v) = &patch.account_name {
            query.set("account_name", quote(v));
        }
        if let Some(v) = &patch.comment {
            query.set("comment", quote(v));
        }
        if let Some(v) = &patch.spire_status {
            query.set("spire_status", quote(v));
        }
        if let Some(v) = &patch.status {
            query.set("status", quote(v.as_str()));
        }
        if let Some(v) = patch.total_seconds {
            query.set("total_seconds", v);
        }
        if let Some(v) = patch.start_time {
            query.set("start_time", v.unix_timestamp());
        }
        if let Some(v) = &patch.start_location {
            let json = serde_json::to_string(v).map_err(|e| DbError::Other(e.into()))?;
            query.set("start_location", quote(json));
        }
        if let Some(v) = &patch.end_location {
            let json = serde_json::to_string(v).map_err(|e| DbError::Other(e.into()))?;
            query.set("end_location", quote(json));
        }

        query.set("updated_at", OffsetDateTime::now_utc().unix_timestamp());
        query.and_where_eq("id", quote(id.to_string()));
        if let Some(code) = employee_code {
            query.and_where_eq("employee_code", quote(code));
        }

        let sql = query.sql().expect("Failed to build query");
        let res = sqlx::query(&sql).execute(&self.pool).await.map_err(|err| {
            if is_unique_violation(&err) {
                DbError::Conflict(
                    "Another active timer already exists for this job and employee".to_string(),
                )
            } else {
                err.into()
            }
        })?;

        if res.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.entry(id, employee_code).await
    }

    /// Terminal transition. Requires the entry to still be open; the
    /// total falls back to whole seconds since start_time when no final
    /// value was supplied.
    pub async fn stop_entry(
        &self,
        id: Uuid,
        employee_code: Option<&str>,
        fin: StopFinal,
    ) -> Result<TimeEntry, DbError> {
        let current = self.entry(id, employee_code).await?;
        if current.end_time.is_some() {
            return Err(DbError::NotFound);
        }

        let now = OffsetDateTime::now_utc();
        let total = fin
            .total_seconds
            .unwrap_or_else(|| (now - current.start_time).whole_seconds())
            .max(0);

        let mut query = SqlBuilder::update_table("time_entries");
        query.set("end_time", now.unix_timestamp());
        query.set("total_seconds", total);
        query.set("status", quote(EntryStatus::Completed.as_str()));
        query.set("updated_at", now.unix_timestamp());
        if let Some(comment) = &fin.comment {
            query.set("comment", quote(comment));
        }
        if let Some(fixes) = &fin.end_location {
            let json = serde_json::to_string(fixes).map_err(|e| DbError::Other(e.into()))?;
            query.set("end_location", quote(json));
        }
        query.and_where_eq("id", quote(id.to_string()));
        query.and_where_is_null("end_time");
        if let Some(code) = employee_code {
            query.and_where_eq("employee_code", quote(code));
        }

        let sql = query.sql().expect("Failed to build query");
        let res = sqlx::query(&sql).execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            // raced with another stop
            return Err(DbError::NotFound);
        }

        self.entry(id, employee_code).await
    }

    pub async fn delete_entry(
        &self,
        id: Uuid,
        employee_code: Option<&str>,
    ) -> Result<TimeEntry, DbError> {
        let entry = self.entry(id, employee_code).await?;

        let mut query = SqlBuilder::delete_from("time_entries");
        query.and_where_eq("id", quote(id.to_string()));
        if let Some(code) = employee_code {
            query.and_where_eq("employee_code", quote(code));
        }

        let sql = query.sql().expect("Failed to build query");
        sqlx::query(&sql).execute(&self.pool).await?;

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn new_entry(job_no: &str, employee_code: &str, status: EntryStatus) -> NewTimeEntry {
        NewTimeEntry {
            job_no: job_no.to_string(),
            job_name: format!("Job {job_no}"),
            employee_code: employee_code.to_string(),
            employee_name: None,
            account_no: None,
            account_name: None,
            comment: None,
            status,
            total_seconds: 0,
            start_time: OffsetDateTime::now_utc(),
            end_time: match status {
                EntryStatus::Completed => Some(OffsetDateTime::now_utc()),
                _ => None,
            },
            start_location: vec![],
            end_location: vec![],
        }
    }

    #[tokio::test]
    async fn second_active_timer_is_rejected() {
        let db = test_db().await;
        db.create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();

        let err = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn active_check_is_per_job_and_employee() {
        let db = test_db().await;
        db.create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();
        db.create_entry(new_entry("J2", "E1", EntryStatus::Active))
            .await
            .unwrap();
        db.create_entry(new_entry("J1", "E2", EntryStatus::Active))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn completed_backfill_bypasses_active_check() {
        let db = test_db().await;
        db.create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();
        // manual back-fill for the same job while the timer runs
        db.create_entry(new_entry("J1", "E1", EntryStatus::Completed))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn paused_entry_does_not_block_a_new_start() {
        let db = test_db().await;
        let id = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();
        db.update_entry(
            id,
            EntryPatch {
                status: Some(EntryStatus::Paused),
                total_seconds: Some(42),
                start_time: Some(OffsetDateTime::now_utc()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        db.create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stop_finalizes_and_rejects_a_second_stop() {
        let db = test_db().await;
        let id = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();

        let stopped = db.stop_entry(id, None, StopFinal::default()).await.unwrap();
        assert_eq!(stopped.status, EntryStatus::Completed);
        assert!(stopped.end_time.is_some());
        assert!(stopped.total_seconds >= 0);

        let err = db
            .stop_entry(id, None, StopFinal::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn stop_honors_the_final_override() {
        let db = test_db().await;
        let id = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();

        let stopped = db
            .stop_entry(
                id,
                None,
                StopFinal {
                    total_seconds: Some(600),
                    comment: Some("done".to_string()),
                    end_location: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(stopped.total_seconds, 600);
        assert_eq!(stopped.comment.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn ownership_scoping_hides_foreign_entries() {
        let db = test_db().await;
        let id = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();

        let err = db.entry(id, Some("E2")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        let err = db
            .update_entry(
                id,
                EntryPatch {
                    comment: Some("stolen".to_string()),
                    ..Default::default()
                },
                Some("E2"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        let err = db.delete_entry(id, Some("E2")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        db.entry(id, Some("E1")).await.unwrap();
    }

    #[tokio::test]
    async fn pause_resume_keeps_accumulated_seconds() {
        let db = test_db().await;
        let id = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();

        // pause: freeze 60s and reset start_time
        let paused_at = OffsetDateTime::now_utc();
        let paused = db
            .update_entry(
                id,
                EntryPatch {
                    status: Some(EntryStatus::Paused),
                    total_seconds: Some(60),
                    start_time: Some(paused_at),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(paused.status, EntryStatus::Paused);
        assert_eq!(paused.total_seconds, 60);

        // resume: status back to active, start_time reset, total untouched
        let resumed_at = OffsetDateTime::now_utc();
        let resumed = db
            .update_entry(
                id,
                EntryPatch {
                    status: Some(EntryStatus::Active),
                    start_time: Some(resumed_at),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(resumed.status, EntryStatus::Active);
        assert_eq!(resumed.total_seconds, 60);
        assert_eq!(
            resumed.start_time.unix_timestamp(),
            resumed_at.unix_timestamp()
        );
    }

    #[tokio::test]
    async fn list_entries_honors_limit_and_scope() {
        let db = test_db().await;
        for i in 0..5 {
            db.create_entry(new_entry(&format!("J{i}"), "E1", EntryStatus::Completed))
                .await
                .unwrap();
        }
        db.create_entry(new_entry("J9", "E2", EntryStatus::Completed))
            .await
            .unwrap();

        let all = db.list_entries(3, Some("E1")).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|e| e.employee_code == "E1"));

        let active = db.active_entries(Some("E1")).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn delete_returns_the_removed_row() {
        let db = test_db().await;
        let id = db
            .create_entry(new_entry("J1", "E1", EntryStatus::Active))
            .await
            .unwrap();

        let deleted = db.delete_entry(id, Some("E1")).await.unwrap();
        assert_eq!(deleted.id, id);

        let err = db.entry(id, None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
