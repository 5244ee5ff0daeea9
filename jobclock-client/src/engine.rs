use crate::api_client::{ApiClientError, AuthClient};
use crate::location::LocationProvider;
use jobclock_common::api::{AddEntryRequest, StopEntryRequest, UpdateEntryRequest};
use jobclock_common::domain::{EntryStatus, TimeEntry};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

/// How often locally accumulated seconds are reconciled to the server.
pub const SYNC_INTERVAL_SECS: u64 = 30;
/// Only push when local and server totals drift further apart than this.
pub const DRIFT_THRESHOLD_SECS: i64 = 10;
/// The finish confirmation adjusts in 10-minute steps.
pub const ADJUST_STEP_SECS: i64 = 600;
/// Totals are bounded to a single day, 23:59:59.
pub const MAX_TOTAL_SECS: i64 = 86_399;

pub fn clamp_total(total_seconds: i64) -> i64 {
    total_seconds.clamp(0, MAX_TOTAL_SECS)
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("a timer is already running for job {0}; pause or stop it first")]
    AlreadyRunning(String),

    #[error("timer is already paused")]
    AlreadyPaused,

    #[error("timer is not paused")]
    NotPaused,

    #[error("no open timer with id {0}")]
    UnknownTimer(Uuid),

    #[error("could not get a GPS fix: {0}")]
    Location(eyre::Report),

    #[error(transparent)]
    Api(#[from] ApiClientError),
}

/// Local view of one open entry. `total_seconds` always covers time
/// accumulated strictly before `start_time`, mirroring the server rows,
/// so elapsed time survives reloads and pause/resume cycles.
#[derive(Debug, Clone)]
pub struct TimerState {
    pub id: Uuid,
    pub job_no: String,
    pub job_name: String,
    pub total_seconds: i64,
    pub start_time: OffsetDateTime,
    pub paused: bool,
    /// Last total the server is known to hold, for drift bounding.
    last_synced_seconds: i64,
}

impl TimerState {
    pub fn from_entry(entry: &TimeEntry) -> Self {
        Self {
            id: entry.id,
            job_no: entry.job_no.clone(),
            job_name: entry.job_name.clone(),
            total_seconds: entry.total_seconds,
            start_time: entry.start_time,
            paused: entry.status == EntryStatus::Paused,
            last_synced_seconds: entry.total_seconds,
        }
    }

    /// Display value: accumulated milliseconds plus the wall-clock delta
    /// of the current running segment. Paused timers are frozen.
    pub fn elapsed_ms(&self, now: OffsetDateTime) -> i64 {
        let base = self.total_seconds * 1000;
        if self.paused {
            return base;
        }
        let segment = (now - self.start_time).whole_milliseconds() as i64;
        base + segment.max(0)
    }

    pub fn elapsed_seconds(&self, now: OffsetDateTime) -> i64 {
        self.elapsed_ms(now) / 1000
    }
}

/// Optimistic local timer state over the REST api. The server stays
/// authoritative: `load` rebuilds everything from open entries, and the
/// periodic `reconcile` keeps the server recoverable if this process
/// dies mid-timer.
pub struct TimerEngine {
    client: AuthClient,
    location: Box<dyn LocationProvider>,
    timers: Vec<TimerState>,
}

impl TimerEngine {
    pub fn new(client: AuthClient, location: Box<dyn LocationProvider>) -> Self {
        Self {
            client,
            location,
            timers: vec![],
        }
    }

    pub async fn load(&mut self) -> Result<(), ApiClientError> {
        let entries = self.client.active_entries().await?;
        self.timers = entries.iter().map(TimerState::from_entry).collect();
        debug!("loaded {} open timer(s)", self.timers.len());
        Ok(())
    }

    pub fn timers(&self) -> &[TimerState] {
        &self.timers
    }

    /// The one non-paused timer, if any. Only one may run at a time for
    /// an employee, across all jobs.
    pub fn running(&self) -> Option<&TimerState> {
        self.timers.iter().find(|t| !t.paused)
    }

    fn index_of(&self, id: Uuid) -> Result<usize, EngineError> {
        self.timers
            .iter()
            .position(|t| t.id == id)
            .ok_or(EngineError::UnknownTimer(id))
    }

    pub async fn start(
        &mut self,
        job_no: &str,
        job_name: &str,
        account_no: Option<&str>,
        account_name: Option<&str>,
    ) -> Result<Uuid, EngineError> {
        if let Some(running) = self.running() {
            return Err(EngineError::AlreadyRunning(running.job_no.clone()));
        }

        // a start without a fix is an error, not a silent skip
        let fix = self.location.current_fix().map_err(EngineError::Location)?;
        let now = OffsetDateTime::now_utc();

        let req = AddEntryRequest {
            job_no: job_no.to_string(),
            job_name: job_name.to_string(),
            account_no: account_no.map(|v| v.to_string()),
            account_name: account_name.map(|v| v.to_string()),
            start_time: Some(now),
            start_location: vec![fix],
            ..Default::default()
        };
        let id = self.client.create_entry(&req).await?;

        self.timers.push(TimerState {
            id,
            job_no: job_no.to_string(),
            job_name: job_name.to_string(),
            total_seconds: 0,
            start_time: now,
            paused: false,
            last_synced_seconds: 0,
        });

        Ok(id)
    }

    /// Freeze the accumulated total and reset start_time, so the paused
    /// row reads correctly from any client.
    pub async fn pause(&mut self, id: Uuid) -> Result<(), EngineError> {
        let idx = self.index_of(id)?;
        if self.timers[idx].paused {
            return Err(EngineError::AlreadyPaused);
        }

        let now = OffsetDateTime::now_utc();
        let total = self.timers[idx].elapsed_seconds(now);

        self.client
            .update_entry(
                id,
                &UpdateEntryRequest {
                    status: Some(EntryStatus::Paused.as_str().to_string()),
                    total_seconds: Some(total),
                    start_time: Some(now),
                    ..Default::default()
                },
            )
            .await?;

        let timer = &mut self.timers[idx];
        timer.paused = true;
        timer.total_seconds = total;
        timer.start_time = now;
        timer.last_synced_seconds = total;

        Ok(())
    }

    pub async fn resume(&mut self, id: Uuid) -> Result<(), EngineError> {
        if let Some(running) = self.running() {
            return Err(EngineError::AlreadyRunning(running.job_no.clone()));
        }

        let idx = self.index_of(id)?;
        if !self.timers[idx].paused {
            return Err(EngineError::NotPaused);
        }

        let now = OffsetDateTime::now_utc();
        self.client
            .update_entry(
                id,
                &UpdateEntryRequest {
                    status: Some(EntryStatus::Active.as_str().to_string()),
                    start_time: Some(now),
                    ..Default::default()
                },
            )
            .await?;

        let timer = &mut self.timers[idx];
        timer.paused = false;
        timer.start_time = now;

        Ok(())
    }

    /// Terminal stop. `adjust_steps` moves the confirmed total in
    /// 10-minute increments either way, bounded to [0, 23:59:59].
    pub async fn finish(
        &mut self,
        id: Uuid,
        adjust_steps: i64,
        comment: Option<String>,
    ) -> Result<TimeEntry, EngineError> {
        let idx = self.index_of(id)?;
        let fix = self.location.current_fix().map_err(EngineError::Location)?;

        let now = OffsetDateTime::now_utc();
        let total = clamp_total(
            self.timers[idx].elapsed_seconds(now) + adjust_steps * ADJUST_STEP_SECS,
        );

        let entry = self
            .client
            .stop_entry(
                id,
                &StopEntryRequest {
                    total_seconds: Some(total),
                    comment,
                    end_location: Some(vec![fix]),
                },
            )
            .await?;

        self.timers.remove(idx);
        Ok(entry)
    }

    /// Manual back-fill: an already-completed entry with a direct
    /// duration, skipping the active/paused lifecycle entirely.
    pub async fn add_manual(
        &mut self,
        job_no: &str,
        job_name: &str,
        account_no: Option<&str>,
        account_name: Option<&str>,
        hours: i64,
        minutes: i64,
        comment: Option<String>,
    ) -> Result<Uuid, EngineError> {
        let fix = self.location.current_fix().map_err(EngineError::Location)?;
        let total = clamp_total(hours * 3600 + minutes * 60);
        let now = OffsetDateTime::now_utc();

        let req = AddEntryRequest {
            job_no: job_no.to_string(),
            job_name: job_name.to_string(),
            account_no: account_no.map(|v| v.to_string()),
            account_name: account_name.map(|v| v.to_string()),
            comment,
            status: Some("completed".to_string()),
            total_seconds: Some(total),
            start_time: Some(now - Duration::seconds(total)),
            end_time: Some(now),
            start_location: vec![fix.clone()],
            end_location: vec![fix],
            ..Default::default()
        };

        Ok(self.client.create_entry(&req).await?)
    }

    /// Push locally accumulated seconds for running timers whose drift
    /// from the last known server value exceeds the threshold. The push
    /// resets start_time alongside the total, keeping the accumulation
    /// invariant intact for other readers.
    pub async fn reconcile(&mut self) -> Result<usize, EngineError> {
        let now = OffsetDateTime::now_utc();
        let mut pushed = 0;

        for idx in 0..self.timers.len() {
            if self.timers[idx].paused {
                continue;
            }

            let total = self.timers[idx].elapsed_seconds(now);
            if (total - self.timers[idx].last_synced_seconds).abs() <= DRIFT_THRESHOLD_SECS {
                continue;
            }

            self.client
                .update_entry(
                    self.timers[idx].id,
                    &UpdateEntryRequest {
                        total_seconds: Some(total),
                        start_time: Some(now),
                        ..Default::default()
                    },
                )
                .await?;

            let timer = &mut self.timers[idx];
            timer.total_seconds = total;
            timer.start_time = now;
            timer.last_synced_seconds = total;
            pushed += 1;
        }

        Ok(pushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn timer(total_seconds: i64, start_time: OffsetDateTime, paused: bool) -> TimerState {
        TimerState {
            id: Uuid::new_v4(),
            job_no: "J1".to_string(),
            job_name: "Job".to_string(),
            total_seconds,
            start_time,
            paused,
            last_synced_seconds: total_seconds,
        }
    }

    #[test]
    fn elapsed_reconstructs_after_pause_resume_cycle() {
        // start 10:00:00, pause at 10:01:00 -> total 60, start_time reset
        // resume at 10:04:00 -> start_time reset, total stays 60
        // read at 10:06:00 -> 60 + 120 = 180s
        let resumed = timer(60, datetime!(2025-01-06 10:04:00 UTC), false);
        let now = datetime!(2025-01-06 10:06:00 UTC);
        assert_eq!(resumed.elapsed_seconds(now), 180);
        assert_eq!(resumed.elapsed_ms(now), 180_000);
    }

    #[test]
    fn paused_timer_is_frozen() {
        let paused = timer(60, datetime!(2025-01-06 10:01:00 UTC), true);
        let now = datetime!(2025-01-06 10:30:00 UTC);
        assert_eq!(paused.elapsed_seconds(now), 60);
    }

    #[test]
    fn clock_skew_never_goes_backwards() {
        // now before start_time (clock skew after a server-side reset)
        let t = timer(45, datetime!(2025-01-06 10:05:00 UTC), false);
        let now = datetime!(2025-01-06 10:04:30 UTC);
        assert_eq!(t.elapsed_seconds(now), 45);
    }

    #[test]
    fn total_clamping_bounds() {
        assert_eq!(clamp_total(-600), 0);
        assert_eq!(clamp_total(0), 0);
        assert_eq!(clamp_total(3600), 3600);
        assert_eq!(clamp_total(86_400), MAX_TOTAL_SECS);
        assert_eq!(clamp_total(1_000_000), MAX_TOTAL_SECS);
    }

    #[test]
    fn adjustment_steps_are_ten_minutes() {
        let elapsed = 3600;
        assert_eq!(clamp_total(elapsed + 2 * ADJUST_STEP_SECS), 4800);
        assert_eq!(clamp_total(elapsed - 7 * ADJUST_STEP_SECS), 0);
    }
}
