use eyre::Result;
use jobclock_client::engine::{EngineError, SYNC_INTERVAL_SECS};
use jobclock_client::settings::Settings;
use jobclock_client::utils::format_duration;
use std::io::Write;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;

/// Tick the open timers every second and push accumulated time on the
/// sync interval. A lost connection is reported once, not every tick.
pub async fn run(settings: &Settings) -> Result<()> {
    let mut engine = super::engine(settings)?;
    engine.load().await?;

    if engine.timers().is_empty() {
        println!("No open timers.");
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut ticks: u64 = 0;
    let mut offline_warned = false;

    loop {
        interval.tick().await;
        ticks += 1;

        let now = OffsetDateTime::now_utc();
        let line: Vec<String> = engine
            .timers()
            .iter()
            .map(|t| {
                let marker = if t.paused { "||" } else { ">" };
                format!(
                    "{marker} {} {}",
                    t.job_no,
                    format_duration(t.elapsed_seconds(now))
                )
            })
            .collect();
        print!("\r\x1b[K{}", line.join("   "));
        std::io::stdout().flush()?;

        if ticks % SYNC_INTERVAL_SECS != 0 {
            continue;
        }

        match engine.reconcile().await {
            Ok(pushed) => {
                debug!("reconciled {pushed} timer(s)");
                offline_warned = false;
            }
            Err(EngineError::Api(err)) if err.is_network() => {
                if !offline_warned {
                    println!("\nServer unreachable; timing continues locally.");
                    offline_warned = true;
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}
