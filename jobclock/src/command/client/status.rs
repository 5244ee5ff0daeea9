use eyre::Result;
use jobclock_client::settings::Settings;
use jobclock_client::utils::format_duration;
use time::OffsetDateTime;

pub async fn run(settings: &Settings) -> Result<()> {
    let mut engine = super::engine(settings)?;
    engine.load().await?;

    if engine.timers().is_empty() {
        println!("No open timers.");
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    for timer in engine.timers() {
        let state = if timer.paused { "paused" } else { "running" };
        println!(
            "{:<10} {:<8} {}  {}",
            timer.job_no,
            state,
            format_duration(timer.elapsed_seconds(now)),
            timer.job_name
        );
    }
    Ok(())
}
