// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use metrics::counter;
use tokio::task::JoinHandle;

use crate::config::ingest::IngestConfig;
use crate::ingest::{Deadline, IngestReport, ProviderIngestion};

/// Extra time given to a run after its deadline before it is cancelled outright.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Earliest slot strictly after `now`: today's if still ahead, else tomorrow's.
/// Slots falling into a DST gap are skipped for that day.
pub fn next_fire<Tz: TimeZone>(now: &DateTime<Tz>, slots: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    // Day 2 only matters when every slot of day 1 lands in a DST gap.
    (0..=2u64)
        .filter_map(|off| today.checked_add_days(Days::new(off)))
        .flat_map(|day| slots.iter().map(move |s| day.and_time(*s)))
        .filter_map(|naive| tz.from_local_datetime(&naive).earliest())
        .filter(|at| at > now)
        .min()
}

/// One scheduled run: deadline-bounded ingestion, hard-cancelled shortly after the deadline.
pub async fn run_scheduled(
    ingestion: &ProviderIngestion,
    query: &str,
    count: i64,
    timeout: Duration,
) -> Result<IngestReport> {
    let deadline = Deadline::after(timeout);
    match tokio::time::timeout(
        timeout + CANCEL_GRACE,
        ingestion.ingest_with_deadline(query, count, deadline),
    )
    .await
    {
        Ok(res) => res,
        Err(_) => Err(anyhow!(
            "scheduled ingestion cancelled after {}s",
            (timeout + CANCEL_GRACE).as_secs()
        )),
    }
}

/// Single timer over all configured daily slots. Each firing runs as its own task,
/// so a slow run never delays the next slot.
pub fn spawn_daily_ingestion(ingestion: Arc<ProviderIngestion>, cfg: IngestConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_fired: Option<DateTime<Local>> = None;
        loop {
            // The timer may wake marginally before the wall clock reaches the slot.
            let now = match last_fired {
                Some(prev) => Local::now().max(prev),
                None => Local::now(),
            };
            let Some(at) = next_fire(&now, &cfg.schedule_times) else {
                tracing::warn!(target: "scheduler", "no schedulable slots; scheduler stopped");
                return;
            };
            tracing::info!(target: "scheduler", next = %at.format("%Y-%m-%d %H:%M"), "next provider ingestion");
            tokio::time::sleep((at - now).to_std().unwrap_or_default()).await;
            last_fired = Some(at);

            let ingestion = ingestion.clone();
            let query = cfg.scheduled_query.clone();
            let count = cfg.scheduled_count;
            let timeout = cfg.run_timeout;
            tokio::spawn(async move {
                let t0 = std::time::Instant::now();
                match run_scheduled(&ingestion, &query, count, timeout).await {
                    Ok(report) => {
                        counter!("scheduler_runs_total", "outcome" => "ok").increment(1);
                        tracing::info!(
                            target: "scheduler",
                            ingested = report.accepted_ids.len(),
                            skipped = report.skipped,
                            elapsed_ms = t0.elapsed().as_millis() as u64,
                            "scheduled provider ingestion done"
                        );
                    }
                    Err(e) => {
                        counter!("scheduler_runs_total", "outcome" => "error").increment(1);
                        tracing::error!(
                            target: "scheduler",
                            error = ?e,
                            elapsed_ms = t0.elapsed().as_millis() as u64,
                            "scheduled provider ingestion failed"
                        );
                    }
                }
            });
        }
    })
}
