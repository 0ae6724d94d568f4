//! Background job scheduler.
//!
//! Registers the recurring news cycle and the weekly roundup when
//! `KPULSE_SCHEDULER_ENABLED` is set.

use kpulse_pipeline::{Pipeline, TriggerSource};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every 15 minutes, on the quarter hour.
pub const NEWS_CYCLE_SCHEDULE: &str = "0 */15 * * * *";
/// Mondays at 01:00 UTC.
pub const WEEKLY_ROUNDUP_SCHEDULE: &str = "0 0 1 * * MON";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pipeline: Pipeline) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_news_job(&scheduler, pipeline.clone()).await?;
    register_roundup_job(&scheduler, pipeline).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_news_job(
    scheduler: &JobScheduler,
    pipeline: Pipeline,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(NEWS_CYCLE_SCHEDULE, move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            tracing::info!("scheduler: starting news cycle");
            let report = pipeline.run_news_cycle(TriggerSource::Scheduler).await;
            if report.success {
                tracing::info!("scheduler: news cycle complete");
            } else {
                tracing::warn!(errors = ?report.errors, "scheduler: news cycle finished with errors");
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn register_roundup_job(
    scheduler: &JobScheduler,
    pipeline: Pipeline,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(WEEKLY_ROUNDUP_SCHEDULE, move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            tracing::info!("scheduler: starting weekly roundups");
            match pipeline.roundup_tracked(TriggerSource::Scheduler).await {
                Ok(report) => tracing::info!(
                    generated = report.generated,
                    total = report.total,
                    week = %report.week,
                    "scheduler: weekly roundups complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: weekly roundups failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
