//! Recurring collection on a cron schedule.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use top10_core::AppConfig;
use top10_db::{PgRankingStore, PoolConfig};
use top10_scraper::Top10Client;

use crate::pipeline::run_pipeline;

/// Registers the weekly collection job and blocks until Ctrl-C.
///
/// Every triggered run reuses the process-wide pool from
/// [`top10_db::shared_pool`] and the same HTTP client.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset or unreachable at startup, the cron
/// expression is invalid, or the scheduler cannot be started.
pub(crate) async fn run_scheduler(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let database_url: Arc<str> = Arc::from(config.require_database_url()?);
    let pool = top10_db::shared_pool(&database_url, PoolConfig::from_app_config(&config)).await?;
    top10_db::ping(&pool).await?;

    let client = Arc::new(Top10Client::from_config(&config)?);
    let mut scheduler = JobScheduler::new().await?;

    let job_config = Arc::clone(&config);
    let job = Job::new_async(config.schedule.as_str(), move |_uuid, _lock| {
        let config = Arc::clone(&job_config);
        let client = Arc::clone(&client);
        let database_url = Arc::clone(&database_url);

        Box::pin(async move {
            tracing::info!("scheduler: starting weekly collection run");
            let pool = match top10_db::shared_pool(
                &database_url,
                PoolConfig::from_app_config(&config),
            )
            .await
            {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: database unavailable, skipping run");
                    return;
                }
            };
            let store = PgRankingStore::new(pool);
            let result = run_pipeline(&config, &client, &store, None).await;
            tracing::info!(
                run_id = %result.run_id,
                status = %result.status,
                saved = result.saved,
                "scheduler: weekly collection run complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(schedule = %config.schedule, "scheduler started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}
