use std::future::Future;
use std::sync::Arc;

use placementflow::api;
use placementflow::config;
use placementflow::db;
use placementflow::jobs::{AutoAdvanceRunner, JobsRepo, SpocRepo, StatusScheduler};
use placementflow::logging;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::Config::from_env()?;
    logging::init_tracing();

    let api_addr = cfg.admin_addr.clone();

    info!(
        api = %api_addr.as_deref().unwrap_or("disabled"),
        scheduler_enabled = cfg.scheduler_enabled,
        daily_cron = %cfg.daily_cron,
        frequent_cron = %cfg.frequent_cron,
        utc_offset_minutes = cfg.utc_offset_minutes,
        max_concurrent_updates = cfg.max_concurrent_updates,
        migrate_on_startup = cfg.migrate_on_startup,
        "placement scheduler starting"
    );

    let pool = db::make_pool(&cfg.database_url, &cfg.pool).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let jobs_repo = JobsRepo::new(pool.clone());
    let spoc_repo = SpocRepo::new(pool.clone());
    let runner = AutoAdvanceRunner::new(Arc::new(jobs_repo.clone()), cfg.auto_advance()?);

    // ---- Scheduler ----
    let scheduler = if cfg.scheduler_enabled {
        let scheduler = StatusScheduler::new(runner.clone(), &cfg.schedule()).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        warn!("scheduler disabled; statuses only advance on manual runs");
        None
    };

    // ---- API task ----
    let app = api::router(api::ApiState {
        jobs: jobs_repo,
        spoc: spoc_repo,
        runner,
    });

    let api_handle = tokio::spawn(async move {
        if let Some(addr) = api_addr {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("admin api listening on http://{addr}");
            axum::serve(listener, app).await?;
        } else {
            std::future::pending::<()>().await;
        }
        Ok::<(), anyhow::Error>(())
    });

    let result = run_until_shutdown(api_handle, tokio::signal::ctrl_c()).await;

    let stopped = match scheduler {
        Some(scheduler) => scheduler.shutdown().await,
        None => Ok(()),
    };

    finish(result, stopped)
}

/// Waits for the API task to end or for `shutdown` to fire. On shutdown the
/// API task is aborted before returning.
async fn run_until_shutdown<S>(
    mut api_handle: JoinHandle<anyhow::Result<()>>,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        res = &mut api_handle => res.map_err(anyhow::Error::from).and_then(|r| r),
        res = shutdown => {
            info!("shutdown requested");
            api_handle.abort();
            res.map_err(anyhow::Error::from)
        }
    }
}

/// The service result wins; a failed scheduler stop is only logged.
fn finish(result: anyhow::Result<()>, scheduler_stopped: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = scheduler_stopped {
        error!(error = %e, "scheduler did not stop cleanly");
    }
    result
}
