use anyhow::Context;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;
use uuid::Uuid;

use crate::jobs::auto_advance::{AutoAdvanceRunner, RunTrigger};

pub const DEFAULT_DAILY_CRON: &str = "0 0 0 * * *";
pub const DEFAULT_FREQUENT_CRON: &str = "0 0 */6 * * *";

/// Cron expressions use the seconds-first, six-field form and fire in UTC.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub daily_cron: String,
    pub frequent_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_cron: DEFAULT_DAILY_CRON.to_string(),
            frequent_cron: DEFAULT_FREQUENT_CRON.to_string(),
        }
    }
}

/// Owns the two cron triggers that drive [`AutoAdvanceRunner`].
///
/// Built once at startup. Both triggers call the same runner, so a run that
/// overlaps another is skipped by the runner itself.
pub struct StatusScheduler {
    sched: JobScheduler,
    job_ids: Vec<(RunTrigger, Uuid)>,
}

impl StatusScheduler {
    pub async fn new(runner: AutoAdvanceRunner, cfg: &ScheduleConfig) -> anyhow::Result<Self> {
        let sched = JobScheduler::new().await.context("creating scheduler")?;

        let mut job_ids = Vec::with_capacity(2);
        for (cron, trigger) in [
            (cfg.daily_cron.as_str(), RunTrigger::Daily),
            (cfg.frequent_cron.as_str(), RunTrigger::Frequent),
        ] {
            let runner = runner.clone();
            let job = Job::new_async(cron, move |_uuid, _l| {
                let runner = runner.clone();
                Box::pin(async move {
                    runner.run_scheduled(trigger).await;
                })
            })
            .with_context(|| format!("creating scheduler job for cron {cron}"))?;

            let id = sched.add(job).await.context("adding scheduler job")?;
            info!(%trigger, cron, "registered job status trigger");
            job_ids.push((trigger, id));
        }

        Ok(Self { sched, job_ids })
    }

    pub fn triggers(&self) -> &[(RunTrigger, Uuid)] {
        &self.job_ids
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        self.sched.start().await.context("starting scheduler")?;
        info!("job status scheduler started");
        Ok(())
    }

    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.sched
            .shutdown()
            .await
            .context("stopping scheduler")?;
        info!("job status scheduler stopped");
        Ok(())
    }
}
