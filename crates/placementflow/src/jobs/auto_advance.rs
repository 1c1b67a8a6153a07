use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::jobs::calendar::{utc_zone, Today};
use crate::jobs::model::{JobSnapshot, JobStatus};
use crate::jobs::store::JobStore;
use crate::jobs::transitions::next_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Daily,
    Frequent,
    Manual,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Daily => "daily",
            RunTrigger::Frequent => "frequent",
            RunTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTransition {
    pub job_id: Uuid,
    pub from: JobStatus,
    pub to: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub trigger: RunTrigger,
    pub evaluation_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub evaluated: usize,
    pub updated: usize,
    pub failed: usize,
    /// Transitions that were written, ordered by job id.
    pub transitions: Vec<PlannedTransition>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Another run was still in flight.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct AutoAdvanceConfig {
    /// Zone "today" and every job date are truncated in.
    pub zone: FixedOffset,
    pub max_concurrent_updates: usize,
}

impl Default for AutoAdvanceConfig {
    fn default() -> Self {
        Self {
            zone: utc_zone(),
            max_concurrent_updates: 8,
        }
    }
}

/// Runs the transition engine over every eligible job and persists the changes.
///
/// Cheap to clone; clones share the overlap guard and the last report.
#[derive(Clone)]
pub struct AutoAdvanceRunner {
    store: Arc<dyn JobStore>,
    cfg: AutoAdvanceConfig,
    run_lock: Arc<Mutex<()>>,
    last_report: Arc<RwLock<Option<RunReport>>>,
}

/// Pure part of a run: which jobs move, and where to.
pub fn plan(jobs: &[JobSnapshot], today: &Today) -> Vec<PlannedTransition> {
    jobs.iter()
        .filter_map(|job| {
            next_status(job, today).map(|to| PlannedTransition {
                job_id: job.job_id,
                from: job.status,
                to,
            })
        })
        .collect()
}

impl AutoAdvanceRunner {
    pub fn new(store: Arc<dyn JobStore>, cfg: AutoAdvanceConfig) -> Self {
        Self {
            store,
            cfg,
            run_lock: Arc::new(Mutex::new(())),
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> Today {
        Today::at(now, self.cfg.zone)
    }

    /// What a run at `now` would change, without writing anything.
    pub async fn preview(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<PlannedTransition>> {
        let jobs = self.store.fetch_jobs_eligible_for_auto_update().await?;
        Ok(plan(&jobs, &self.today(now)))
    }

    pub async fn last_report(&self) -> Option<RunReport> {
        self.last_report.read().await.clone()
    }

    /// One batch. Skipped (not queued) when a previous batch is still running.
    pub async fn run(&self, trigger: RunTrigger, now: DateTime<Utc>) -> anyhow::Result<RunOutcome> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!(%trigger, "auto-update already in flight; skipping this run");
            return Ok(RunOutcome::Skipped);
        };

        let report = self.run_once(trigger, now).await?;
        *self.last_report.write().await = Some(report.clone());
        Ok(RunOutcome::Completed(report))
    }

    /// Entry point for timer triggers: errors are logged, never propagated.
    pub async fn run_scheduled(&self, trigger: RunTrigger) {
        info!(%trigger, "running job status auto-update");
        if let Err(e) = self.run(trigger, Utc::now()).await {
            error!(%trigger, error = %e, "job status auto-update failed");
        }
    }

    async fn run_once(&self, trigger: RunTrigger, now: DateTime<Utc>) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let today = self.today(now);

        let jobs = self.store.fetch_jobs_eligible_for_auto_update().await?;
        let planned = plan(&jobs, &today);

        let semaphore = Arc::new(Semaphore::new(self.cfg.max_concurrent_updates.max(1)));
        let mut join_set = JoinSet::new();

        for transition in planned {
            let permit = semaphore.clone().acquire_owned().await?;
            let store = self.store.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let res = store.persist_status(transition.job_id, transition.to).await;
                (transition, res)
            });
        }

        let mut applied = Vec::new();
        let mut failed = 0usize;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((t, Ok(()))) => {
                    info!(%run_id, job_id = %t.job_id, from = %t.from, to = %t.to, "job status advanced");
                    applied.push(t);
                }
                Ok((t, Err(e))) => {
                    // left in its old status; the next tick picks it up again
                    error!(%run_id, job_id = %t.job_id, to = %t.to, error = %e, "failed to persist job status");
                    failed += 1;
                }
                Err(e) => {
                    error!(%run_id, error = %e, "status write task aborted");
                    failed += 1;
                }
            }
        }

        applied.sort_by_key(|t| t.job_id);

        let report = RunReport {
            run_id,
            trigger,
            evaluation_date: today.date(),
            started_at,
            finished_at: Utc::now(),
            evaluated: jobs.len(),
            updated: applied.len(),
            failed,
            transitions: applied,
        };

        info!(
            %run_id,
            %trigger,
            evaluation_date = %report.evaluation_date,
            evaluated = report.evaluated,
            updated = report.updated,
            failed = report.failed,
            "job status auto-update completed"
        );

        Ok(report)
    }
}
