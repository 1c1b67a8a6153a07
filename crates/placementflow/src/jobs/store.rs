use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::jobs::model::{JobSnapshot, JobStatus};
use crate::jobs::transitions::is_automated;

/// Data access the auto-advance runner needs, and nothing more.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs whose current status is in the automated subset.
    async fn fetch_jobs_eligible_for_auto_update(&self) -> anyhow::Result<Vec<JobSnapshot>>;

    async fn persist_status(&self, job_id: Uuid, status: JobStatus) -> anyhow::Result<()>;
}

/// Process-local store used by tests and dry runs.
#[derive(Default)]
pub struct InMemoryJobStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    jobs: BTreeMap<Uuid, JobSnapshot>,
    failing_writes: HashSet<Uuid>,
    fail_reads: bool,
    writes: Vec<(Uuid, JobStatus)>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: impl IntoIterator<Item = JobSnapshot>) -> Self {
        let store = Self::new();
        for job in jobs {
            store.insert(job);
        }
        store
    }

    pub fn insert(&self, job: JobSnapshot) {
        self.lock().jobs.insert(job.job_id, job);
    }

    pub fn status_of(&self, job_id: Uuid) -> Option<JobStatus> {
        self.lock().jobs.get(&job_id).map(|job| job.status)
    }

    /// Makes every `persist_status` for `job_id` fail.
    pub fn fail_writes_for(&self, job_id: Uuid) {
        self.lock().failing_writes.insert(job_id);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Successful writes in the order they happened.
    pub fn writes(&self) -> Vec<(Uuid, JobStatus)> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // poisoning is ignored
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn fetch_jobs_eligible_for_auto_update(&self) -> anyhow::Result<Vec<JobSnapshot>> {
        let inner = self.lock();
        if inner.fail_reads {
            anyhow::bail!("in-memory store: reads disabled");
        }
        Ok(inner
            .jobs
            .values()
            .filter(|job| is_automated(job.status))
            .cloned()
            .collect())
    }

    async fn persist_status(&self, job_id: Uuid, status: JobStatus) -> anyhow::Result<()> {
        let mut inner = self.lock();
        if inner.failing_writes.contains(&job_id) {
            anyhow::bail!("in-memory store: write rejected for job {job_id}");
        }
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| anyhow::anyhow!("in-memory store: unknown job {job_id}"))?;
        job.status = status;
        inner.writes.push((job_id, status));
        Ok(())
    }
}
