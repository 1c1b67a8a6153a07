// crates/placementflow/src/jobs/repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::jobs::error::JobsError;
use crate::jobs::model::{Job, JobSnapshot, JobStatus, NewJob, SnapshotRow};
use crate::jobs::store::JobStore;
use crate::jobs::transitions::automated_statuses;

#[derive(Clone)]
pub struct JobsRepo {
    pool: PgPool,
}

impl JobsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ----------------------------
    // Create / read
    // ----------------------------

    pub async fn create_job(&self, job: NewJob) -> anyhow::Result<Job> {
        let status = job.job_status.unwrap_or_default();

        let created = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                company_name, role, description,
                application_deadline, online_assessment_date, interview_dates,
                job_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&job.company_name)
        .bind(&job.role)
        .bind(&job.description)
        .bind(job.application_deadline)
        .bind(job.online_assessment_date)
        .bind(&job.interview_dates)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_job(&self, job_id: Uuid) -> anyhow::Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// Newest first. `limit` is clamped to [1, 500].
    pub async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        limit: i64,
    ) -> anyhow::Result<Vec<Job>> {
        let limit = limit.clamp(1, 500);

        let rows = match status {
            Some(st) => {
                sqlx::query_as::<_, Job>(
                    r#"
                    SELECT *
                    FROM jobs
                    WHERE job_status = $1
                    ORDER BY created_at DESC, job_id DESC
                    LIMIT $2
                    "#,
                )
                .bind(st.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Job>(
                    r#"
                    SELECT *
                    FROM jobs
                    ORDER BY created_at DESC, job_id DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Returns (job_status, count) for every status present in the table.
    pub async fn status_counts(&self) -> anyhow::Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT job_status, COUNT(*)
            FROM jobs
            GROUP BY job_status
            ORDER BY job_status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ----------------------------
    // Auto-advance support
    // ----------------------------

    /// Candidate rows for the scheduler: automated statuses with at least one date set.
    #[instrument(skip(self))]
    pub async fn fetch_jobs_eligible_for_auto_update(&self) -> anyhow::Result<Vec<JobSnapshot>> {
        let statuses: Vec<String> = automated_statuses()
            .into_iter()
            .map(String::from)
            .collect();

        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT job_id, job_status, online_assessment_date, interview_dates
            FROM jobs
            WHERE job_status = ANY($1)
              AND (online_assessment_date IS NOT NULL OR interview_dates IS NOT NULL)
            "#,
        )
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let job_id = row.job_id;
            match JobSnapshot::try_from(row) {
                Ok(snapshot) => out.push(snapshot),
                Err(e) => warn!(%job_id, error = %e, "skipping malformed job row"),
            }
        }
        Ok(out)
    }

    pub async fn persist_status(&self, job_id: Uuid, status: JobStatus) -> anyhow::Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE jobs
            SET job_status = $1,
                updated_at = now()
            WHERE job_id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(JobsError::NotFound(job_id).into());
        }
        Ok(())
    }

    // ----------------------------
    // Manual override (admin)
    // ----------------------------

    /// Writes `status` unconditionally; the transition table is not consulted.
    pub async fn set_status(&self, job_id: Uuid, status: JobStatus) -> anyhow::Result<Job> {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET job_status = $1,
                updated_at = now()
            WHERE job_id = $2
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| JobsError::NotFound(job_id).into())
    }
}

#[async_trait]
impl JobStore for JobsRepo {
    async fn fetch_jobs_eligible_for_auto_update(&self) -> anyhow::Result<Vec<JobSnapshot>> {
        JobsRepo::fetch_jobs_eligible_for_auto_update(self).await
    }

    async fn persist_status(&self, job_id: Uuid, status: JobStatus) -> anyhow::Result<()> {
        JobsRepo::persist_status(self, job_id, status).await
    }
}
