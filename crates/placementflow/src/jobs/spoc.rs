use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::jobs::error::JobsError;
use crate::jobs::model::{Job, JobStatus};

/// Targets a SPOC may set by hand. Later stages belong to the scheduler.
pub const SPOC_SETTABLE_STATUSES: [JobStatus; 2] =
    [JobStatus::InNegotiation, JobStatus::ApplicationsOpened];

/// Rejects targets outside [`SPOC_SETTABLE_STATUSES`].
pub fn check_spoc_target(status: JobStatus) -> Result<(), JobsError> {
    if SPOC_SETTABLE_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(JobsError::SpocStatusNotAllowed(status))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SpocAssignment {
    pub spoc_id: Uuid,
    pub job_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignedJob {
    pub job_id: Uuid,
    pub company_name: String,
    pub role: String,
    pub job_status: String,
    pub application_deadline: Option<DateTime<Utc>>,
    pub online_assessment_date: Option<DateTime<Utc>>,
    pub interview_dates: Option<Vec<String>>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SpocRepo {
    pool: PgPool,
}

impl SpocRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Assigns `job_id` to a SPOC and moves the job to `in review`.
    /// Re-assigning is a no-op for the assignment row but still resets the status.
    pub async fn assign_job(&self, spoc_id: Uuid, job_id: Uuid) -> anyhow::Result<SpocAssignment> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE jobs
            SET job_status = $1,
                updated_at = now()
            WHERE job_id = $2
            "#,
        )
        .bind(JobStatus::InReview.as_str())
        .bind(job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(JobsError::NotFound(job_id).into());
        }

        let assignment = sqlx::query_as::<_, SpocAssignment>(
            r#"
            INSERT INTO spoc_job_assignments (spoc_id, job_id)
            VALUES ($1, $2)
            ON CONFLICT (spoc_id, job_id) DO UPDATE
            SET spoc_id = EXCLUDED.spoc_id
            RETURNING spoc_id, job_id, assigned_at
            "#,
        )
        .bind(spoc_id)
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    pub async fn assigned_jobs(&self, spoc_id: Uuid) -> anyhow::Result<Vec<AssignedJob>> {
        let rows = sqlx::query_as::<_, AssignedJob>(
            r#"
            SELECT
                j.job_id, j.company_name, j.role, j.job_status,
                j.application_deadline, j.online_assessment_date, j.interview_dates,
                sa.assigned_at
            FROM spoc_job_assignments sa
            JOIN jobs j ON j.job_id = sa.job_id
            WHERE sa.spoc_id = $1
            ORDER BY sa.assigned_at DESC
            "#,
        )
        .bind(spoc_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// SPOC-side manual override. Restricted to [`SPOC_SETTABLE_STATUSES`] and to
    /// jobs the SPOC is assigned to; never consults the transition table.
    pub async fn update_job_status(
        &self,
        spoc_id: Uuid,
        job_id: Uuid,
        status: JobStatus,
    ) -> anyhow::Result<Job> {
        check_spoc_target(status)?;

        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET job_status = $1,
                updated_at = now()
            WHERE job_id = $2
              AND EXISTS (
                SELECT 1
                FROM spoc_job_assignments
                WHERE spoc_id = $3 AND job_id = $2
              )
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(job_id)
        .bind(spoc_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(job) => Ok(job),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM jobs WHERE job_id = $1)")
                        .bind(job_id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Err(JobsError::SpocNotAssigned { spoc_id, job_id }.into())
                } else {
                    Err(JobsError::NotFound(job_id).into())
                }
            }
        }
    }
}
