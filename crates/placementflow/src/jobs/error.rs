use thiserror::Error;
use uuid::Uuid;

use crate::jobs::model::JobStatus;

/// Domain failures callers need to tell apart (the API maps them to status codes).
/// Everything else travels as a plain `anyhow::Error`.
#[derive(Debug, Error)]
pub enum JobsError {
    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("unknown job status: {0:?}")]
    UnknownStatus(String),

    #[error("spoc {spoc_id} is not assigned to job {job_id}")]
    SpocNotAssigned { spoc_id: Uuid, job_id: Uuid },

    #[error("spoc can only set status to \"in negotiation\" or \"applications opened\", got \"{0}\"")]
    SpocStatusNotAllowed(JobStatus),
}
