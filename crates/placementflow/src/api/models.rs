// crates/placementflow/src/api/models.rs
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::auto_advance::{PlannedTransition, RunReport};
use crate::jobs::{JobStatus, JobsError, NewJob};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

// Status fields below are plain text so an unknown value is a 400, not a 422.

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub company_name: String,
    pub role: String,
    pub description: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub online_assessment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interview_dates: Vec<String>,
    pub job_status: Option<String>,
}

impl TryFrom<CreateJobRequest> for NewJob {
    type Error = JobsError;

    fn try_from(req: CreateJobRequest) -> Result<Self, Self::Error> {
        let job_status = req
            .job_status
            .as_deref()
            .map(str::parse::<JobStatus>)
            .transpose()?;

        Ok(NewJob {
            company_name: req.company_name,
            role: req.role,
            description: req.description,
            application_deadline: req.application_deadline,
            online_assessment_date: req.online_assessment_date,
            interview_dates: req.interview_dates,
            job_status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub job_status: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub evaluation_date: NaiveDate,
    pub transitions: Vec<PlannedTransition>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub now_utc: DateTime<Utc>,
    pub jobs_by_status: BTreeMap<String, i64>,
    pub last_run: Option<RunReport>,
}
