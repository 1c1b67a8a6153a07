use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs::error::JobsError;

/// Recruitment pipeline stage of a job posting.
///
/// Variants are declared in pipeline order, so `Ord` follows the sequence
/// `in initial stage → ... → completed the drive`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    InInitialStage,
    InReview,
    InNegotiation,
    ApplicationsOpened,
    OtConducted,
    Interview,
    CompletedTheDrive,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::InInitialStage,
        JobStatus::InReview,
        JobStatus::InNegotiation,
        JobStatus::ApplicationsOpened,
        JobStatus::OtConducted,
        JobStatus::Interview,
        JobStatus::CompletedTheDrive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::InInitialStage => "in initial stage",
            JobStatus::InReview => "in review",
            JobStatus::InNegotiation => "in negotiation",
            JobStatus::ApplicationsOpened => "applications opened",
            JobStatus::OtConducted => "ot conducted",
            JobStatus::Interview => "interview",
            JobStatus::CompletedTheDrive => "completed the drive",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| JobsError::UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for JobStatus {
    type Error = JobsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Full job row as stored in `jobs`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Job {
    pub job_id: Uuid,
    pub company_name: String,
    pub role: String,
    pub description: Option<String>,

    pub job_status: String,

    pub application_deadline: Option<DateTime<Utc>>,
    pub online_assessment_date: Option<DateTime<Utc>>,
    pub interview_dates: Option<Vec<String>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn status(&self) -> Result<JobStatus, JobsError> {
        self.job_status.parse()
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub company_name: String,
    pub role: String,
    pub description: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub online_assessment_date: Option<DateTime<Utc>>,
    pub interview_dates: Vec<String>,
    /// Defaults to `in initial stage`.
    pub job_status: Option<JobStatus>,
}

/// The slice of a job the transition engine looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub online_assessment_date: Option<DateTime<Utc>>,
    /// Raw entries as stored; unparseable ones are tolerated by the engine.
    pub interview_dates: Vec<String>,
}

/// Row shape returned by the auto-update candidate query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub job_id: Uuid,
    pub job_status: String,
    pub online_assessment_date: Option<DateTime<Utc>>,
    pub interview_dates: Option<Vec<String>>,
}

impl TryFrom<SnapshotRow> for JobSnapshot {
    type Error = JobsError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        Ok(JobSnapshot {
            job_id: row.job_id,
            status: row.job_status.parse()?,
            online_assessment_date: row.online_assessment_date,
            interview_dates: row.interview_dates.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order_follows_pipeline() {
        let mut sorted = JobStatus::ALL;
        sorted.sort();
        assert_eq!(sorted, JobStatus::ALL);
        assert!(JobStatus::ApplicationsOpened < JobStatus::CompletedTheDrive);
    }

    #[test]
    fn parses_known_statuses_and_rejects_free_text() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert_eq!(
            " OT Conducted ".parse::<JobStatus>().unwrap(),
            JobStatus::OtConducted
        );

        let err = "on hold".parse::<JobStatus>().unwrap_err();
        assert!(matches!(err, JobsError::UnknownStatus(s) if s == "on hold"));
    }

    #[test]
    fn serde_uses_portal_strings() {
        let json = serde_json::to_string(&JobStatus::CompletedTheDrive).unwrap();
        assert_eq!(json, "\"completed the drive\"");

        let back: JobStatus = serde_json::from_str("\"applications opened\"").unwrap();
        assert_eq!(back, JobStatus::ApplicationsOpened);
        assert!(serde_json::from_str::<JobStatus>("\"closed\"").is_err());
    }
}
