// Date-driven status advancement.
//
// Only the stages listed in AUTO_TRANSITIONS move on their own; every other
// status is changed by people (SPOC / admin) through the override path.

use crate::jobs::calendar::Today;
use crate::jobs::model::{JobSnapshot, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// `online_assessment_date` is set and lies before today.
    AssessmentPassed,
    /// At least one interview date lies before today.
    AnyInterviewPassed,
    /// Every interview date lies before today (and there is at least one).
    AllInterviewsPassed,
}

impl Condition {
    pub fn holds(&self, job: &JobSnapshot, today: &Today) -> bool {
        match self {
            Condition::AssessmentPassed => job
                .online_assessment_date
                .is_some_and(|ts| today.has_passed(ts)),
            Condition::AnyInterviewPassed => job
                .interview_dates
                .iter()
                .any(|raw| today.has_passed_raw(raw)),
            Condition::AllInterviewsPassed => {
                !job.interview_dates.is_empty()
                    && job
                        .interview_dates
                        .iter()
                        .all(|raw| today.has_passed_raw(raw))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: JobStatus,
    pub when: Condition,
    pub to: JobStatus,
}

pub const AUTO_TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: JobStatus::ApplicationsOpened,
        when: Condition::AssessmentPassed,
        to: JobStatus::OtConducted,
    },
    TransitionRule {
        from: JobStatus::OtConducted,
        when: Condition::AnyInterviewPassed,
        to: JobStatus::Interview,
    },
    TransitionRule {
        from: JobStatus::Interview,
        when: Condition::AllInterviewsPassed,
        to: JobStatus::CompletedTheDrive,
    },
];

pub fn rule_for(status: JobStatus) -> Option<&'static TransitionRule> {
    AUTO_TRANSITIONS.iter().find(|rule| rule.from == status)
}

/// Statuses the scheduler is responsible for, in pipeline order.
pub fn automated_statuses() -> Vec<JobStatus> {
    let mut out: Vec<JobStatus> = AUTO_TRANSITIONS.iter().map(|rule| rule.from).collect();
    out.sort();
    out.dedup();
    out
}

pub fn is_automated(status: JobStatus) -> bool {
    rule_for(status).is_some()
}

/// Decides the next status for one job, or `None` when nothing should change.
pub fn next_status(job: &JobSnapshot, today: &Today) -> Option<JobStatus> {
    let rule = rule_for(job.status)?;
    rule.when.holds(job, today).then_some(rule.to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::calendar::utc_zone;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn today() -> Today {
        Today::from_date(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(), utc_zone())
    }

    fn at(days_from_today: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap() + Duration::days(days_from_today)
    }

    fn date_str(days_from_today: i64) -> String {
        at(days_from_today).format("%Y-%m-%d").to_string()
    }

    fn job(status: JobStatus, assessment: Option<i64>, interviews: &[i64]) -> JobSnapshot {
        JobSnapshot {
            job_id: Uuid::new_v4(),
            status,
            online_assessment_date: assessment.map(at),
            interview_dates: interviews.iter().map(|d| date_str(*d)).collect(),
        }
    }

    fn run_to_rest(mut job: JobSnapshot, today: &Today) -> (JobSnapshot, usize) {
        let mut steps = 0;
        while let Some(next) = next_status(&job, today) {
            assert!(next > job.status, "{:?} -> {:?} went backwards", job.status, next);
            job.status = next;
            steps += 1;
            assert!(steps <= AUTO_TRANSITIONS.len(), "engine did not settle");
        }
        (job, steps)
    }

    #[test]
    fn automated_subset_is_declared_by_the_table() {
        assert_eq!(
            automated_statuses(),
            vec![
                JobStatus::ApplicationsOpened,
                JobStatus::OtConducted,
                JobStatus::Interview
            ]
        );
        assert!(!is_automated(JobStatus::CompletedTheDrive));
        assert!(!is_automated(JobStatus::InNegotiation));
    }

    #[test]
    fn assessment_yesterday_advances_but_today_does_not() {
        let t = today();
        assert_eq!(
            next_status(&job(JobStatus::ApplicationsOpened, Some(-1), &[]), &t),
            Some(JobStatus::OtConducted)
        );
        assert_eq!(
            next_status(&job(JobStatus::ApplicationsOpened, Some(0), &[]), &t),
            None
        );
        assert_eq!(
            next_status(&job(JobStatus::ApplicationsOpened, Some(3), &[]), &t),
            None
        );
    }

    #[test]
    fn assessment_later_on_the_same_day_still_counts_as_today() {
        let mut j = job(JobStatus::ApplicationsOpened, None, &[]);
        j.online_assessment_date = Some(Utc.with_ymd_and_hms(2025, 6, 15, 18, 30, 0).unwrap());
        assert_eq!(next_status(&j, &today()), None);

        j.online_assessment_date = Some(Utc.with_ymd_and_hms(2025, 6, 14, 23, 59, 0).unwrap());
        assert_eq!(next_status(&j, &today()), Some(JobStatus::OtConducted));
    }

    #[test]
    fn missing_assessment_date_never_advances() {
        let j = job(JobStatus::ApplicationsOpened, None, &[-30, -20]);
        for offset in [0, 1, 365, 10_000] {
            let t = Today::utc(at(offset));
            assert_eq!(next_status(&j, &t), None);
        }
    }

    #[test]
    fn any_interview_starts_the_interview_stage_but_all_are_needed_to_finish() {
        let t = today();
        let dates = [-1, 1];

        assert_eq!(
            next_status(&job(JobStatus::OtConducted, None, &dates), &t),
            Some(JobStatus::Interview)
        );
        assert_eq!(next_status(&job(JobStatus::Interview, None, &dates), &t), None);

        assert_eq!(
            next_status(&job(JobStatus::Interview, None, &[-3, -1]), &t),
            Some(JobStatus::CompletedTheDrive)
        );
        // a date equal to today is not passed yet
        assert_eq!(next_status(&job(JobStatus::Interview, None, &[-3, 0]), &t), None);
    }

    #[test]
    fn interview_order_does_not_matter() {
        let t = today();
        for dates in [[-5, 2, -1], [2, -1, -5], [-1, -5, 2]] {
            assert_eq!(
                next_status(&job(JobStatus::OtConducted, None, &dates), &t),
                Some(JobStatus::Interview)
            );
            assert_eq!(next_status(&job(JobStatus::Interview, None, &dates), &t), None);
        }
        for dates in [[-5, -2, -1], [-1, -5, -2]] {
            assert_eq!(
                next_status(&job(JobStatus::Interview, None, &dates), &t),
                Some(JobStatus::CompletedTheDrive)
            );
        }
    }

    #[test]
    fn empty_interview_list_never_advances() {
        let t = today();
        assert_eq!(next_status(&job(JobStatus::OtConducted, Some(-9), &[]), &t), None);
        assert_eq!(next_status(&job(JobStatus::Interview, Some(-9), &[]), &t), None);
    }

    #[test]
    fn unparseable_interview_entries_are_not_passed() {
        let t = today();
        let mut j = job(JobStatus::OtConducted, None, &[-2]);
        j.interview_dates.push("to be announced".into());

        assert_eq!(next_status(&j, &t), Some(JobStatus::Interview));

        j.status = JobStatus::Interview;
        assert_eq!(next_status(&j, &t), None);

        let only_garbage = JobSnapshot {
            interview_dates: vec!["".into(), "??".into()],
            ..job(JobStatus::OtConducted, None, &[])
        };
        assert_eq!(next_status(&only_garbage, &t), None);
    }

    #[test]
    fn manual_stages_are_ignored_whatever_the_dates() {
        let t = today();
        for status in [
            JobStatus::InInitialStage,
            JobStatus::InReview,
            JobStatus::InNegotiation,
            JobStatus::CompletedTheDrive,
        ] {
            let j = job(status, Some(-10), &[-9, -8]);
            assert_eq!(next_status(&j, &t), None, "{status}");
        }
    }

    #[test]
    fn never_moves_backwards_and_settles() {
        let t = today();
        let assessments = [None, Some(-2), Some(0), Some(2)];
        let interview_sets: [&[i64]; 5] = [&[], &[-3], &[-3, 4], &[0], &[5, 6]];

        for status in JobStatus::ALL {
            for assessment in assessments {
                for interviews in interview_sets {
                    let j = job(status, assessment, interviews);
                    if let Some(next) = next_status(&j, &t) {
                        assert!(next > status);
                    }

                    let (rested, _) = run_to_rest(j, &t);
                    // a settled job stays settled
                    assert_eq!(next_status(&rested, &t), None);
                }
            }
        }
    }

    #[test]
    fn evaluation_is_idempotent_for_a_fixed_snapshot() {
        let t = today();
        let j = job(JobStatus::Interview, None, &[-4, 3]);
        let first = next_status(&j, &t);
        let second = next_status(&j, &t);
        assert_eq!(first, second);
        assert_eq!(first, None);
    }

    #[test]
    fn one_stage_per_evaluation() {
        // All dates long gone: each call only moves one stage forward.
        let t = today();
        let (rested, steps) = run_to_rest(job(JobStatus::ApplicationsOpened, Some(-30), &[-20, -10]), &t);
        assert_eq!(steps, 3);
        assert_eq!(rested.status, JobStatus::CompletedTheDrive);

        let j = job(JobStatus::ApplicationsOpened, Some(-30), &[-20, -10]);
        assert_eq!(next_status(&j, &t), Some(JobStatus::OtConducted));
    }
}
