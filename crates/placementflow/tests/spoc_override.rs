mod common;

use common::{insert_job, setup_db, status_of};
use placementflow::jobs::{JobStatus, JobsError, SpocRepo};
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
#[ignore = "needs TEST_DATABASE_URL"]
async fn assigning_a_job_puts_it_in_review() {
    let pool = setup_db().await;
    let spoc = SpocRepo::new(pool.clone());
    let spoc_id = Uuid::new_v4();
    let job_id = insert_job(&pool, JobStatus::InInitialStage, None, &[]).await;

    let assignment = spoc.assign_job(spoc_id, job_id).await.unwrap();
    assert_eq!(assignment.spoc_id, spoc_id);
    assert_eq!(status_of(&pool, job_id).await, "in review");

    let assigned = spoc.assigned_jobs(spoc_id).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].job_id, job_id);

    // assigning twice keeps one row
    spoc.assign_job(spoc_id, job_id).await.unwrap();
    assert_eq!(spoc.assigned_jobs(spoc_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "needs TEST_DATABASE_URL"]
async fn assigned_spoc_can_open_applications() {
    let pool = setup_db().await;
    let spoc = SpocRepo::new(pool.clone());
    let spoc_id = Uuid::new_v4();
    let job_id = insert_job(&pool, JobStatus::InInitialStage, None, &[]).await;
    spoc.assign_job(spoc_id, job_id).await.unwrap();

    let job = spoc
        .update_job_status(spoc_id, job_id, JobStatus::InNegotiation)
        .await
        .unwrap();
    assert_eq!(job.status().unwrap(), JobStatus::InNegotiation);

    spoc.update_job_status(spoc_id, job_id, JobStatus::ApplicationsOpened)
        .await
        .unwrap();
    assert_eq!(status_of(&pool, job_id).await, "applications opened");
}

#[tokio::test]
#[serial]
#[ignore = "needs TEST_DATABASE_URL"]
async fn spoc_cannot_set_scheduler_owned_statuses() {
    let pool = setup_db().await;
    let spoc = SpocRepo::new(pool.clone());
    let spoc_id = Uuid::new_v4();
    let job_id = insert_job(&pool, JobStatus::InInitialStage, None, &[]).await;
    spoc.assign_job(spoc_id, job_id).await.unwrap();

    let err = spoc
        .update_job_status(spoc_id, job_id, JobStatus::CompletedTheDrive)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobsError>(),
        Some(JobsError::SpocStatusNotAllowed(JobStatus::CompletedTheDrive))
    ));
    assert_eq!(status_of(&pool, job_id).await, "in review");
}

#[tokio::test]
#[serial]
#[ignore = "needs TEST_DATABASE_URL"]
async fn unassigned_spoc_is_refused() {
    let pool = setup_db().await;
    let spoc = SpocRepo::new(pool.clone());
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let job_id = insert_job(&pool, JobStatus::InInitialStage, None, &[]).await;
    spoc.assign_job(owner, job_id).await.unwrap();

    let err = spoc
        .update_job_status(stranger, job_id, JobStatus::InNegotiation)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobsError>(),
        Some(JobsError::SpocNotAssigned { spoc_id, .. }) if *spoc_id == stranger
    ));

    let err = spoc
        .update_job_status(stranger, Uuid::new_v4(), JobStatus::InNegotiation)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobsError>(),
        Some(JobsError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "needs TEST_DATABASE_URL"]
async fn assigning_a_missing_job_is_not_found() {
    let pool = setup_db().await;
    let spoc = SpocRepo::new(pool.clone());

    let err = spoc
        .assign_job(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobsError>(),
        Some(JobsError::NotFound(_))
    ));
}
