use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::jobs::auto_advance::{AutoAdvanceRunner, RunOutcome, RunReport, RunTrigger};
use crate::jobs::spoc::{AssignedJob, SpocAssignment};
use crate::jobs::{Job, JobStatus, JobsError, JobsRepo, NewJob, SpocRepo};

pub mod models;

use models::{
    CreateJobRequest, ErrorBody, ListJobsQuery, MetricsResponse, PreviewResponse,
    StatusUpdateRequest,
};

#[derive(Clone)]
pub struct ApiState {
    pub jobs: JobsRepo,
    pub spoc: SpocRepo,
    pub runner: AutoAdvanceRunner,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        // Jobs
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/status", patch(set_job_status))
        // SPOC
        .route("/spoc/:spoc_id/jobs", get(spoc_jobs))
        .route("/spoc/:spoc_id/jobs/:id/assign", post(assign_job))
        .route("/spoc/:spoc_id/jobs/:id/status", patch(spoc_set_job_status))
        // Auto-update
        .route("/auto-update", post(run_auto_update))
        .route("/auto-update/preview", get(preview_auto_update))
        // Metrics
        .route("/metrics", get(metrics))
        // Health
        .route("/health", get(health))
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn err_body(code: StatusCode, msg: impl Into<String>) -> ApiError {
    (code, Json(ErrorBody { error: msg.into() }))
}

fn api_err(e: anyhow::Error) -> ApiError {
    match e.downcast_ref::<JobsError>() {
        Some(JobsError::NotFound(_)) => err_body(StatusCode::NOT_FOUND, e.to_string()),
        Some(JobsError::UnknownStatus(_)) | Some(JobsError::SpocStatusNotAllowed(_)) => {
            err_body(StatusCode::BAD_REQUEST, e.to_string())
        }
        Some(JobsError::SpocNotAssigned { .. }) => err_body(StatusCode::FORBIDDEN, e.to_string()),
        None => {
            error!(error = %e, "request failed");
            err_body(StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
        }
    }
}

fn parse_status(raw: &str) -> Result<JobStatus, ApiError> {
    raw.parse::<JobStatus>()
        .map_err(|e| err_body(StatusCode::BAD_REQUEST, e.to_string()))
}

pub async fn list_jobs(
    State(state): State<ApiState>,
    Query(q): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let status = q.status.as_deref().map(parse_status).transpose()?;
    let jobs = state
        .jobs
        .list_jobs(status, q.limit.unwrap_or(100))
        .await
        .map_err(api_err)?;
    Ok(Json(jobs))
}

pub async fn create_job(
    State(state): State<ApiState>,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    if body.company_name.trim().is_empty() {
        return Err(err_body(StatusCode::BAD_REQUEST, "company_name is required"));
    }
    if body.role.trim().is_empty() {
        return Err(err_body(StatusCode::BAD_REQUEST, "role is required"));
    }

    let new_job = NewJob::try_from(body).map_err(|e| api_err(e.into()))?;
    let job = state.jobs.create_job(new_job).await.map_err(api_err)?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    match state.jobs.get_job(id).await.map_err(api_err)? {
        Some(job) => Ok(Json(job)),
        None => Err(api_err(JobsError::NotFound(id).into())),
    }
}

/// Admin override: any status, no transition rules.
pub async fn set_job_status(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Job>, ApiError> {
    let status = parse_status(&body.job_status)?;
    let job = state.jobs.set_status(id, status).await.map_err(api_err)?;
    info!(job_id = %id, %status, "job status set manually");
    Ok(Json(job))
}

pub async fn spoc_jobs(
    State(state): State<ApiState>,
    Path(spoc_id): Path<Uuid>,
) -> Result<Json<Vec<AssignedJob>>, ApiError> {
    let jobs = state.spoc.assigned_jobs(spoc_id).await.map_err(api_err)?;
    Ok(Json(jobs))
}

pub async fn assign_job(
    State(state): State<ApiState>,
    Path((spoc_id, id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<SpocAssignment>), ApiError> {
    let assignment = state.spoc.assign_job(spoc_id, id).await.map_err(api_err)?;
    info!(%spoc_id, job_id = %id, "job assigned to spoc");
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn spoc_set_job_status(
    State(state): State<ApiState>,
    Path((spoc_id, id)): Path<(Uuid, Uuid)>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Job>, ApiError> {
    let status = parse_status(&body.job_status)?;
    let job = state
        .spoc
        .update_job_status(spoc_id, id, status)
        .await
        .map_err(api_err)?;
    info!(%spoc_id, job_id = %id, %status, "job status set by spoc");
    Ok(Json(job))
}

pub async fn run_auto_update(
    State(state): State<ApiState>,
) -> Result<Json<RunReport>, ApiError> {
    match state
        .runner
        .run(RunTrigger::Manual, Utc::now())
        .await
        .map_err(api_err)?
    {
        RunOutcome::Completed(report) => Ok(Json(report)),
        RunOutcome::Skipped => Err(err_body(
            StatusCode::CONFLICT,
            "an auto-update run is already in progress",
        )),
    }
}

pub async fn preview_auto_update(
    State(state): State<ApiState>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let now = Utc::now();
    let transitions = state.runner.preview(now).await.map_err(api_err)?;
    Ok(Json(PreviewResponse {
        evaluation_date: state.runner.today(now).date(),
        transitions,
    }))
}

pub async fn metrics(State(state): State<ApiState>) -> Result<Json<MetricsResponse>, ApiError> {
    let jobs_by_status = state
        .jobs
        .status_counts()
        .await
        .map_err(api_err)?
        .into_iter()
        .collect();

    Ok(Json(MetricsResponse {
        now_utc: Utc::now(),
        jobs_by_status,
        last_run: state.runner.last_report().await,
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
