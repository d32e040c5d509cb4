use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use crate::app::state::AppState;
use crate::dto::job_dto::{ApplicationStatusRequest, ApplyRequest, CreateJobRequest, JobListQuery, UpdateJobRequest};
use crate::handler::{api_json, parse_id};
use crate::middlewares::{parse_json, parse_json_or_default, CurrentUser, MaybeUser, ValidatedJson, ValidatedQuery};
use crate::util::error::HandlerError;

pub async fn list_jobs_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<JobListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.job_service.list_jobs(query, Utc::now()).await?;
    api_json(&res)
}

pub async fn my_applications_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.job_service.my_applications(&user).await?;
    api_json(&res)
}

pub async fn get_job_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "job")?;
    let job = state.job_service.get_job(viewer.as_ref(), &id).await?;
    api_json(&job)
}

pub async fn create_job_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateJobRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let job = state.job_service.create_job(&user, payload).await?;
    Ok((
        StatusCode::CREATED,
        api_json(&json!({ "message": "Job posted successfully", "job": job }))?,
    ))
}

pub async fn update_job_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "job")?;
    let job = state.job_service.managed_job(&user, &id).await?;
    let payload: UpdateJobRequest = parse_json(&body)?;
    let job = state.job_service.update_job(job, payload).await?;
    api_json(&json!({ "message": "Job updated successfully", "job": job }))
}

pub async fn delete_job_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "job")?;
    let job = state.job_service.managed_job(&user, &id).await?;
    state.job_service.delete_job(job).await?;
    api_json(&json!({ "message": "Job deleted successfully" }))
}

pub async fn apply_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "job")?;
    let payload: ApplyRequest = parse_json_or_default(&body)?;
    let application = state.job_service.apply(&user, &id, payload).await?;
    Ok((
        StatusCode::CREATED,
        api_json(&json!({ "message": "Application submitted successfully", "application": application }))?,
    ))
}

pub async fn applications_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "job")?;
    let job = state.job_service.managed_job(&user, &id).await?;
    let res = state.job_service.applications(job).await?;
    api_json(&res)
}

pub async fn update_application_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, application_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "job")?;
    let application_id = parse_id(&application_id, "application")?;
    let job = state.job_service.managed_job(&user, &id).await?;
    let payload: ApplicationStatusRequest = parse_json(&body)?;
    let application = state
        .job_service
        .update_application(job, &application_id, payload)
        .await?;
    api_json(&json!({ "message": "Application status updated successfully", "application": application }))
}
