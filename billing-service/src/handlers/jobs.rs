use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{JobListResponse, JobPayload, JobResponse, JobRow};
use crate::middleware::OwnerId;
use crate::models::{CreateExpense, JobSnapshot, ListJobsFilter, UpdateExpense};
use crate::services::totals;
use crate::startup::AppState;

fn job_response(snapshot: JobSnapshot) -> JobResponse {
    let effective_total = totals::snapshot_total(&snapshot);
    let total_expenses = totals::active_expense_total(&snapshot.expenses);
    JobResponse {
        effective_total,
        total_expenses,
        expected_profit: effective_total - total_expenses,
        job: snapshot.job,
        items: snapshot.items,
        expenses: snapshot.expenses,
    }
}

async fn load_job_response(
    state: &AppState,
    owner_id: Uuid,
    job_id: Uuid,
) -> Result<JobResponse, AppError> {
    let snapshot = state
        .db
        .get_job_snapshot(owner_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    Ok(job_response(snapshot))
}

pub async fn create_job(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(payload): Json<JobPayload>,
) -> Result<impl IntoResponse, AppError> {
    let job_id = state.db.create_job(owner_id, &payload).await?;
    let response = load_job_response(&state, owner_id, job_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(filter): Query<ListJobsFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = filter.page.unwrap_or(1).max(1);
    let page_size = filter.page_size.unwrap_or(20).clamp(1, 100);

    let (rows, total) = state.db.list_jobs(owner_id, &filter).await?;
    let jobs: Vec<JobRow> = rows
        .into_iter()
        .map(|record| JobRow {
            effective_total: record.effective_total(),
            job: record.job,
        })
        .collect();

    let total_pages = (total as f64 / page_size as f64).ceil() as u32;

    Ok(Json(JobListResponse {
        jobs,
        total,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let response = load_job_response(&state, owner_id, job_id).await?;
    Ok(Json(response))
}

pub async fn update_job(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<JobPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.db.update_job(owner_id, job_id, &payload).await?;
    if !updated {
        return Err(AppError::NotFound(anyhow::anyhow!("Job not found")));
    }
    let response = load_job_response(&state, owner_id, job_id).await?;
    Ok(Json(response))
}

pub async fn delete_job(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_job(owner_id, job_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Job not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Record an expense against a job. The response carries the job's fresh
/// derived totals, so callers observe the profit resync immediately.
pub async fn create_expense(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(job_id): Path<Uuid>,
    Json(input): Json<CreateExpense>,
) -> Result<impl IntoResponse, AppError> {
    // ensure the job exists and belongs to this owner
    state
        .db
        .get_job_snapshot(owner_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;

    state.db.create_expense(owner_id, job_id, &input).await?;
    let response = load_job_response(&state, owner_id, job_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update or soft-delete an expense (`active: false` removes it from all
/// totals while keeping the row for audit).
pub async fn update_expense(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(expense_id): Path<Uuid>,
    Json(input): Json<UpdateExpense>,
) -> Result<impl IntoResponse, AppError> {
    let expense = state
        .db
        .update_expense(owner_id, expense_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Expense not found")))?;

    let response = load_job_response(&state, owner_id, expense.job_id).await?;
    Ok(Json(response))
}
