use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{JobRow, TopsheetPayload, TopsheetResponse};
use crate::middleware::OwnerId;
use crate::models::Topsheet;
use crate::services::totals;
use crate::startup::AppState;

async fn topsheet_response(
    state: &AppState,
    owner_id: Uuid,
    topsheet: Topsheet,
) -> Result<TopsheetResponse, AppError> {
    let snapshots = state
        .db
        .topsheet_member_snapshots(owner_id, topsheet.topsheet_id)
        .await?;
    let rollup = totals::topsheet_rollup(&snapshots);
    let jobs = snapshots
        .into_iter()
        .map(|snapshot| JobRow {
            effective_total: totals::snapshot_total(&snapshot),
            job: snapshot.job,
        })
        .collect();

    Ok(TopsheetResponse {
        topsheet,
        jobs,
        rollup,
    })
}

pub async fn create_topsheet(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(payload): Json<TopsheetPayload>,
) -> Result<impl IntoResponse, AppError> {
    let topsheet = state.db.create_topsheet(owner_id, &payload).await?;
    let response = topsheet_response(&state, owner_id, topsheet).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_topsheets(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<impl IntoResponse, AppError> {
    let topsheets = state.db.list_topsheets(owner_id).await?;
    Ok(Json(topsheets))
}

pub async fn get_topsheet(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(topsheet_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let topsheet = state
        .db
        .get_topsheet(owner_id, topsheet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Topsheet not found")))?;
    let response = topsheet_response(&state, owner_id, topsheet).await?;
    Ok(Json(response))
}

pub async fn update_topsheet(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(topsheet_id): Path<Uuid>,
    Json(payload): Json<TopsheetPayload>,
) -> Result<impl IntoResponse, AppError> {
    let topsheet = state
        .db
        .update_topsheet(owner_id, topsheet_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Topsheet not found")))?;
    let response = topsheet_response(&state, owner_id, topsheet).await?;
    Ok(Json(response))
}

/// Delete a topsheet. Its member jobs are unlinked, never deleted.
pub async fn delete_topsheet(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(topsheet_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_topsheet(owner_id, topsheet_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Topsheet not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
