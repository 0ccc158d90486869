use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::middleware::OwnerId;
use crate::startup::AppState;

pub async fn get_setting(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let setting = state
        .db
        .get_setting(owner_id, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Setting '{}' not found", key)))?;
    Ok(Json(setting))
}

pub async fn put_setting(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(key): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let setting = state.db.put_setting(owner_id, &key, &value).await?;
    Ok(Json(setting))
}
