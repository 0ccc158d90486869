use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::middleware::OwnerId;
use crate::models::{CreateCustomer, UpdateCustomer};
use crate::startup::AppState;

pub async fn create_customer(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(input): Json<CreateCustomer>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.db.create_customer(owner_id, &input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<impl IntoResponse, AppError> {
    let customers = state.db.list_customers(owner_id).await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .db
        .get_customer(owner_id, customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomer>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .db
        .update_customer(owner_id, customer_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_customer(owner_id, customer_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
