//! Service handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::ServiceDto;
use crate::application::ServiceNameRegistry;
use crate::interfaces::http::common::{error_response, ApiError, ApiResponse};
use crate::shared::deadline::with_deadline;

#[derive(Clone)]
pub struct ServiceHandlerState {
    pub registry: Arc<ServiceNameRegistry>,
    pub request_timeout: Duration,
}

#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = i32, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service", body = ApiResponse<ServiceDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_service(
    State(state): State<ServiceHandlerState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ServiceDto>>, ApiError> {
    let service = with_deadline(state.request_timeout, "get_service", state.registry.get(id))
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::success(ServiceDto::from(service))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = i32, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Still referenced by subscriptions")
    )
)]
pub async fn delete_service(
    State(state): State<ServiceHandlerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    with_deadline(
        state.request_timeout,
        "delete_service",
        state.registry.delete(id),
    )
    .await
    .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
