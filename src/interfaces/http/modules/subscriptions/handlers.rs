//! Subscription handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateSubscriptionRequest, CreatedSubscriptionDto, ListSubscriptionsParams,
    SubscriptionDto, SubscriptionListDto, UpdateSubscriptionRequest,
};
use crate::application::SubscriptionService;
use crate::domain::SubscriptionFilter;
use crate::interfaces::http::common::{
    error_response, ApiError, ApiResponse, ValidatedJson, ValidatedQuery,
};
use crate::shared::deadline::with_deadline;

/// Subscription handler state
#[derive(Clone)]
pub struct SubscriptionHandlerState {
    pub subscriptions: Arc<SubscriptionService>,
    pub request_timeout: Duration,
}

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<CreatedSubscriptionDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Same user, service and start month already exists")
    )
)]
pub async fn create_subscription(
    State(state): State<SubscriptionHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedSubscriptionDto>>), ApiError> {
    let id = with_deadline(
        state.request_timeout,
        "create_subscription",
        state.subscriptions.create(request.into()),
    )
    .await
    .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedSubscriptionDto { id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    params(ListSubscriptionsParams),
    responses(
        (status = 200, description = "Subscription page", body = ApiResponse<SubscriptionListDto>),
        (status = 400, description = "Invalid limit, offset or user_id")
    )
)]
pub async fn list_subscriptions(
    State(state): State<SubscriptionHandlerState>,
    ValidatedQuery(params): ValidatedQuery<ListSubscriptionsParams>,
) -> Result<Json<ApiResponse<SubscriptionListDto>>, ApiError> {
    let filter = SubscriptionFilter {
        user_id: params.user_id,
        service_name: params
            .service_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
    };

    // Validated as non-negative above
    let limit = params.limit.unsigned_abs();
    let offset = params.offset.unsigned_abs();

    let page = with_deadline(
        state.request_timeout,
        "list_subscriptions",
        state.subscriptions.list(filter, limit, offset),
    )
    .await
    .map_err(error_response)?;

    Ok(Json(ApiResponse::success(SubscriptionListDto::from(page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription details", body = ApiResponse<SubscriptionDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_subscription(
    State(state): State<SubscriptionHandlerState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SubscriptionDto>>, ApiError> {
    let subscription = with_deadline(
        state.request_timeout,
        "get_subscription",
        state.subscriptions.get(id),
    )
    .await
    .map_err(error_response)?;

    Ok(Json(ApiResponse::success(SubscriptionDto::from(subscription))))
}

#[utoipa::path(
    put,
    path = "/api/v1/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Subscription ID")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Updated subscription", body = ApiResponse<SubscriptionDto>),
        (status = 400, description = "Validation error or empty update"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Update collides with an existing subscription")
    )
)]
pub async fn update_subscription(
    State(state): State<SubscriptionHandlerState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateSubscriptionRequest>,
) -> Result<Json<ApiResponse<SubscriptionDto>>, ApiError> {
    let subscriptions = state.subscriptions.clone();
    let updated = with_deadline(state.request_timeout, "update_subscription", async move {
        subscriptions.update(id, request.into()).await?;
        subscriptions.get(id).await
    })
    .await
    .map_err(error_response)?;

    Ok(Json(ApiResponse::success(SubscriptionDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Subscription ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_subscription(
    State(state): State<SubscriptionHandlerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    with_deadline(
        state.request_timeout,
        "delete_subscription",
        state.subscriptions.delete(id),
    )
    .await
    .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
