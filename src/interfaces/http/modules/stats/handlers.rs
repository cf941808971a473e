//! Stats handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};

use super::dto::{TotalCostDto, TotalCostParams};
use crate::application::CostService;
use crate::interfaces::http::common::{error_response, ApiError, ApiResponse, ValidatedQuery};
use crate::shared::deadline::with_deadline;

#[derive(Clone)]
pub struct StatsHandlerState {
    pub costs: Arc<CostService>,
    pub request_timeout: Duration,
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/total",
    tag = "Stats",
    params(TotalCostParams),
    responses(
        (status = 200, description = "Total cost over the period", body = ApiResponse<TotalCostDto>),
        (status = 400, description = "Malformed date or end before start")
    )
)]
pub async fn get_total_cost(
    State(state): State<StatsHandlerState>,
    ValidatedQuery(params): ValidatedQuery<TotalCostParams>,
) -> Result<Json<ApiResponse<TotalCostDto>>, ApiError> {
    let report = with_deadline(
        state.request_timeout,
        "total_cost",
        state.costs.total_cost(params.into()),
    )
    .await
    .map_err(error_response)?;

    Ok(Json(ApiResponse::success(TotalCostDto::from(report))))
}
