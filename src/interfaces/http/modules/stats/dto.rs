//! Stats DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::application::{CostQuery, CostReport, SubscriptionCost};

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct TotalCostParams {
    pub user_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub service_name: Option<String>,
    /// Period start, MM-YYYY
    pub start_date: Option<String>,
    /// Period end, MM-YYYY
    pub end_date: Option<String>,
}

impl From<TotalCostParams> for CostQuery {
    fn from(p: TotalCostParams) -> Self {
        Self {
            user_id: p.user_id,
            service_name: p.service_name,
            start_date: p.start_date,
            end_date: p.end_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PeriodDto {
    #[schema(example = "01-2024")]
    pub start: Option<String>,
    #[schema(example = "12-2024")]
    pub end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FiltersDto {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionCostDto {
    pub id: i64,
    pub service_name: String,
    pub price: i32,
    pub start_date: String,
    pub end_date: Option<String>,
    /// Months billed inside the period
    pub months: u32,
    pub cost: i64,
}

impl From<SubscriptionCost> for SubscriptionCostDto {
    fn from(line: SubscriptionCost) -> Self {
        let sub = line.subscription;
        Self {
            id: sub.id,
            service_name: sub.service_name,
            price: sub.price,
            start_date: sub.start_date.to_string(),
            end_date: sub.end_date.map(|m| m.to_string()),
            months: line.months,
            cost: line.cost,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalCostDto {
    pub total_cost: i64,
    pub subscriptions_count: usize,
    pub period: PeriodDto,
    pub filters: FiltersDto,
    pub subscriptions: Vec<SubscriptionCostDto>,
}

impl From<CostReport> for TotalCostDto {
    fn from(report: CostReport) -> Self {
        Self {
            total_cost: report.total_cost,
            subscriptions_count: report.subscriptions_count,
            period: PeriodDto {
                start: report.period.start.map(|m| m.to_string()),
                end: report.period.end.map(|m| m.to_string()),
            },
            filters: FiltersDto {
                user_id: report.filter.user_id,
                service_name: report.filter.service_name,
            },
            subscriptions: report
                .subscriptions
                .into_iter()
                .map(SubscriptionCostDto::from)
                .collect(),
        }
    }
}
