//! Cost aggregation engine
//!
//! Selects subscriptions overlapping a query period, intersects each one's
//! active interval with the period and charges one full month for every
//! calendar month in the intersection.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::log_storage_failure;
use crate::domain::{
    BillingPeriod, DomainResult, MonthValue, RepositoryProvider, Subscription, SubscriptionFilter,
};
use crate::shared::errors::DomainError;

/// Cost query. Dates are optional `MM-YYYY` strings; an empty string counts
/// as absent.
#[derive(Debug, Clone, Default)]
pub struct CostQuery {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One candidate's share of the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCost {
    pub subscription: Subscription,
    pub months: u32,
    pub cost: i64,
}

#[derive(Debug, Clone)]
pub struct CostReport {
    pub total_cost: i64,
    /// Number of candidates, including any that contributed nothing
    pub subscriptions_count: usize,
    pub period: BillingPeriod,
    pub filter: SubscriptionFilter,
    pub subscriptions: Vec<SubscriptionCost>,
}

pub struct CostService {
    repos: Arc<dyn RepositoryProvider>,
}

impl CostService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Total cost with open-ended subscriptions running to the current month.
    pub async fn total_cost(&self, query: CostQuery) -> DomainResult<CostReport> {
        self.total_cost_at(query, MonthValue::current()).await
    }

    /// Same as [`total_cost`](Self::total_cost) with an explicit "now".
    pub async fn total_cost_at(
        &self,
        query: CostQuery,
        now: MonthValue,
    ) -> DomainResult<CostReport> {
        let period = BillingPeriod::new(
            parse_optional(query.start_date.as_deref())?,
            parse_optional(query.end_date.as_deref())?,
        );
        if !period.is_valid() {
            return Err(DomainError::validation(
                "end_date must not be before start_date",
            ));
        }

        let filter = SubscriptionFilter {
            user_id: query.user_id,
            service_name: query
                .service_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        };

        let candidates = self
            .repos
            .subscriptions()
            .find_overlapping(&filter, &period)
            .await
            .inspect_err(|e| log_storage_failure("total_cost", e))?;

        let subscriptions_count = candidates.len();
        let subscriptions = price_candidates(candidates, &period, now);
        let total_cost = subscriptions.iter().map(|line| line.cost).sum();

        debug!(
            total_cost,
            subscriptions_count,
            user_id = ?filter.user_id,
            service_name = ?filter.service_name,
            "Total cost calculated"
        );

        Ok(CostReport {
            total_cost,
            subscriptions_count,
            period,
            filter,
            subscriptions,
        })
    }
}

fn parse_optional(raw: Option<&str>) -> DomainResult<Option<MonthValue>> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(Some(MonthValue::parse(raw)?)),
        _ => Ok(None),
    }
}

/// Months of `subscription` that fall inside `period`, with an open end
/// bounded by the period end or, failing that, by `now`.
///
/// Without any period bounds this is the subscription's whole lifetime.
pub fn intersection_months(
    subscription: &Subscription,
    period: &BillingPeriod,
    now: MonthValue,
) -> u32 {
    let start = match period.start {
        Some(period_start) => subscription.start_date.max(period_start),
        None => subscription.start_date,
    };
    let end = match (subscription.end_date, period.end) {
        (None, Some(period_end)) => period_end,
        (Some(sub_end), Some(period_end)) => sub_end.min(period_end),
        (_, None) => subscription.effective_end(now),
    };

    MonthValue::months_between(start, end).unwrap_or(0)
}

/// Price every candidate. A candidate contributing zero months means the
/// overlap selection and the intersection disagree, so it is logged.
pub fn price_candidates(
    candidates: Vec<Subscription>,
    period: &BillingPeriod,
    now: MonthValue,
) -> Vec<SubscriptionCost> {
    candidates
        .into_iter()
        .map(|subscription| {
            let months = intersection_months(&subscription, period, now);
            if months == 0 {
                warn!(
                    subscription_id = subscription.id,
                    start_date = %subscription.start_date,
                    now = %now,
                    "Overlapping subscription contributed no months"
                );
            }
            let cost = i64::from(subscription.price) * i64::from(months);
            SubscriptionCost {
                subscription,
                months,
                cost,
            }
        })
        .collect()
}
