//! Application services

mod cost;
mod service_registry;
mod subscription;

pub use cost::{
    intersection_months, price_candidates, CostQuery, CostReport, CostService, SubscriptionCost,
};
pub use service_registry::ServiceNameRegistry;
pub use subscription::{CreateSubscription, SubscriptionService, UpdateSubscription};

use tracing::error;

use crate::shared::errors::DomainError;

/// Log a storage failure with the operation that hit it.
fn log_storage_failure(op: &'static str, err: &DomainError) {
    if let DomainError::Storage(detail) = err {
        error!(op, error = %detail, "Storage operation failed");
    }
}
