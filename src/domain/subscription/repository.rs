//! Subscription repository interface

use async_trait::async_trait;

use super::model::{BillingPeriod, NewSubscription, Subscription, SubscriptionChanges, SubscriptionFilter};
use crate::domain::DomainResult;
use crate::shared::pagination::Page;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Returns the generated id. `Conflict` on a duplicate
    /// (user, service, start) triple, `NotFound` for an unknown service.
    async fn insert(&self, subscription: NewSubscription) -> DomainResult<i64>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Subscription>>;

    /// `NotFound` when no row has this id.
    async fn update(&self, id: i64, changes: SubscriptionChanges) -> DomainResult<()>;

    /// `NotFound` when no row has this id.
    async fn delete(&self, id: i64) -> DomainResult<()>;

    /// Filtered page ordered by id ascending, plus the unpaged total.
    async fn list(
        &self,
        filter: &SubscriptionFilter,
        limit: u64,
        offset: u64,
    ) -> DomainResult<Page<Subscription>>;

    /// Every subscription matching `filter` whose interval overlaps `period`.
    async fn find_overlapping(
        &self,
        filter: &SubscriptionFilter,
        period: &BillingPeriod,
    ) -> DomainResult<Vec<Subscription>>;
}
