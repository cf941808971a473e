//! Repository access for the domain layer
//!
//! - `RepositoryProvider`: one handle to every per-aggregate repository
//! - `DomainResult`: standard result type for domain operations

use async_trait::async_trait;

use super::service::ServiceRepository;
use super::subscription::SubscriptionRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let service = repos.services().find_by_name("Netflix").await?;
///     let sub = repos.subscriptions().find_by_id(7).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn services(&self) -> &dyn ServiceRepository;
    fn subscriptions(&self) -> &dyn SubscriptionRepository;

    /// Round-trip to the backing store, used by the health endpoint.
    async fn ping(&self) -> DomainResult<()>;
}
