//! Service repository interface

use async_trait::async_trait;

use super::model::Service;
use crate::domain::DomainResult;

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Service>>;
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Service>>;
    /// Fails with `Conflict` when the name is already taken.
    async fn insert(&self, name: &str) -> DomainResult<Service>;
    /// Fails with `NotFound` for an unknown id and `ServiceInUse` while
    /// any subscription references it.
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
