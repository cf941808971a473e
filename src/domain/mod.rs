//! Domain layer: month values, aggregates and repository interfaces

pub mod month;
pub mod patch;
pub mod repositories;
pub mod service;
pub mod subscription;

pub use month::{MonthParseError, MonthValue};
pub use patch::Patch;
pub use repositories::{DomainResult, RepositoryProvider};
pub use service::{Service, ServiceRepository};
pub use subscription::{
    BillingPeriod, NewSubscription, Subscription, SubscriptionChanges, SubscriptionFilter,
    SubscriptionRepository,
};

pub use crate::shared::errors::DomainError;
