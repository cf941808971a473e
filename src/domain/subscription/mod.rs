//! Subscription aggregate

pub mod model;
pub mod repository;

pub use model::{BillingPeriod, NewSubscription, Subscription, SubscriptionChanges, SubscriptionFilter};
pub use repository::SubscriptionRepository;
