//! Application layer: service registry, subscription lifecycle and cost
//! aggregation

pub mod services;

pub use services::{
    CostQuery, CostReport, CostService, CreateSubscription, ServiceNameRegistry,
    SubscriptionCost, SubscriptionService, UpdateSubscription,
};
