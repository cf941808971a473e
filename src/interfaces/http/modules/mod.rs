pub mod health;
pub mod services;
pub mod stats;
pub mod subscriptions;
