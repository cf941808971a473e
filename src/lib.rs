//! # Subscription Tracker
//!
//! Tracks user subscriptions to named online services and aggregates their
//! cost over month-granular periods.
//!
//! ## Architecture
//!
//! - **domain**: Month values, subscription and service types, repository traits
//! - **application**: Service-name registry, subscription lifecycle, cost engine
//! - **infrastructure**: SeaORM persistence, migrations, in-memory storage
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Runtime bootstrap and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use domain::{DomainError, DomainResult, MonthValue, Patch, RepositoryProvider};

pub use infrastructure::{
    init_database, run_migrations, DatabaseConfig, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};

pub use interfaces::http::{create_api_router, ApiState};
