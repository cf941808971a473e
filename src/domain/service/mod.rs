//! Service aggregate
//!
//! A named offering (e.g. "Netflix") that subscriptions point at.

pub mod model;
pub mod repository;

pub use model::Service;
pub use repository::ServiceRepository;
