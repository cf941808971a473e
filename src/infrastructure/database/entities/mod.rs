//! Database entities module

pub mod service;
pub mod subscription;

pub use service::Entity as Service;
pub use subscription::Entity as Subscription;
