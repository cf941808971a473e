//! Service module: lookup and removal of service names

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
