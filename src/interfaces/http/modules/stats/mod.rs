//! Stats module: cost aggregation over a period

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
