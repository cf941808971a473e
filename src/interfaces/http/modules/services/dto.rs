//! Service DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Service;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceDto {
    pub id: i32,
    #[schema(example = "Netflix")]
    pub name: String,
}

impl From<Service> for ServiceDto {
    fn from(s: Service) -> Self {
        Self {
            id: s.id,
            name: s.name,
        }
    }
}
