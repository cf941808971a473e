//! Subscription DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::application::{CreateSubscription, UpdateSubscription};
use crate::domain::{Patch, Subscription};
use crate::shared::pagination::{Page, DEFAULT_LIMIT};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionDto {
    pub id: i64,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    /// MM-YYYY
    #[schema(example = "01-2024")]
    pub start_date: String,
    /// MM-YYYY, `null` while active
    #[schema(example = "12-2024")]
    pub end_date: Option<String>,
}

impl From<Subscription> for SubscriptionDto {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            service_name: s.service_name,
            price: s.price,
            user_id: s.user_id,
            start_date: s.start_date.to_string(),
            end_date: s.end_date.map(|m| m.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedSubscriptionDto {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionListDto {
    pub items: Vec<SubscriptionDto>,
    /// Size of the whole filtered set
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl From<Page<Subscription>> for SubscriptionListDto {
    fn from(page: Page<Subscription>) -> Self {
        let page = page.map(SubscriptionDto::from);
        Self {
            items: page.items,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubscriptionRequest {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[validate(range(min = 0))]
    #[schema(example = 400)]
    pub price: i32,
    pub user_id: Uuid,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl From<CreateSubscriptionRequest> for CreateSubscription {
    fn from(r: CreateSubscriptionRequest) -> Self {
        Self {
            service_name: r.service_name,
            price: r.price,
            user_id: r.user_id,
            start_date: r.start_date,
            end_date: r.end_date,
        }
    }
}

/// Partial update. A missing field is left unchanged; `null` clears it,
/// which only `end_date` allows.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub service_name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub price: Patch<i32>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "02-2025")]
    pub start_date: Patch<String>,
    /// `null`, `""` or `"null"` mark the subscription as still active
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "06-2025")]
    pub end_date: Patch<String>,
}

impl Validate for UpdateSubscriptionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Patch::Value(name) = &self.service_name {
            if name.trim().is_empty() || name.len() > 255 {
                let mut err = ValidationError::new("length");
                err.message = Some("must be 1 to 255 characters".into());
                errors.add("service_name", err);
            }
        }
        if let Patch::Value(price) = self.price {
            if price < 0 {
                let mut err = ValidationError::new("range");
                err.message = Some("must not be negative".into());
                errors.add("price", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<UpdateSubscriptionRequest> for UpdateSubscription {
    fn from(r: UpdateSubscriptionRequest) -> Self {
        Self {
            service_name: r.service_name,
            price: r.price,
            start_date: r.start_date,
            end_date: r.end_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ListSubscriptionsParams {
    /// Page size, 1 to 100
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT as i64
}
