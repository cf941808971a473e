//! Subscription domain entity

use uuid::Uuid;

use crate::domain::month::MonthValue;
use crate::domain::patch::Patch;

/// A user's recurring monthly payment for a service.
///
/// `service_name` is resolved from the service row at read time; it is not
/// stored on the subscription itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: i64,
    pub user_id: Uuid,
    pub service_id: i32,
    pub service_name: String,
    /// Whole currency units per month
    pub price: i32,
    pub start_date: MonthValue,
    /// `None` means still active
    pub end_date: Option<MonthValue>,
}

impl Subscription {
    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// Last billed month, treating an open end as `now`.
    pub fn effective_end(&self, now: MonthValue) -> MonthValue {
        self.end_date.unwrap_or(now)
    }
}

/// Input for storing a new subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub service_id: i32,
    pub price: i32,
    pub start_date: MonthValue,
    pub end_date: Option<MonthValue>,
}

/// Column-level changes for a partial update.
///
/// `None` / `Patch::Unset` leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChanges {
    pub service_id: Option<i32>,
    pub price: Option<i32>,
    pub start_date: Option<MonthValue>,
    pub end_date: Patch<MonthValue>,
}

impl SubscriptionChanges {
    pub fn is_empty(&self) -> bool {
        self.service_id.is_none()
            && self.price.is_none()
            && self.start_date.is_none()
            && self.end_date.is_unset()
    }
}

/// Optional equality filters shared by listing and cost queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
}

impl SubscriptionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn matches(&self, subscription: &Subscription) -> bool {
        self.user_id.map_or(true, |id| id == subscription.user_id)
            && self
                .service_name
                .as_deref()
                .map_or(true, |name| name == subscription.service_name)
    }
}

/// Optional month bounds for a cost query. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: Option<MonthValue>,
    pub end: Option<MonthValue>,
}

impl BillingPeriod {
    pub fn new(start: Option<MonthValue>, end: Option<MonthValue>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// `end` before `start` is the only invalid shape.
    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    /// Storage-level candidate test: the subscription's interval touches the
    /// period. An open-ended subscription is treated as unbounded on the right.
    pub fn overlaps(&self, subscription: &Subscription) -> bool {
        let starts_in_time = self.end.map_or(true, |end| subscription.start_date <= end);
        let still_running = match (self.start, subscription.end_date) {
            (Some(start), Some(sub_end)) => sub_end >= start,
            _ => true,
        };
        starts_in_time && still_running
    }
}
