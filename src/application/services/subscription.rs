//! Subscription lifecycle manager
//!
//! Validates caller input, resolves service names and delegates to the
//! subscription repository. Input is checked before any storage round trip
//! where possible.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::log_storage_failure;
use super::service_registry::ServiceNameRegistry;
use crate::domain::{
    DomainResult, MonthValue, NewSubscription, Patch, RepositoryProvider, Subscription,
    SubscriptionChanges, SubscriptionFilter,
};
use crate::shared::errors::DomainError;
use crate::shared::pagination::{Page, MAX_LIMIT};

/// Input for creating a subscription. Dates are `MM-YYYY` strings.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Partial update. `Patch::Unset` leaves a field as stored.
///
/// Only `end_date` may be cleared; `""` and `"null"` as values also clear it.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub service_name: Patch<String>,
    pub price: Patch<i32>,
    pub start_date: Patch<String>,
    pub end_date: Patch<String>,
}

impl UpdateSubscription {
    pub fn is_empty(&self) -> bool {
        self.service_name.is_unset()
            && self.price.is_unset()
            && self.start_date.is_unset()
            && self.end_date.is_unset()
    }
}

pub struct SubscriptionService {
    repos: Arc<dyn RepositoryProvider>,
    registry: Arc<ServiceNameRegistry>,
}

impl SubscriptionService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, registry: Arc<ServiceNameRegistry>) -> Self {
        Self { repos, registry }
    }

    pub async fn create(&self, input: CreateSubscription) -> DomainResult<i64> {
        let start_date = MonthValue::parse(&input.start_date)?;
        let end_date = match input.end_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(MonthValue::parse(raw)?),
            _ => None,
        };
        if let Some(end) = end_date {
            if end < start_date {
                return Err(DomainError::validation(
                    "end_date must not be before start_date",
                ));
            }
        }
        if input.price < 0 {
            return Err(DomainError::validation("price must not be negative"));
        }

        let service_id = self.registry.get_or_create(&input.service_name).await?;

        let id = self
            .repos
            .subscriptions()
            .insert(NewSubscription {
                user_id: input.user_id,
                service_id,
                price: input.price,
                start_date,
                end_date,
            })
            .await
            .inspect_err(|e| log_storage_failure("create_subscription", e))?;

        info!(
            subscription_id = id,
            user_id = %input.user_id,
            service_id,
            price = input.price,
            start_date = %start_date,
            "Subscription created"
        );
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> DomainResult<Subscription> {
        self.repos
            .subscriptions()
            .find_by_id(id)
            .await
            .inspect_err(|e| log_storage_failure("get_subscription", e))?
            .ok_or_else(|| DomainError::not_found("Subscription", "id", id))
    }

    pub async fn update(&self, id: i64, input: UpdateSubscription) -> DomainResult<()> {
        if input.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }

        let price = match input.price {
            Patch::Unset => None,
            Patch::Clear => return Err(DomainError::validation("price cannot be null")),
            Patch::Value(price) if price < 0 => {
                return Err(DomainError::validation("price must not be negative"))
            }
            Patch::Value(price) => Some(price),
        };

        let start_date = match &input.start_date {
            Patch::Unset => None,
            Patch::Clear => return Err(DomainError::validation("start_date cannot be null")),
            Patch::Value(raw) => Some(MonthValue::parse(raw)?),
        };

        let end_date = match &input.end_date {
            Patch::Unset => Patch::Unset,
            Patch::Clear => Patch::Clear,
            Patch::Value(raw) if is_clear_sentinel(raw) => Patch::Clear,
            Patch::Value(raw) => Patch::Value(MonthValue::parse(raw)?),
        };

        let service_name = match &input.service_name {
            Patch::Unset => None,
            Patch::Clear => return Err(DomainError::validation("service_name cannot be null")),
            Patch::Value(name) => Some(name.as_str()),
        };

        // Both dates must be checked against their final values, which may
        // mix new input with what is already stored.
        if start_date.is_some() || matches!(end_date, Patch::Value(_)) {
            let current = self.get(id).await?;
            let final_start = start_date.unwrap_or(current.start_date);
            let final_end = end_date.clone().apply_to(current.end_date);
            if matches!(final_end, Some(end) if end < final_start) {
                return Err(DomainError::validation(
                    "end_date must not be before start_date",
                ));
            }
        }

        let service_id = match service_name {
            Some(name) => Some(self.registry.get_or_create(name).await?),
            None => None,
        };

        let changes = SubscriptionChanges {
            service_id,
            price,
            start_date,
            end_date,
        };
        self.repos
            .subscriptions()
            .update(id, changes)
            .await
            .inspect_err(|e| log_storage_failure("update_subscription", e))?;

        info!(subscription_id = id, "Subscription updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        self.repos
            .subscriptions()
            .delete(id)
            .await
            .inspect_err(|e| log_storage_failure("delete_subscription", e))?;

        info!(subscription_id = id, "Subscription deleted");
        Ok(())
    }

    /// Filtered page ordered by id. Bounds on `limit`/`offset` are the
    /// caller's responsibility.
    pub async fn list(
        &self,
        filter: SubscriptionFilter,
        limit: u64,
        offset: u64,
    ) -> DomainResult<Page<Subscription>> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        self.repos
            .subscriptions()
            .list(&filter, limit, offset)
            .await
            .inspect_err(|e| log_storage_failure("list_subscriptions", e))
    }
}

fn is_clear_sentinel(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == "null"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> SubscriptionService {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let registry = Arc::new(ServiceNameRegistry::new(repos.clone()));
        SubscriptionService::new(repos, registry)
    }

    fn create_input(user_id: Uuid, start: &str, end: Option<&str>) -> CreateSubscription {
        CreateSubscription {
            service_name: "Netflix".into(),
            price: 500,
            user_id,
            start_date: start.into(),
            end_date: end.map(String::from),
        }
    }

    fn month(s: &str) -> MonthValue {
        MonthValue::parse(s).unwrap()
    }

    #[tokio::test]
    async fn create_and_get() {
        let svc = service();
        let user = Uuid::new_v4();
        let id = svc
            .create(create_input(user, "01-2024", Some("12-2024")))
            .await
            .unwrap();

        let sub = svc.get(id).await.unwrap();
        assert_eq!(sub.user_id, user);
        assert_eq!(sub.service_name, "Netflix");
        assert_eq!(sub.price, 500);
        assert_eq!(sub.start_date, month("01-2024"));
        assert_eq!(sub.end_date, Some(month("12-2024")));
    }

    #[tokio::test]
    async fn create_treats_empty_end_as_open() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "01-2024", Some("")))
            .await
            .unwrap();
        assert!(svc.get(id).await.unwrap().is_open_ended());
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let svc = service();
        let user = Uuid::new_v4();

        let bad_format = svc.create(create_input(user, "2024-01", None)).await;
        assert!(matches!(bad_format, Err(DomainError::Validation(_))));

        let reversed = svc
            .create(create_input(user, "06-2024", Some("05-2024")))
            .await;
        assert!(matches!(reversed, Err(DomainError::Validation(_))));

        let mut negative = create_input(user, "01-2024", None);
        negative.price = -1;
        assert!(matches!(
            svc.create(negative).await,
            Err(DomainError::Validation(_))
        ));

        let mut blank = create_input(user, "01-2024", None);
        blank.service_name = "   ".into();
        assert!(matches!(
            svc.create(blank).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let svc = service();
        let user = Uuid::new_v4();
        svc.create(create_input(user, "01-2024", None)).await.unwrap();

        let err = svc
            .create(create_input(user, "01-2024", Some("03-2024")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_create_has_one_winner() {
        let svc = Arc::new(service());
        let user = Uuid::new_v4();

        let a = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.create(create_input(user, "02-2024", None)).await })
        };
        let b = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.create(create_input(user, "02-2024", None)).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::Conflict(_))))
            .count();
        assert_eq!((ok, conflicts), (1, 1));
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let err = service().get(77).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Subscription", .. }));
    }

    #[tokio::test]
    async fn update_empty_string_clears_end_date() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "01-2024", Some("06-2024")))
            .await
            .unwrap();

        let input = UpdateSubscription {
            end_date: Patch::Value(String::new()),
            ..Default::default()
        };
        svc.update(id, input).await.unwrap();
        assert_eq!(svc.get(id).await.unwrap().end_date, None);
    }

    #[tokio::test]
    async fn update_null_sentinel_and_explicit_clear() {
        let svc = service();
        let user = Uuid::new_v4();
        let a = svc
            .create(create_input(user, "01-2024", Some("06-2024")))
            .await
            .unwrap();
        let b = svc
            .create(create_input(user, "02-2024", Some("06-2024")))
            .await
            .unwrap();

        let sentinel = UpdateSubscription {
            end_date: Patch::Value("null".into()),
            ..Default::default()
        };
        svc.update(a, sentinel).await.unwrap();
        assert_eq!(svc.get(a).await.unwrap().end_date, None);

        let clear = UpdateSubscription {
            end_date: Patch::Clear,
            ..Default::default()
        };
        svc.update(b, clear).await.unwrap();
        assert_eq!(svc.get(b).await.unwrap().end_date, None);
    }

    #[tokio::test]
    async fn update_omitting_end_date_keeps_it() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "01-2024", Some("06-2024")))
            .await
            .unwrap();

        let input = UpdateSubscription {
            price: Patch::Value(650),
            ..Default::default()
        };
        svc.update(id, input).await.unwrap();

        let sub = svc.get(id).await.unwrap();
        assert_eq!(sub.price, 650);
        assert_eq!(sub.end_date, Some(month("06-2024")));
    }

    #[tokio::test]
    async fn update_checks_final_date_order() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "03-2024", Some("06-2024")))
            .await
            .unwrap();

        // New start after the stored end
        let late_start = UpdateSubscription {
            start_date: Patch::Value("07-2024".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(id, late_start).await,
            Err(DomainError::Validation(_))
        ));

        // New end before the stored start
        let early_end = UpdateSubscription {
            end_date: Patch::Value("02-2024".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(id, early_end).await,
            Err(DomainError::Validation(_))
        ));

        // Both moved together is fine
        let both = UpdateSubscription {
            start_date: Patch::Value("07-2024".into()),
            end_date: Patch::Value("09-2024".into()),
            ..Default::default()
        };
        svc.update(id, both).await.unwrap();
        let sub = svc.get(id).await.unwrap();
        assert_eq!(sub.start_date, month("07-2024"));
        assert_eq!(sub.end_date, Some(month("09-2024")));
    }

    #[tokio::test]
    async fn update_rejects_empty_and_clearing_required_fields() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "01-2024", None))
            .await
            .unwrap();

        assert!(matches!(
            svc.update(id, UpdateSubscription::default()).await,
            Err(DomainError::Validation(_))
        ));

        for input in [
            UpdateSubscription {
                price: Patch::Clear,
                ..Default::default()
            },
            UpdateSubscription {
                start_date: Patch::Clear,
                ..Default::default()
            },
            UpdateSubscription {
                service_name: Patch::Clear,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                svc.update(id, input).await,
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn update_switches_service_by_name() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "01-2024", None))
            .await
            .unwrap();

        let input = UpdateSubscription {
            service_name: Patch::Value("Spotify".into()),
            ..Default::default()
        };
        svc.update(id, input).await.unwrap();
        assert_eq!(svc.get(id).await.unwrap().service_name, "Spotify");
    }

    #[tokio::test]
    async fn update_into_existing_triple_is_conflict() {
        let svc = service();
        let user = Uuid::new_v4();
        svc.create(create_input(user, "01-2024", None)).await.unwrap();
        let second = svc.create(create_input(user, "02-2024", None)).await.unwrap();

        let input = UpdateSubscription {
            start_date: Patch::Value("01-2024".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(second, input).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_are_not_found() {
        let svc = service();
        let input = UpdateSubscription {
            price: Patch::Value(1),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(9, input).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(svc.delete(9).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let svc = service();
        let id = svc
            .create(create_input(Uuid::new_v4(), "01-2024", None))
            .await
            .unwrap();
        svc.delete(id).await.unwrap();
        assert!(matches!(svc.get(id).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_pages_but_counts_everything() {
        let svc = service();
        let user = Uuid::new_v4();
        svc.create(create_input(user, "01-2024", None)).await.unwrap();
        svc.create(create_input(user, "02-2024", None)).await.unwrap();
        svc.create(create_input(Uuid::new_v4(), "01-2024", None))
            .await
            .unwrap();

        let page = svc
            .list(SubscriptionFilter::for_user(user), 1, 0)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].start_date, month("01-2024"));

        let all = svc.list(SubscriptionFilter::default(), 10, 0).await.unwrap();
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn list_rejects_out_of_range_limit() {
        let svc = service();
        for limit in [0, MAX_LIMIT + 1] {
            let result = svc.list(SubscriptionFilter::default(), limit, 0).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }
}
