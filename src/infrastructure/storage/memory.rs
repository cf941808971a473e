//! In-memory repositories for development runs and tests
//!
//! Mirrors the relational store's rules: unique service names, unique
//! (user, service, start) triples, service references that must exist, and
//! services that cannot be deleted while referenced. Mutations are serialized
//! through a single gate; reads go straight to the maps and never hold more
//! than one guard at a time.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    BillingPeriod, DomainError, DomainResult, MonthValue, NewSubscription, RepositoryProvider,
    Service, ServiceRepository, Subscription, SubscriptionChanges, SubscriptionFilter,
    SubscriptionRepository,
};
use crate::shared::pagination::Page;

type UniqueKey = (Uuid, i32, MonthValue);

#[derive(Debug, Clone)]
struct StoredSubscription {
    user_id: Uuid,
    service_id: i32,
    price: i32,
    start_date: MonthValue,
    end_date: Option<MonthValue>,
}

impl StoredSubscription {
    fn key(&self) -> UniqueKey {
        (self.user_id, self.service_id, self.start_date)
    }
}

#[derive(Default)]
struct MemoryState {
    write_gate: Mutex<()>,
    services: DashMap<i32, String>,
    service_names: DashMap<String, i32>,
    subscriptions: DashMap<i64, StoredSubscription>,
    subscription_keys: DashMap<UniqueKey, i64>,
    service_seq: AtomicI32,
    subscription_seq: AtomicI64,
}

impl MemoryState {
    fn service_name(&self, id: i32) -> String {
        self.services
            .get(&id)
            .map(|name| name.value().clone())
            .unwrap_or_default()
    }

    fn hydrate(&self, id: i64, stored: StoredSubscription) -> Subscription {
        Subscription {
            id,
            user_id: stored.user_id,
            service_id: stored.service_id,
            service_name: self.service_name(stored.service_id),
            price: stored.price,
            start_date: stored.start_date,
            end_date: stored.end_date,
        }
    }

    /// Every subscription matching `filter`, ordered by id.
    fn matching(&self, filter: &SubscriptionFilter) -> Vec<Subscription> {
        let snapshot: Vec<(i64, StoredSubscription)> = self
            .subscriptions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut rows: Vec<Subscription> = snapshot
            .into_iter()
            .map(|(id, stored)| self.hydrate(id, stored))
            .filter(|sub| filter.matches(sub))
            .collect();
        rows.sort_by_key(|sub| sub.id);
        rows
    }

    fn duplicate_error(key: &UniqueKey) -> DomainError {
        DomainError::Conflict(format!(
            "subscription for user {} to service {} starting {} already exists",
            key.0, key.1, key.2
        ))
    }

    fn check_period(start: MonthValue, end: Option<MonthValue>) -> DomainResult<()> {
        match end {
            Some(end) if end < start => Err(DomainError::validation(
                "end_date must not be before start_date",
            )),
            _ => Ok(()),
        }
    }
}

pub struct InMemoryServiceRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl ServiceRepository for InMemoryServiceRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Service>> {
        Ok(self
            .state
            .services
            .get(&id)
            .map(|name| Service::new(id, name.value().clone())))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Service>> {
        Ok(self
            .state
            .service_names
            .get(name)
            .map(|id| Service::new(*id.value(), name)))
    }

    async fn insert(&self, name: &str) -> DomainResult<Service> {
        let _gate = self.state.write_gate.lock().await;

        if self.state.service_names.contains_key(name) {
            return Err(DomainError::Conflict(format!(
                "service '{}' already exists",
                name
            )));
        }

        let id = self.state.service_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.services.insert(id, name.to_string());
        self.state.service_names.insert(name.to_string(), id);
        Ok(Service::new(id, name))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let _gate = self.state.write_gate.lock().await;

        if !self.state.services.contains_key(&id) {
            return Err(DomainError::not_found("Service", "id", id));
        }

        let referenced = self
            .state
            .subscriptions
            .iter()
            .any(|entry| entry.value().service_id == id);
        if referenced {
            return Err(DomainError::ServiceInUse(id));
        }

        if let Some((_, name)) = self.state.services.remove(&id) {
            self.state.service_names.remove(&name);
        }
        Ok(())
    }
}

pub struct InMemorySubscriptionRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(&self, subscription: NewSubscription) -> DomainResult<i64> {
        let _gate = self.state.write_gate.lock().await;

        if !self.state.services.contains_key(&subscription.service_id) {
            return Err(DomainError::not_found(
                "Service",
                "id",
                subscription.service_id,
            ));
        }
        if subscription.price < 0 {
            return Err(DomainError::validation("price must not be negative"));
        }
        MemoryState::check_period(subscription.start_date, subscription.end_date)?;

        let stored = StoredSubscription {
            user_id: subscription.user_id,
            service_id: subscription.service_id,
            price: subscription.price,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
        };
        let key = stored.key();
        if self.state.subscription_keys.contains_key(&key) {
            return Err(MemoryState::duplicate_error(&key));
        }

        let id = self.state.subscription_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.subscription_keys.insert(key, id);
        self.state.subscriptions.insert(id, stored);
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Subscription>> {
        let stored = self
            .state
            .subscriptions
            .get(&id)
            .map(|entry| entry.value().clone());
        Ok(stored.map(|stored| self.state.hydrate(id, stored)))
    }

    async fn update(&self, id: i64, changes: SubscriptionChanges) -> DomainResult<()> {
        let _gate = self.state.write_gate.lock().await;

        let current = self
            .state
            .subscriptions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::not_found("Subscription", "id", id))?;

        if let Some(service_id) = changes.service_id {
            if !self.state.services.contains_key(&service_id) {
                return Err(DomainError::not_found("Service", "id", service_id));
            }
        }
        if matches!(changes.price, Some(price) if price < 0) {
            return Err(DomainError::validation("price must not be negative"));
        }

        let updated = StoredSubscription {
            user_id: current.user_id,
            service_id: changes.service_id.unwrap_or(current.service_id),
            price: changes.price.unwrap_or(current.price),
            start_date: changes.start_date.unwrap_or(current.start_date),
            end_date: changes.end_date.apply_to(current.end_date),
        };
        MemoryState::check_period(updated.start_date, updated.end_date)?;

        let old_key = current.key();
        let new_key = updated.key();
        if new_key != old_key {
            if self.state.subscription_keys.contains_key(&new_key) {
                return Err(MemoryState::duplicate_error(&new_key));
            }
            self.state.subscription_keys.remove(&old_key);
            self.state.subscription_keys.insert(new_key, id);
        }
        self.state.subscriptions.insert(id, updated);
        Ok(())
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let _gate = self.state.write_gate.lock().await;

        let (_, removed) = self
            .state
            .subscriptions
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Subscription", "id", id))?;
        self.state.subscription_keys.remove(&removed.key());
        Ok(())
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
        limit: u64,
        offset: u64,
    ) -> DomainResult<Page<Subscription>> {
        let rows = self.state.matching(filter);
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok(Page::new(items, total, limit, offset))
    }

    async fn find_overlapping(
        &self,
        filter: &SubscriptionFilter,
        period: &BillingPeriod,
    ) -> DomainResult<Vec<Subscription>> {
        Ok(self
            .state
            .matching(filter)
            .into_iter()
            .filter(|sub| period.overlaps(sub))
            .collect())
    }
}

/// Repository provider backed by process memory. Data is lost on exit.
pub struct InMemoryRepositoryProvider {
    services: InMemoryServiceRepository,
    subscriptions: InMemorySubscriptionRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let state = Arc::new(MemoryState::default());
        Self {
            services: InMemoryServiceRepository {
                state: state.clone(),
            },
            subscriptions: InMemorySubscriptionRepository { state },
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn services(&self) -> &dyn ServiceRepository {
        &self.services
    }

    fn subscriptions(&self) -> &dyn SubscriptionRepository {
        &self.subscriptions
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}
