//! Service name registry
//!
//! Maps free-text service names to stable ids, creating rows on first use.

use std::sync::Arc;

use tracing::{debug, info};

use super::log_storage_failure;
use crate::domain::{DomainResult, RepositoryProvider, Service};
use crate::shared::errors::DomainError;

pub struct ServiceNameRegistry {
    repos: Arc<dyn RepositoryProvider>,
}

impl ServiceNameRegistry {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Resolve `name` to a service id, inserting it when unknown.
    ///
    /// Two callers racing on the same new name both end up with the same id:
    /// the loser of the insert sees `Conflict` and re-reads the winner's row.
    pub async fn get_or_create(&self, name: &str) -> DomainResult<i32> {
        let name = Service::normalize_name(name)
            .ok_or_else(|| DomainError::validation("service_name must not be empty"))?;

        let existing = self
            .repos
            .services()
            .find_by_name(name)
            .await
            .inspect_err(|e| log_storage_failure("find_service", e))?;
        if let Some(existing) = existing {
            return Ok(existing.id);
        }

        match self.repos.services().insert(name).await {
            Ok(created) => {
                info!(service_id = created.id, service_name = name, "Service created");
                Ok(created.id)
            }
            Err(DomainError::Conflict(_)) => {
                debug!(service_name = name, "Service created concurrently, re-reading");
                self.repos
                    .services()
                    .find_by_name(name)
                    .await
                    .inspect_err(|e| log_storage_failure("find_service", e))?
                    .map(|service| service.id)
                    .ok_or_else(|| {
                        DomainError::Storage(format!(
                            "service '{}' vanished after conflicting insert",
                            name
                        ))
                    })
            }
            Err(e) => {
                log_storage_failure("create_service", &e);
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: i32) -> DomainResult<Service> {
        self.repos
            .services()
            .find_by_id(id)
            .await
            .inspect_err(|e| log_storage_failure("get_service", e))?
            .ok_or_else(|| DomainError::not_found("Service", "id", id))
    }

    /// Fails with `ServiceInUse` while subscriptions reference the service.
    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repos
            .services()
            .delete(id)
            .await
            .inspect_err(|e| log_storage_failure("delete_service", e))?;
        info!(service_id = id, "Service deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::domain::{MonthValue, NewSubscription, ServiceRepository, SubscriptionRepository};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    /// Services whose first name lookup misses while another writer inserts
    /// the same name, so the following insert is guaranteed to conflict.
    struct LosingRaceServices {
        inner: Arc<InMemoryRepositoryProvider>,
        rival_inserted: AtomicBool,
        conflicts: AtomicUsize,
    }

    #[async_trait]
    impl ServiceRepository for LosingRaceServices {
        async fn find_by_id(&self, id: i32) -> DomainResult<Option<Service>> {
            self.inner.services().find_by_id(id).await
        }

        async fn find_by_name(&self, name: &str) -> DomainResult<Option<Service>> {
            if !self.rival_inserted.swap(true, Ordering::SeqCst) {
                self.inner.services().insert(name).await?;
                return Ok(None);
            }
            self.inner.services().find_by_name(name).await
        }

        async fn insert(&self, name: &str) -> DomainResult<Service> {
            let result = self.inner.services().insert(name).await;
            if matches!(result, Err(DomainError::Conflict(_))) {
                self.conflicts.fetch_add(1, Ordering::SeqCst);
            }
            result
        }

        async fn delete(&self, id: i32) -> DomainResult<()> {
            self.inner.services().delete(id).await
        }
    }

    struct LosingRaceProvider {
        inner: Arc<InMemoryRepositoryProvider>,
        services: LosingRaceServices,
    }

    impl LosingRaceProvider {
        fn new() -> Self {
            let inner = Arc::new(InMemoryRepositoryProvider::new());
            Self {
                services: LosingRaceServices {
                    inner: inner.clone(),
                    rival_inserted: AtomicBool::new(false),
                    conflicts: AtomicUsize::new(0),
                },
                inner,
            }
        }
    }

    #[async_trait]
    impl RepositoryProvider for LosingRaceProvider {
        fn services(&self) -> &dyn ServiceRepository {
            &self.services
        }

        fn subscriptions(&self) -> &dyn SubscriptionRepository {
            self.inner.subscriptions()
        }

        async fn ping(&self) -> DomainResult<()> {
            self.inner.ping().await
        }
    }

    fn registry() -> (Arc<InMemoryRepositoryProvider>, ServiceNameRegistry) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        (repos.clone(), ServiceNameRegistry::new(repos))
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_and_trims() {
        let (_, registry) = registry();
        let first = registry.get_or_create("Netflix").await.unwrap();
        let second = registry.get_or_create("  Netflix  ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.get(first).await.unwrap().name, "Netflix");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (_, registry) = registry();
        let err = registry.get_or_create(" \t ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn conflicting_insert_rereads_winner() {
        let provider = Arc::new(LosingRaceProvider::new());
        let registry = ServiceNameRegistry::new(provider.clone());

        let id = registry.get_or_create("Kinopoisk").await.unwrap();

        assert_eq!(provider.services.conflicts.load(Ordering::SeqCst), 1);
        let stored = provider
            .inner
            .services()
            .find_by_name("Kinopoisk")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, stored.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_yields_one_id() {
        let (_, registry) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get_or_create("Kinopoisk").await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        assert!(ids.iter().all(|id| *id == ids[0]), "ids differ: {:?}", ids);
    }

    #[tokio::test]
    async fn delete_blocked_while_referenced() {
        let (repos, registry) = registry();
        let service_id = registry.get_or_create("Spotify").await.unwrap();
        let sub_id = repos
            .subscriptions()
            .insert(NewSubscription {
                user_id: Uuid::new_v4(),
                service_id,
                price: 300,
                start_date: MonthValue::new(2024, 1).unwrap(),
                end_date: None,
            })
            .await
            .unwrap();

        let err = registry.delete(service_id).await.unwrap_err();
        assert!(matches!(err, DomainError::ServiceInUse(_)));

        repos.subscriptions().delete(sub_id).await.unwrap();
        registry.delete(service_id).await.unwrap();
        assert!(matches!(
            registry.get(service_id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let (_, registry) = registry();
        let err = registry.delete(404).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Service", .. }));
    }
}
