//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

use super::service_repository::SeaOrmServiceRepository;
use super::storage_err;
use super::subscription_repository::SeaOrmSubscriptionRepository;
use crate::domain::repositories::{DomainResult, RepositoryProvider};
use crate::domain::service::ServiceRepository;
use crate::domain::subscription::SubscriptionRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let service = repos.services().find_by_name("Netflix").await?;
/// let page = repos.subscriptions().list(&filter, 10, 0).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    services: SeaOrmServiceRepository,
    subscriptions: SeaOrmSubscriptionRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            services: SeaOrmServiceRepository::new(db.clone()),
            subscriptions: SeaOrmSubscriptionRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn services(&self) -> &dyn ServiceRepository {
        &self.services
    }

    fn subscriptions(&self) -> &dyn SubscriptionRepository {
        &self.subscriptions
    }

    async fn ping(&self) -> DomainResult<()> {
        let backend = self.db.get_database_backend();
        self.db
            .execute(Statement::from_string(backend, "SELECT 1".to_owned()))
            .await
            .map_err(|e| storage_err("ping", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{
        BillingPeriod, DomainError, MonthValue, NewSubscription, Patch, SubscriptionChanges,
        SubscriptionFilter,
    };
    use crate::infrastructure::database::migrator::Migrator;

    async fn setup() -> SeaOrmRepositoryProvider {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    fn month(s: &str) -> MonthValue {
        MonthValue::parse(s).unwrap()
    }

    fn new_sub(user_id: Uuid, service_id: i32, start: &str, end: Option<&str>) -> NewSubscription {
        NewSubscription {
            user_id,
            service_id,
            price: 500,
            start_date: month(start),
            end_date: end.map(month),
        }
    }

    #[tokio::test]
    async fn ping_succeeds() {
        setup().await.ping().await.unwrap();
    }

    #[tokio::test]
    async fn service_insert_and_lookup() {
        let repos = setup().await;
        let created = repos.services().insert("Netflix").await.unwrap();

        let by_name = repos.services().find_by_name("Netflix").await.unwrap();
        assert_eq!(by_name, Some(created.clone()));
        let by_id = repos.services().find_by_id(created.id).await.unwrap();
        assert_eq!(by_id, Some(created));

        let err = repos.services().insert("Netflix").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn subscription_round_trip_with_service_name() {
        let repos = setup().await;
        let service = repos.services().insert("Spotify").await.unwrap();
        let user = Uuid::new_v4();

        let id = repos
            .subscriptions()
            .insert(new_sub(user, service.id, "01-2024", Some("12-2024")))
            .await
            .unwrap();

        let sub = repos.subscriptions().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(sub.user_id, user);
        assert_eq!(sub.service_name, "Spotify");
        assert_eq!(sub.start_date, month("01-2024"));
        assert_eq!(sub.end_date, Some(month("12-2024")));

        assert!(repos.subscriptions().find_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_subscription_is_conflict() {
        let repos = setup().await;
        let service = repos.services().insert("Netflix").await.unwrap();
        let user = Uuid::new_v4();

        repos
            .subscriptions()
            .insert(new_sub(user, service.id, "01-2024", None))
            .await
            .unwrap();
        let err = repos
            .subscriptions()
            .insert(new_sub(user, service.id, "01-2024", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let repos = setup().await;
        let err = repos
            .subscriptions()
            .insert(new_sub(Uuid::new_v4(), 42, "01-2024", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Service", .. }));
    }

    #[tokio::test]
    async fn service_delete_is_restricted() {
        let repos = setup().await;
        let service = repos.services().insert("Netflix").await.unwrap();
        let id = repos
            .subscriptions()
            .insert(new_sub(Uuid::new_v4(), service.id, "01-2024", None))
            .await
            .unwrap();

        let err = repos.services().delete(service.id).await.unwrap_err();
        assert!(matches!(err, DomainError::ServiceInUse(_)));

        repos.subscriptions().delete(id).await.unwrap();
        repos.services().delete(service.id).await.unwrap();

        let err = repos.services().delete(service.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn registry_delete_of_referenced_service_is_in_use() {
        use crate::application::ServiceNameRegistry;
        use std::sync::Arc;

        let repos = Arc::new(setup().await);
        let registry = ServiceNameRegistry::new(repos.clone());
        let service_id = registry.get_or_create("Kinopoisk").await.unwrap();
        repos
            .subscriptions()
            .insert(new_sub(Uuid::new_v4(), service_id, "03-2024", None))
            .await
            .unwrap();

        let err = registry.delete(service_id).await.unwrap_err();
        assert!(matches!(err, DomainError::ServiceInUse(id) if id == service_id));
        assert_eq!(registry.get(service_id).await.unwrap().name, "Kinopoisk");
    }

    #[tokio::test]
    async fn update_to_unknown_service_is_not_found() {
        let repos = setup().await;
        let service = repos.services().insert("Netflix").await.unwrap();
        let id = repos
            .subscriptions()
            .insert(new_sub(Uuid::new_v4(), service.id, "01-2024", None))
            .await
            .unwrap();

        let changes = SubscriptionChanges {
            service_id: Some(service.id + 100),
            ..Default::default()
        };
        let err = repos.subscriptions().update(id, changes).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Service", .. }));
    }

    #[tokio::test]
    async fn update_sets_and_clears_columns() {
        let repos = setup().await;
        let service = repos.services().insert("Netflix").await.unwrap();
        let id = repos
            .subscriptions()
            .insert(new_sub(Uuid::new_v4(), service.id, "01-2024", Some("06-2024")))
            .await
            .unwrap();

        let changes = SubscriptionChanges {
            price: Some(799),
            end_date: Patch::Clear,
            ..Default::default()
        };
        repos.subscriptions().update(id, changes).await.unwrap();

        let sub = repos.subscriptions().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(sub.price, 799);
        assert_eq!(sub.end_date, None);
        assert_eq!(sub.start_date, month("01-2024"));

        let missing = SubscriptionChanges {
            price: Some(1),
            ..Default::default()
        };
        let err = repos.subscriptions().update(id + 100, missing).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_into_duplicate_is_conflict() {
        let repos = setup().await;
        let service = repos.services().insert("Netflix").await.unwrap();
        let user = Uuid::new_v4();
        repos
            .subscriptions()
            .insert(new_sub(user, service.id, "01-2024", None))
            .await
            .unwrap();
        let second = repos
            .subscriptions()
            .insert(new_sub(user, service.id, "02-2024", None))
            .await
            .unwrap();

        let changes = SubscriptionChanges {
            start_date: Some(month("01-2024")),
            ..Default::default()
        };
        let err = repos.subscriptions().update(second, changes).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_counts_full_filtered_set() {
        let repos = setup().await;
        let netflix = repos.services().insert("Netflix").await.unwrap();
        let spotify = repos.services().insert("Spotify").await.unwrap();
        let user = Uuid::new_v4();

        repos
            .subscriptions()
            .insert(new_sub(user, netflix.id, "01-2024", None))
            .await
            .unwrap();
        repos
            .subscriptions()
            .insert(new_sub(user, netflix.id, "02-2024", None))
            .await
            .unwrap();
        repos
            .subscriptions()
            .insert(new_sub(user, spotify.id, "01-2024", None))
            .await
            .unwrap();

        let filter = SubscriptionFilter::for_user(user).with_service_name("Netflix");
        let page = repos.subscriptions().list(&filter, 1, 0).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].start_date, month("01-2024"));

        let second = repos.subscriptions().list(&filter, 1, 1).await.unwrap();
        assert_eq!(second.items[0].start_date, month("02-2024"));
    }

    #[tokio::test]
    async fn overlap_query_matches_period_rules() {
        let repos = setup().await;
        let service = repos.services().insert("Netflix").await.unwrap();
        let user = Uuid::new_v4();

        for (start, end) in [
            ("01-2023", Some("06-2023")),
            ("01-2024", Some("12-2024")),
            ("06-2024", None),
            ("01-2025", None),
        ] {
            repos
                .subscriptions()
                .insert(new_sub(user, service.id, start, end))
                .await
                .unwrap();
        }

        let period = BillingPeriod::new(Some(month("03-2024")), Some(month("06-2024")));
        let rows = repos
            .subscriptions()
            .find_overlapping(&SubscriptionFilter::for_user(user), &period)
            .await
            .unwrap();
        let starts: Vec<_> = rows.iter().map(|s| s.start_date.to_string()).collect();
        assert_eq!(starts, vec!["01-2024", "06-2024"]);

        let everything = repos
            .subscriptions()
            .find_overlapping(&SubscriptionFilter::default(), &BillingPeriod::default())
            .await
            .unwrap();
        assert_eq!(everything.len(), 4);
    }
}
