//! SeaORM implementation of SubscriptionRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set, SqlErr,
};
use uuid::Uuid;

use super::{is_foreign_key_violation, storage_err};
use crate::domain::{
    BillingPeriod, DomainError, DomainResult, MonthValue, NewSubscription, Patch, Subscription,
    SubscriptionChanges, SubscriptionFilter, SubscriptionRepository,
};
use crate::infrastructure::database::entities::{service, subscription};
use crate::shared::pagination::Page;

/// Subscription row joined with its service name.
#[derive(Debug, FromQueryResult)]
struct SubscriptionRow {
    id: i64,
    user_id: Uuid,
    service_id: i32,
    service_name: String,
    price: i32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
}

fn row_to_domain(row: SubscriptionRow) -> Subscription {
    Subscription {
        id: row.id,
        user_id: row.user_id,
        service_id: row.service_id,
        service_name: row.service_name,
        price: row.price,
        start_date: MonthValue::from_date(row.start_date),
        end_date: row.end_date.map(MonthValue::from_date),
    }
}

/// Subscriptions joined to services with the filter applied.
fn filtered(filter: &SubscriptionFilter) -> Select<subscription::Entity> {
    let mut query = subscription::Entity::find()
        .join(JoinType::InnerJoin, subscription::Relation::Service.def());

    if let Some(user_id) = filter.user_id {
        query = query.filter(subscription::Column::UserId.eq(user_id));
    }
    if let Some(name) = filter.service_name.as_deref() {
        query = query.filter(service::Column::Name.eq(name));
    }
    query
}

/// Narrow to rows whose active interval meets the period.
fn overlapping(
    mut query: Select<subscription::Entity>,
    period: &BillingPeriod,
) -> Select<subscription::Entity> {
    if let Some(end) = period.end {
        query = query.filter(subscription::Column::StartDate.lte(end.date()));
    }
    if let Some(start) = period.start {
        query = query.filter(
            Condition::any()
                .add(subscription::Column::EndDate.is_null())
                .add(subscription::Column::EndDate.gte(start.date())),
        );
    }
    query
}

fn with_service_name(query: Select<subscription::Entity>) -> Select<subscription::Entity> {
    query.column_as(service::Column::Name, "service_name")
}

pub struct SeaOrmSubscriptionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for SeaOrmSubscriptionRepository {
    async fn insert(&self, new: NewSubscription) -> DomainResult<i64> {
        let service_id = new.service_id;
        let model = subscription::ActiveModel {
            user_id: Set(new.user_id),
            service_id: Set(new.service_id),
            price: Set(new.price),
            start_date: Set(new.start_date.date()),
            end_date: Set(new.end_date.map(|m| m.date())),
            ..Default::default()
        };

        match subscription::Entity::insert(model).exec(&self.db).await {
            Ok(result) => Ok(result.last_insert_id),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(DomainError::Conflict(format!(
                    "subscription for user {} to service {} starting {} already exists",
                    new.user_id, service_id, new.start_date
                ))),
                _ if is_foreign_key_violation(&e) => {
                    Err(DomainError::not_found("Service", "id", service_id))
                }
                _ => Err(storage_err("insert_subscription", e)),
            },
        }
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Subscription>> {
        let row = with_service_name(filtered(&SubscriptionFilter::default()))
            .filter(subscription::Column::Id.eq(id))
            .into_model::<SubscriptionRow>()
            .one(&self.db)
            .await
            .map_err(|e| storage_err("find_subscription", e))?;
        Ok(row.map(row_to_domain))
    }

    async fn update(&self, id: i64, changes: SubscriptionChanges) -> DomainResult<()> {
        if changes.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }

        let mut model = subscription::ActiveModel::default();
        if let Some(service_id) = changes.service_id {
            model.service_id = Set(service_id);
        }
        if let Some(price) = changes.price {
            model.price = Set(price);
        }
        if let Some(start) = changes.start_date {
            model.start_date = Set(start.date());
        }
        match changes.end_date {
            Patch::Unset => {}
            Patch::Clear => model.end_date = Set(None),
            Patch::Value(end) => model.end_date = Set(Some(end.date())),
        }

        let result = subscription::Entity::update_many()
            .set(model)
            .filter(subscription::Column::Id.eq(id))
            .exec(&self.db)
            .await;

        match result {
            Ok(result) if result.rows_affected == 0 => {
                Err(DomainError::not_found("Subscription", "id", id))
            }
            Ok(_) => Ok(()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(DomainError::Conflict(format!(
                    "subscription {} would duplicate an existing user, service and start month",
                    id
                ))),
                _ if is_foreign_key_violation(&e) => Err(DomainError::not_found(
                    "Service",
                    "id",
                    changes.service_id.unwrap_or_default(),
                )),
                _ => Err(storage_err("update_subscription", e)),
            },
        }
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let result = subscription::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| storage_err("delete_subscription", e))?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Subscription", "id", id));
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
        limit: u64,
        offset: u64,
    ) -> DomainResult<Page<Subscription>> {
        let total = filtered(filter)
            .count(&self.db)
            .await
            .map_err(|e| storage_err("count_subscriptions", e))?;

        let rows = with_service_name(filtered(filter))
            .order_by_asc(subscription::Column::Id)
            .limit(limit)
            .offset(offset)
            .into_model::<SubscriptionRow>()
            .all(&self.db)
            .await
            .map_err(|e| storage_err("list_subscriptions", e))?;

        Ok(Page::new(
            rows.into_iter().map(row_to_domain).collect(),
            total,
            limit,
            offset,
        ))
    }

    async fn find_overlapping(
        &self,
        filter: &SubscriptionFilter,
        period: &BillingPeriod,
    ) -> DomainResult<Vec<Subscription>> {
        let rows = with_service_name(overlapping(filtered(filter), period))
            .order_by_asc(subscription::Column::Id)
            .into_model::<SubscriptionRow>()
            .all(&self.db)
            .await
            .map_err(|e| storage_err("find_overlapping_subscriptions", e))?;
        Ok(rows.into_iter().map(row_to_domain).collect())
    }
}
