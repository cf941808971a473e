//! SeaORM implementation of ServiceRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use super::{is_foreign_key_violation, storage_err};
use crate::domain::{DomainError, DomainResult, Service, ServiceRepository};
use crate::infrastructure::database::entities::service;

fn entity_to_domain(m: service::Model) -> Service {
    Service::new(m.id, m.name)
}

pub struct SeaOrmServiceRepository {
    db: DatabaseConnection,
}

impl SeaOrmServiceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ServiceRepository for SeaOrmServiceRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Service>> {
        let model = service::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| storage_err("find_service_by_id", e))?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Service>> {
        let model = service::Entity::find()
            .filter(service::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| storage_err("find_service_by_name", e))?;
        Ok(model.map(entity_to_domain))
    }

    async fn insert(&self, name: &str) -> DomainResult<Service> {
        let model = service::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(entity_to_domain(created)),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(DomainError::Conflict(
                    format!("service '{}' already exists", name),
                )),
                _ => Err(storage_err("insert_service", e)),
            },
        }
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let result = match service::Entity::delete_by_id(id).exec(&self.db).await {
            Ok(result) => result,
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(DomainError::ServiceInUse(id));
            }
            Err(e) => return Err(storage_err("delete_service", e)),
        };

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Service", "id", id));
        }
        Ok(())
    }
}
