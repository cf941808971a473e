//! Create subscriptions table

use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_services::Services;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `column` holds the first day of a month.
fn first_of_month(backend: DbBackend, column: &str) -> SimpleExpr {
    match backend {
        DbBackend::Postgres => Expr::cust(format!("EXTRACT(DAY FROM {}) = 1", column)),
        DbBackend::MySql => Expr::cust(format!("DAYOFMONTH({}) = 1", column)),
        DbBackend::Sqlite => Expr::cust(format!("strftime('%d', {}) = '01'", column)),
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Subscriptions::ServiceId).integer().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Price)
                            .integer()
                            .not_null()
                            .check(Expr::col(Subscriptions::Price).gte(0)),
                    )
                    .col(ColumnDef::new(Subscriptions::StartDate).date().not_null())
                    .col(ColumnDef::new(Subscriptions::EndDate).date().null())
                    .check(
                        Expr::col(Subscriptions::EndDate)
                            .is_null()
                            .or(Expr::col(Subscriptions::EndDate)
                                .gte(Expr::col(Subscriptions::StartDate))),
                    )
                    .check(first_of_month(backend, "start_date"))
                    .check(
                        Expr::col(Subscriptions::EndDate)
                            .is_null()
                            .or(first_of_month(backend, "end_date")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_service")
                            .from(Subscriptions::Table, Subscriptions::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One subscription per user, service and start month
        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_user_service_start")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .col(Subscriptions::ServiceId)
                    .col(Subscriptions::StartDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_service_id")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::ServiceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Subscriptions {
    Table,
    Id,
    UserId,
    ServiceId,
    Price,
    StartDate,
    EndDate,
}
