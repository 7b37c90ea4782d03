use super::m20240101_000001_create_users_table::Users;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Microposts {
    Table,
    Id,
    UserId,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Microposts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Microposts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Microposts::UserId).integer().not_null())
                    .col(ColumnDef::new(Microposts::Content).text().not_null())
                    .col(ColumnDef::new(Microposts::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Microposts::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_microposts_user")
                            .from(Microposts::Table, Microposts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_microposts_user_created")
                    .table(Microposts::Table)
                    .col(Microposts::UserId)
                    .col(Microposts::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Microposts::Table).to_owned())
            .await
    }
}
