use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_microposts_table;
mod m20240101_000003_create_relationships_table;
mod m20240101_000004_add_admin_to_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_microposts_table::Migration),
            Box::new(m20240101_000003_create_relationships_table::Migration),
            Box::new(m20240101_000004_add_admin_to_users::Migration),
        ]
    }
}
