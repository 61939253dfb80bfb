pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_members;
mod m20260301_000002_create_chits;
mod m20260301_000003_create_ledger;
mod m20260301_000004_create_auctions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_members::Migration),
            Box::new(m20260301_000002_create_chits::Migration),
            Box::new(m20260301_000003_create_ledger::Migration),
            Box::new(m20260301_000004_create_auctions::Migration),
        ]
    }
}
