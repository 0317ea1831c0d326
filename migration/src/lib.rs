pub use sea_orm_migration::prelude::*;

mod iden;
mod m20260301_000001_create_show_tables;
mod m20260301_000002_create_sponsor_tables;
mod m20260302_000001_create_attendee_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_show_tables::Migration),
            Box::new(m20260301_000002_create_sponsor_tables::Migration),
            Box::new(m20260302_000001_create_attendee_tables::Migration),
        ]
    }
}
