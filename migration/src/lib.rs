pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users;
mod m20250901_000002_create_recurring_rides;
mod m20250901_000003_create_rides;
mod m20250901_000004_create_bookings;
mod m20250901_000005_create_ratings;
mod m20250901_000006_create_user_trip_patterns;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users::Migration),
            Box::new(m20250901_000002_create_recurring_rides::Migration),
            Box::new(m20250901_000003_create_rides::Migration),
            Box::new(m20250901_000004_create_bookings::Migration),
            Box::new(m20250901_000005_create_ratings::Migration),
            Box::new(m20250901_000006_create_user_trip_patterns::Migration),
        ]
    }
}
