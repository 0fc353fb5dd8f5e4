#![allow(dead_code)]

use carpool_backend::entities::ride::{self, RideStatus};
use carpool_backend::entities::user::{self, UserRole};
use carpool_backend::services::Place;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

/// FCCU campus, Lahore.
pub const FCCU: (f64, f64) = (31.5226, 74.3326);
/// Liberty Market, Lahore, a couple of km from campus.
pub const LIBERTY: (f64, f64) = (31.5102, 74.3441);

/// Pakistan Standard Time, the calendar the seeded rides are written in.
pub fn pkt() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600).expect("valid offset")
}

pub fn pkt_at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    pkt()
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid local time")
}

/// Fresh in-memory database with every migration applied.
///
/// A single pooled connection keeps the in-memory database alive and makes
/// concurrent transactions queue up behind each other.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, role: UserRole) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}.{}@formanite.fccollege.edu.pk", name.to_lowercase(), Uuid::new_v4().simple())),
        password_hash: Set("not-a-real-hash".to_string()),
        full_name: Set(name.to_string()),
        major: Set(None),
        year: Set(None),
        phone_number: Set(None),
        role: Set(role),
        current_lat: Set(None),
        current_lng: Set(None),
        last_location_update: Set(None),
        avg_driver_rating: Set(5.0),
        driver_rating_count: Set(0),
        avg_rider_rating: Set(5.0),
        rider_rating_count: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("seed user")
}

pub async fn seed_driver(db: &DatabaseConnection) -> user::Model {
    seed_user(db, "Driver", UserRole::Driver).await
}

pub async fn seed_rider(db: &DatabaseConnection, name: &str) -> user::Model {
    seed_user(db, name, UserRole::Rider).await
}

/// Insert a ride row directly, bypassing the departure-hour rule so tests can
/// place rides relative to "now".
pub async fn seed_ride(
    db: &DatabaseConnection,
    driver_id: Uuid,
    origin: Place,
    destination: Place,
    departure: DateTime<Utc>,
    seats: i32,
) -> ride::Model {
    ride::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(driver_id),
        origin_name: Set(origin.name),
        origin_lat: Set(origin.lat),
        origin_lng: Set(origin.lng),
        destination_name: Set(destination.name),
        destination_lat: Set(destination.lat),
        destination_lng: Set(destination.lng),
        departure_time: Set(departure.into()),
        total_seats: Set(seats),
        available_seats: Set(seats),
        status: Set(RideStatus::Scheduled),
        is_recurring: Set(false),
        recurring_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("seed ride")
}

/// A scheduled FCCU to Liberty ride departing `hours_from_now` hours from now.
pub async fn campus_ride(db: &DatabaseConnection, driver_id: Uuid, hours_from_now: i64, seats: i32) -> ride::Model {
    seed_ride(
        db,
        driver_id,
        Place::at("FCCU", FCCU.0, FCCU.1),
        Place::at("Liberty Market", LIBERTY.0, LIBERTY.1),
        Utc::now() + Duration::hours(hours_from_now),
        seats,
    )
    .await
}

pub async fn reload_ride(db: &DatabaseConnection, ride_id: Uuid) -> ride::Model {
    ride::Entity::find_by_id(ride_id)
        .one(db)
        .await
        .expect("load ride")
        .expect("ride exists")
}

pub async fn reload_user(db: &DatabaseConnection, user_id: Uuid) -> user::Model {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .expect("load user")
        .expect("user exists")
}

pub async fn set_ride_status(db: &DatabaseConnection, ride: ride::Model, status: RideStatus) -> ride::Model {
    let mut active: ride::ActiveModel = ride.into();
    active.status = Set(status);
    active.update(db).await.expect("update ride status")
}
