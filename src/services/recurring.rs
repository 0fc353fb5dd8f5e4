use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use uuid::Uuid;

use super::guards::{ensure_can_drive, ensure_seat_count, find_user};
use super::Place;
use crate::entities::recurring_ride;
use crate::entities::ride::{self, RideStatus};
use crate::error::{AppError, AppResult};
use crate::utils::time::parse_time_of_day;

/// Number of calendar days, starting today, materialized when a template is created.
pub const EXPANSION_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub origin: Place,
    pub destination: Place,
    pub departure_time_of_day: String,
    /// Weekday numbers, 0 = Monday .. 6 = Sunday.
    pub days_of_week: Vec<i64>,
    pub total_seats: i32,
}

#[derive(Debug, Clone)]
pub struct ExpandedTemplate {
    pub template: recurring_ride::Model,
    pub rides: Vec<ride::Model>,
}

pub fn parse_weekdays(days: &[i64]) -> AppResult<BTreeSet<u32>> {
    if days.is_empty() {
        return Err(AppError::Validation(
            "days_of_week must contain at least one day".to_string(),
        ));
    }
    days.iter()
        .map(|&d| match u32::try_from(d) {
            Ok(day) if day <= 6 => Ok(day),
            _ => Err(AppError::Validation(format!(
                "Invalid weekday {}: use 0 (Monday) to 6 (Sunday)",
                d
            ))),
        })
        .collect()
}

pub fn format_weekdays(days: &BTreeSet<u32>) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Departure instants for the next [`EXPANSION_DAYS`] calendar days, today
/// included, on the matching weekdays. Slots that are not strictly after
/// `now` are dropped.
pub fn upcoming_departures(
    now: DateTime<FixedOffset>,
    time_of_day: NaiveTime,
    weekdays: &BTreeSet<u32>,
) -> Vec<DateTime<FixedOffset>> {
    let today = now.date_naive();
    let offset = *now.offset();

    (0..EXPANSION_DAYS)
        .filter_map(|day| {
            let date = today + Duration::days(day);
            if !weekdays.contains(&date.weekday().num_days_from_monday()) {
                return None;
            }
            let departure = offset.from_local_datetime(&date.and_time(time_of_day)).single()?;
            (departure > now).then_some(departure)
        })
        .collect()
}

/// Store a weekly template and materialize its rides for the coming week.
///
/// `local` is the calendar the template's weekdays and time of day refer to.
pub async fn create_template(
    db: &DatabaseConnection,
    driver_id: Uuid,
    input: NewTemplate,
    now: DateTime<Utc>,
    local: FixedOffset,
) -> AppResult<ExpandedTemplate> {
    let time_of_day = parse_time_of_day(&input.departure_time_of_day)?;
    let weekdays = parse_weekdays(&input.days_of_week)?;
    ensure_seat_count(input.total_seats)?;
    let origin = input.origin.validated("origin_name")?;
    let destination = input.destination.validated("destination_name")?;

    let driver = find_user(db, driver_id).await?;
    ensure_can_drive(&driver)?;

    let txn = db.begin().await?;

    let template = recurring_ride::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(driver_id),
        origin_name: Set(origin.name.clone()),
        origin_lat: Set(origin.lat),
        origin_lng: Set(origin.lng),
        destination_name: Set(destination.name.clone()),
        destination_lat: Set(destination.lat),
        destination_lng: Set(destination.lng),
        departure_time_of_day: Set(time_of_day),
        days_of_week: Set(format_weekdays(&weekdays)),
        total_seats: Set(input.total_seats),
        is_active: Set(true),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut rides = Vec::new();
    for departure in upcoming_departures(now.with_timezone(&local), time_of_day, &weekdays) {
        let ride = ride::ActiveModel {
            id: Set(Uuid::new_v4()),
            driver_id: Set(driver_id),
            origin_name: Set(origin.name.clone()),
            origin_lat: Set(origin.lat),
            origin_lng: Set(origin.lng),
            destination_name: Set(destination.name.clone()),
            destination_lat: Set(destination.lat),
            destination_lng: Set(destination.lng),
            departure_time: Set(departure.with_timezone(&Utc).into()),
            total_seats: Set(input.total_seats),
            available_seats: Set(input.total_seats),
            status: Set(RideStatus::Scheduled),
            is_recurring: Set(true),
            recurring_id: Set(Some(template.id)),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        rides.push(ride);
    }

    txn.commit().await?;

    tracing::info!(
        template_id = %template.id,
        driver_id = %driver_id,
        generated = rides.len(),
        "recurring ride created"
    );
    Ok(ExpandedTemplate { template, rides })
}
