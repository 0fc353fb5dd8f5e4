use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::entities::ride::{self, RideStatus};
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::utils::geo::{is_near, SEARCH_RADIUS_KM};
use crate::utils::time::parse_timestamp;

pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// Raw search parameters as they arrive on the query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFilters {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
    pub time: Option<String>,
    pub window_minutes: Option<i64>,
    pub sort_by: Option<String>,
}

/// How one end of the trip is matched.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceFilter {
    Any,
    Near(f64, f64),
    /// Lowercased needle.
    NameContains(String),
}

impl PlaceFilter {
    /// Coordinates win over text when both are supplied.
    fn from_parts(lat: Option<f64>, lng: Option<f64>, text: Option<&str>) -> Self {
        match (lat, lng) {
            (Some(lat), Some(lng)) => PlaceFilter::Near(lat, lng),
            _ => match text.map(str::trim).filter(|t| !t.is_empty()) {
                Some(text) => PlaceFilter::NameContains(text.to_lowercase()),
                None => PlaceFilter::Any,
            },
        }
    }

    pub fn matches(&self, name: &str, point: Option<(f64, f64)>) -> bool {
        match self {
            PlaceFilter::Any => true,
            PlaceFilter::Near(lat, lng) => is_near(point, (*lat, *lng), SEARCH_RADIUS_KM),
            PlaceFilter::NameContains(needle) => name.to_lowercase().contains(needle.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Departure,
    DriverRating,
}

/// Validated search.
#[derive(Debug, Clone)]
pub struct RideQuery {
    pub origin: PlaceFilter,
    pub destination: PlaceFilter,
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub sort: SortOrder,
}

impl RideQuery {
    pub fn from_filters(filters: &SearchFilters, local: FixedOffset) -> AppResult<Self> {
        let window = match filters.time.as_deref() {
            Some(raw) => {
                let minutes = filters.window_minutes.unwrap_or(DEFAULT_WINDOW_MINUTES);
                if minutes < 0 {
                    return Err(AppError::Validation(
                        "window_minutes must not be negative".to_string(),
                    ));
                }
                let center = parse_timestamp(raw, local)?.with_timezone(&Utc);
                let out_of_range =
                    || AppError::Validation("window_minutes is out of range".to_string());
                let half = Duration::try_minutes(minutes).ok_or_else(out_of_range)?;
                let start = center.checked_sub_signed(half).ok_or_else(out_of_range)?;
                let end = center.checked_add_signed(half).ok_or_else(out_of_range)?;
                Some((start, end))
            }
            None => None,
        };

        let sort = match filters.sort_by.as_deref() {
            Some("rating") => SortOrder::DriverRating,
            _ => SortOrder::Departure,
        };

        Ok(Self {
            origin: PlaceFilter::from_parts(
                filters.origin_lat,
                filters.origin_lng,
                filters.origin.as_deref(),
            ),
            destination: PlaceFilter::from_parts(
                filters.dest_lat,
                filters.dest_lng,
                filters.destination.as_deref(),
            ),
            window,
            sort,
        })
    }

    pub fn matches(&self, ride: &ride::Model) -> bool {
        let departs = ride.departure_time.with_timezone(&Utc);
        let in_window = self
            .window
            .map_or(true, |(start, end)| start <= departs && departs <= end);

        in_window
            && self.origin.matches(&ride.origin_name, ride.origin_point())
            && self.destination.matches(&ride.destination_name, ride.destination_point())
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub ride: ride::Model,
    pub driver_rating: f64,
}

/// Scheduled and in-progress rides matching every supplied filter.
pub async fn search_rides<C: ConnectionTrait>(conn: &C, query: &RideQuery) -> AppResult<Vec<SearchHit>> {
    let mut select = ride::Entity::find()
        .filter(ride::Column::Status.is_in(RideStatus::searchable()))
        .order_by_asc(ride::Column::DepartureTime);

    if let Some((start, end)) = query.window {
        let start: DateTime<FixedOffset> = start.into();
        let end: DateTime<FixedOffset> = end.into();
        select = select.filter(ride::Column::DepartureTime.between(start, end));
    }

    let rides: Vec<ride::Model> = select
        .all(conn)
        .await?
        .into_iter()
        .filter(|r| query.matches(r))
        .collect();

    let mut driver_ids: Vec<_> = rides.iter().map(|r| r.driver_id).collect();
    driver_ids.sort();
    driver_ids.dedup();
    let drivers = user::Entity::find()
        .filter(user::Column::Id.is_in(driver_ids))
        .all(conn)
        .await?;

    let mut hits: Vec<SearchHit> = rides
        .into_iter()
        .map(|ride| {
            let driver_rating = drivers
                .iter()
                .find(|d| d.id == ride.driver_id)
                .map(|d| d.avg_driver_rating)
                .unwrap_or_default();
            SearchHit { ride, driver_rating }
        })
        .collect();

    if query.sort == SortOrder::DriverRating {
        // Stable: equal ratings keep departure order
        hits.sort_by(|a, b| b.driver_rating.total_cmp(&a.driver_rating));
    }

    tracing::debug!(results = hits.len(), sort = ?query.sort, "ride search");
    Ok(hits)
}
