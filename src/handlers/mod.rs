pub mod auth;
pub mod bookings;
pub mod extract;
pub mod ratings;
pub mod recommendations;
pub mod rides;
pub mod users;

use serde::Serialize;
use uuid::Uuid;

use crate::entities::user;

/// The part of a user shown to other users.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub major: Option<String>,
    pub year: Option<i32>,
    pub avg_driver_rating: f64,
    pub avg_rider_rating: f64,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            major: user.major,
            year: user.year,
            avg_driver_rating: user.avg_driver_rating,
            avg_rider_rating: user.avg_rider_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
