use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::rating::RatingType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "driver")]
    Driver,
    #[sea_orm(string_value = "rider")]
    Rider,
    #[sea_orm(string_value = "both")]
    Both,
}

impl UserRole {
    pub fn can_drive(self) -> bool {
        matches!(self, UserRole::Driver | UserRole::Both)
    }

    pub fn can_ride(self) -> bool {
        matches!(self, UserRole::Rider | UserRole::Both)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub major: Option<String>,
    pub year: Option<i32>,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
    pub last_location_update: Option<DateTimeWithTimeZone>,
    pub avg_driver_rating: f64,
    pub driver_rating_count: i32,
    pub avg_rider_rating: f64,
    pub rider_rating_count: i32,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Current `(average, count)` aggregate for one rating type.
    pub fn rating_aggregate(&self, rating_type: RatingType) -> (f64, i32) {
        match rating_type {
            RatingType::DriverRating => (self.avg_driver_rating, self.driver_rating_count),
            RatingType::RiderRating => (self.avg_rider_rating, self.rider_rating_count),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ride::Entity")]
    Rides,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rides.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
