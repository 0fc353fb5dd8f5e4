use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly template; concrete rides point back through `ride.recurring_id`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_ride")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin_name: String,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_name: String,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub departure_time_of_day: Time,
    /// Comma-separated weekday numbers, 0 = Monday.
    pub days_of_week: String,
    pub total_seats: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ride::Entity")]
    Rides,
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
