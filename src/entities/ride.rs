use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// Whether a driver may move a ride from `self` to `next` through a status update.
    /// Cancellation is excluded: it goes through the cancel operation, which applies a penalty.
    pub fn can_advance_to(self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Scheduled, RideStatus::InProgress)
                | (RideStatus::Scheduled, RideStatus::Completed)
                | (RideStatus::InProgress, RideStatus::Completed)
        )
    }

    /// Statuses visible to search.
    pub fn searchable() -> [RideStatus; 2] {
        [RideStatus::Scheduled, RideStatus::InProgress]
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RideStatus::Scheduled => "scheduled",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ride")]
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
    pub departure_time: DateTimeWithTimeZone,
    pub total_seats: i32,
    pub available_seats: i32,
    pub status: RideStatus,
    pub is_recurring: bool,
    pub recurring_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn origin_point(&self) -> Option<(f64, f64)> {
        self.origin_lat.zip(self.origin_lng)
    }

    pub fn destination_point(&self) -> Option<(f64, f64)> {
        self.destination_lat.zip(self.destination_lng)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(
        belongs_to = "super::recurring_ride::Entity",
        from = "Column::RecurringId",
        to = "super::recurring_ride::Column::Id"
    )]
    RecurringRide,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl Related<super::recurring_ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringRide.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        assert!(RideStatus::Scheduled.can_advance_to(RideStatus::InProgress));
        assert!(RideStatus::Scheduled.can_advance_to(RideStatus::Completed));
        assert!(RideStatus::InProgress.can_advance_to(RideStatus::Completed));

        assert!(!RideStatus::InProgress.can_advance_to(RideStatus::Scheduled));
        assert!(!RideStatus::Scheduled.can_advance_to(RideStatus::Scheduled));
        assert!(!RideStatus::Scheduled.can_advance_to(RideStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in [RideStatus::Completed, RideStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in [
                RideStatus::Scheduled,
                RideStatus::InProgress,
                RideStatus::Completed,
                RideStatus::Cancelled,
            ] {
                assert!(!from.can_advance_to(to));
            }
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RideStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(RideStatus::InProgress.to_string(), "in_progress");
    }
}
