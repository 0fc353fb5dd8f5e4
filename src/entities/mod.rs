pub mod booking;
pub mod rating;
pub mod recurring_ride;
pub mod ride;
pub mod trip_pattern;
pub mod user;
