pub mod blocklist;
pub mod geo;
pub mod jwt;
pub mod password;
pub mod time;
