//! Domain operations. Each write runs in a single transaction: returning early
//! through `?` drops the transaction, which rolls it back.

pub mod bookings;
pub mod guards;
pub mod profiles;
pub mod ratings;
pub mod recurring;
pub mod rides;
pub mod search;
pub mod trip_patterns;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A named location with optional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat: None,
            lng: None,
        }
    }

    pub fn at(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    pub(crate) fn validated(self, field: &str) -> AppResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
        if self.lat.is_some() != self.lng.is_some() {
            return Err(AppError::Validation(format!(
                "{} needs both latitude and longitude",
                field
            )));
        }
        Ok(Self { name, ..self })
    }
}
