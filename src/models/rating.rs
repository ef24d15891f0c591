use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

pub const MAX_STARS: u8 = 5;

/// A user's star rating at half-star granularity
///
/// The numeric value is `stars + 0.5 * half`, always in `0.5..=5.0`.
/// "Not rated" is modelled as `Option<Rating>::None`, never as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating {
    stars: u8,
    half: bool,
}

impl Rating {
    /// Creates a rating from whole stars plus an optional half star
    pub fn new(stars: u8, half: bool) -> AppResult<Self> {
        if stars > MAX_STARS || (stars == MAX_STARS && half) || (stars == 0 && !half) {
            return Err(AppError::InvalidInput(format!(
                "rating must be between 0.5 and {} stars, got {}{}",
                MAX_STARS,
                stars,
                if half { ".5" } else { "" }
            )));
        }
        Ok(Self { stars, half })
    }

    /// Parses a numeric rating, accepting only multiples of 0.5 in `0.5..=5.0`
    pub fn from_value(value: f64) -> AppResult<Self> {
        let doubled = value * 2.0;
        if !value.is_finite() || doubled.fract() != 0.0 || !(1.0..=10.0).contains(&doubled) {
            return Err(AppError::InvalidInput(format!(
                "rating must be a multiple of 0.5 between 0.5 and {}, got {}",
                MAX_STARS, value
            )));
        }
        let halves = doubled as u8;
        Ok(Self {
            stars: halves / 2,
            half: halves % 2 == 1,
        })
    }

    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn is_half(&self) -> bool {
        self.half
    }

    pub fn value(&self) -> f64 {
        f64::from(self.stars) + if self.half { 0.5 } else { 0.0 }
    }
}

impl TryFrom<f64> for Rating {
    type Error = AppError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::from_value(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.stars, if self.half { ".5" } else { "" })
    }
}
