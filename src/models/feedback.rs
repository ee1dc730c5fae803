use std::fmt::Display;

use thiserror::Error;

use super::{pair::PairId, types::UtcDateTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeedbackId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub id: FeedbackId,
    pub pair_id: PairId,
    pub message: String,
    pub rating: Option<Rating>,
    pub created_at: UtcDateTime,
}

/// A 1 to 5 star rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Rating must be between {} and {}, got {0}", Rating::MIN, Rating::MAX)]
pub struct InvalidRating(pub i64);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Rating, InvalidRating> {
        if (Rating::MIN as i64..=Rating::MAX as i64).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(InvalidRating(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", "★".repeat(self.0 as usize))
    }
}
