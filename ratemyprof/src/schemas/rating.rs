use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{parse_timestamp, Score};

/// One student's evaluation of a professor for one class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: u64,
    /// Course code as the student typed it, e.g. `CSCI-C 343`.
    pub class: String,
    pub comment: String,
    /// The timestamp exactly as the service sent it.
    pub date: String,
    pub helpful_rating: Option<Score>,
    pub clarity_rating: Option<Score>,
    pub difficulty_rating: Option<Score>,
    pub would_take_again: Option<bool>,
    pub grade: Option<String>,
    /// Distinct labels, in the order the service listed them.
    pub tags: Vec<String>,
    pub is_for_online_class: bool,
}

impl Rating {
    /// [`Rating::date`] parsed, if it is in a format we recognise.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }
}
