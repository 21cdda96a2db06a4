use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::schemas::rating::Rating;

/// A professor, either as a search summary (`ratings` empty) or as full
/// detail from [`crate::Session::get_professor_by_id`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    pub id: u64,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    /// The service's count; not necessarily `ratings.len()`.
    pub num_of_ratings: u32,
    pub overall_rating: f64,
    pub would_take_again_percent: Option<f64>,
    pub difficulty: f64,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl Professor {
    /// Assemble a professor from the pieces the service reports.
    ///
    /// A professor nobody has rated gets an overall rating of 0, whatever
    /// the service claims; a negative would-take-again percentage means the
    /// service does not know it.
    pub fn new(
        id: u64,
        first_name: String,
        last_name: String,
        num_of_ratings: u32,
        overall_rating: Option<f64>,
    ) -> Self {
        let name = format!("{} {}", first_name.trim(), last_name.trim())
            .trim()
            .to_string();
        let overall_rating = if num_of_ratings < 1 {
            0.0
        } else {
            overall_rating.unwrap_or(0.0)
        };
        Self {
            id,
            name,
            first_name,
            last_name,
            department: String::new(),
            num_of_ratings,
            overall_rating,
            would_take_again_percent: None,
            difficulty: 0.0,
            ratings: Vec::new(),
        }
    }

    pub fn with_department(mut self, department: String) -> Self {
        self.department = department;
        self
    }

    pub fn with_would_take_again_percent(mut self, percent: Option<f64>) -> Self {
        self.would_take_again_percent = percent.filter(|p| *p >= 0.0);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Option<f64>) -> Self {
        self.difficulty = difficulty.unwrap_or(0.0);
        self
    }

    pub fn with_ratings(mut self, ratings: Vec<Rating>) -> Self {
        self.ratings = ratings;
        self
    }
}

impl Display for Professor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (ID: {}, Rating: {})",
            self.name, self.id, self.overall_rating
        )
    }
}
