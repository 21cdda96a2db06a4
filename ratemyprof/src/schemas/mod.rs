pub mod professor;
pub mod rating;
pub mod school;

pub use professor::Professor;
pub use rating::Rating;
pub use school::School;
