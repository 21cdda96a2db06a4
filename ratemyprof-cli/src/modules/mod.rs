pub mod export;
pub mod professor;
pub mod search;
