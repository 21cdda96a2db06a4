//! A client for the Rate My Professors GraphQL service: search a
//! university's professors, fetch their ratings, and export both as CSV.
//!
//! ```no_run
//! # async fn demo() -> ratemyprof::Result<()> {
//! let session = ratemyprof::Session::new("440")?;
//! let professor = session.get_professor_by_name("Kristi DeBoeuf").await?;
//! session.write_ratings_to_csv(professor.id, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod export;
pub mod graphql;
pub mod schemas;
pub mod session;
pub mod transport;

pub use chrono;

pub use config::Config;
pub use error::{Error, Result};
pub use schemas::{Professor, Rating, School};
pub use session::Session;
pub use transport::{HttpTransport, Transport};
