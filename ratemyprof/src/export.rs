//! CSV output for professors and ratings.

use serde::Serialize;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    common::or_unknown,
    error::{Error, ExportError, Result},
    schemas::{Professor, Rating},
};

pub const PROFESSOR_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "first_name",
    "last_name",
    "department",
    "num_of_ratings",
    "overall_rating",
    "would_take_again_percent",
    "difficulty",
];

pub const RATING_COLUMNS: [&str; 11] = [
    "id",
    "class",
    "comment",
    "date",
    "helpful_rating",
    "clarity_rating",
    "difficulty_rating",
    "would_take_again",
    "grade",
    "tags",
    "is_for_online_class",
];

/// Where [`crate::Session::write_professors_to_csv`] writes when no path is given.
pub const DEFAULT_PROFESSORS_FILE: &str = "professors.csv";

/// Where [`crate::Session::write_ratings_to_csv`] writes when no path is given.
pub fn default_ratings_file(professor_id: u64) -> PathBuf {
    PathBuf::from(format!("TeacherID_{}.csv", professor_id))
}

#[derive(Serialize)]
struct ProfessorRow<'a> {
    id: u64,
    name: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    department: &'a str,
    num_of_ratings: u32,
    overall_rating: f64,
    would_take_again_percent: String,
    difficulty: f64,
}

impl<'a> From<&'a Professor> for ProfessorRow<'a> {
    fn from(p: &'a Professor) -> Self {
        Self {
            id: p.id,
            name: &p.name,
            first_name: &p.first_name,
            last_name: &p.last_name,
            department: &p.department,
            num_of_ratings: p.num_of_ratings,
            overall_rating: p.overall_rating,
            would_take_again_percent: or_unknown(p.would_take_again_percent),
            difficulty: p.difficulty,
        }
    }
}

#[derive(Serialize)]
struct RatingRow<'a> {
    id: u64,
    class: &'a str,
    comment: &'a str,
    date: &'a str,
    helpful_rating: String,
    clarity_rating: String,
    difficulty_rating: String,
    would_take_again: String,
    grade: &'a str,
    tags: String,
    is_for_online_class: bool,
}

impl<'a> From<&'a Rating> for RatingRow<'a> {
    fn from(r: &'a Rating) -> Self {
        Self {
            id: r.id,
            class: &r.class,
            comment: &r.comment,
            date: &r.date,
            helpful_rating: or_unknown(r.helpful_rating),
            clarity_rating: or_unknown(r.clarity_rating),
            difficulty_rating: or_unknown(r.difficulty_rating),
            would_take_again: or_unknown(r.would_take_again),
            grade: r.grade.as_deref().unwrap_or(crate::common::UNKNOWN),
            tags: r.tags.join("--"),
            is_for_online_class: r.is_for_online_class,
        }
    }
}

/// Write a header row, then one row per item. The header is written even
/// when there are no rows.
fn write_rows<W, R, I>(writer: W, header: &[&str], rows: I) -> std::result::Result<(), ExportError>
where
    W: Write,
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(header)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write `professors` as CSV to any writer.
pub fn write_professors<W: Write>(
    writer: W,
    professors: &[Professor],
) -> std::result::Result<(), ExportError> {
    write_rows(
        writer,
        &PROFESSOR_COLUMNS,
        professors.iter().map(ProfessorRow::from),
    )
}

/// Write `ratings` as CSV to any writer.
pub fn write_ratings<W: Write>(writer: W, ratings: &[Rating]) -> std::result::Result<(), ExportError> {
    write_rows(writer, &RATING_COLUMNS, ratings.iter().map(RatingRow::from))
}

/// Create (or truncate) `path`, creating missing parent directories first.
pub(crate) fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::export(parent, e))?;
        }
    }
    File::create(path).map_err(|e| Error::export(path, e))
}

/// Write professors to a file; see [`write_professors`].
pub fn write_professors_file(path: &Path, professors: &[Professor]) -> Result<()> {
    let file = create_file(path)?;
    write_professors(file, professors).map_err(|e| Error::export(path, e))
}

/// Write ratings to a file; see [`write_ratings`].
pub fn write_ratings_file(path: &Path, ratings: &[Rating]) -> Result<()> {
    let file = create_file(path)?;
    write_ratings(file, ratings).map_err(|e| Error::export(path, e))
}
