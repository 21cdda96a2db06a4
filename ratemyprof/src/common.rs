use chrono::{DateTime, Utc};
use serde::{de::Visitor, Deserialize, Serialize};
use serde_with::DeserializeAs;
use std::{convert::TryFrom, fmt::Display};

/// What CSV exports write in place of a value the service did not report.
pub const UNKNOWN: &str = "unknown";

/// The kinds of node the GraphQL service addresses by global id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Teacher,
    School,
}

impl NodeKind {
    /// The `__typename` the service reports for this kind of node.
    pub fn typename(self) -> &'static str {
        match self {
            Self::Teacher => "Teacher",
            Self::School => "School",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.typename())
    }
}

/// Build the global node id the service expects for a legacy id.
///
/// ## Example
/// ```txt
/// (School, 440)      -> "U2Nob29sLTQ0MA=="
/// (Teacher, 2255935) -> "VGVhY2hlci0yMjU1OTM1"
/// ```
pub fn node_id<T: Display>(kind: NodeKind, legacy_id: T) -> String {
    base64::encode(format!("{}-{}", kind, legacy_id))
}

/// A 1 to 5 score given by a single rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

#[derive(thiserror::Error, Debug)]
#[error("score {0} is outside 1..=5")]
pub struct ScoreOutOfRange(pub i64);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Returns `None` for anything outside `1..=5`; the service sends 0 for
    /// "not rated".
    pub fn new(value: i64) -> Option<Self> {
        Self::try_from(value).ok()
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreOutOfRange;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ScoreOutOfRange(value))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render an optional value, writing [`UNKNOWN`] when it is missing.
pub(crate) fn or_unknown<T: Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => UNKNOWN.to_string(),
    }
}

/// Split the service's `--`-joined tag string into distinct labels,
/// keeping first-seen order.
///
/// ## Example
/// ```txt
/// "Tough grader--Get ready to read--" -> ["Tough grader", "Get ready to read"]
/// ```
pub fn split_tags<S: AsRef<str>>(s: S) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in s.as_ref().split("--").map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Parse a rating timestamp such as `2023-05-10 17:41:55 +0000 UTC`.
/// The service does not promise a format, so anything else gives `None`.
pub fn parse_timestamp<S: AsRef<str>>(s: S) -> Option<DateTime<Utc>> {
    let s = s.as_ref().trim();
    let trimmed = s.strip_suffix("UTC").map(str::trim_end).unwrap_or(s);
    DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Deserialize a `--`-joined tag string straight into a list of labels.
pub struct DashSeparated;

impl<'de> DeserializeAs<'de, Vec<String>> for DashSeparated {
    fn deserialize_as<D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Helper;

        impl<'de> Visitor<'de> for Helper {
            type Value = Vec<String>;

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(split_tags(v))
            }

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string of tags joined by \"--\"")
            }
        }

        deserializer.deserialize_str(Helper)
    }
}
