//! The queries this crate sends, and the raw shapes the service answers with.
//!
//! Everything in here mirrors the service's JSON; the rest of the crate only
//! sees [`Professor`], [`Rating`] and [`School`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::{
    common::{DashSeparated, NodeKind, Score},
    error::{DecodeError, Result, TransportError},
    schemas::{Professor, Rating, School},
};

const TEACHER_SEARCH_QUERY: &str = r#"query TeacherSearchPaginationQuery($count: Int!, $cursor: String, $query: TeacherSearchQuery!) {
  search: newSearch {
    teachers(query: $query, first: $count, after: $cursor) {
      didFallback
      edges {
        cursor
        node {
          __typename
          id
          legacyId
          firstName
          lastName
          department
          avgRating
          numRatings
          wouldTakeAgainPercent
          avgDifficulty
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}"#;

const TEACHER_QUERY: &str = r#"query TeacherRatingsPageQuery($id: ID!, $count: Int!, $cursor: String) {
  node(id: $id) {
    __typename
    ... on Teacher {
      id
      legacyId
      firstName
      lastName
      department
      avgRating
      numRatings
      wouldTakeAgainPercent
      avgDifficulty
      ratings(first: $count, after: $cursor) {
        edges {
          cursor
          node {
            id
            legacyId
            class
            comment
            date
            helpfulRating
            clarityRating
            difficultyRating
            wouldTakeAgain
            grade
            ratingTags
            isForOnlineClass
          }
        }
        pageInfo {
          hasNextPage
          endCursor
        }
      }
    }
  }
}"#;

const SCHOOL_QUERY: &str = r#"query SchoolQuery($id: ID!) {
  node(id: $id) {
    __typename
    ... on School {
      id
      legacyId
      name
      city
      state
    }
  }
}"#;

/// One GraphQL request, ready to be posted as JSON.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: &'static str,
    pub operation_name: &'static str,
    pub variables: Value,
}

impl Request {
    /// Professors at `school` whose name matches `text`. An empty `text`
    /// matches everyone.
    pub fn teacher_search(school: &str, text: &str, count: u32, cursor: Option<&str>) -> Self {
        Self {
            query: TEACHER_SEARCH_QUERY,
            operation_name: "TeacherSearchPaginationQuery",
            variables: json!({
                "count": count,
                "cursor": cursor,
                "query": {
                    "text": text,
                    "schoolID": school,
                    "fallback": false,
                },
            }),
        }
    }

    /// A professor with one page of their ratings.
    pub fn teacher(teacher: &str, count: u32, cursor: Option<&str>) -> Self {
        Self {
            query: TEACHER_QUERY,
            operation_name: "TeacherRatingsPageQuery",
            variables: json!({
                "id": teacher,
                "count": count,
                "cursor": cursor,
            }),
        }
    }

    pub fn school(school: &str) -> Self {
        Self {
            query: SCHOOL_QUERY,
            operation_name: "SchoolQuery",
            variables: json!({ "id": school }),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    errors: Option<Vec<RemoteError>>,
}

#[derive(Deserialize)]
struct RemoteError {
    message: String,
}

/// Unwrap a GraphQL response body into its `data`.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    match envelope.errors {
        Some(errors) if !errors.is_empty() => Err(TransportError::Remote(
            errors.into_iter().map(|e| e.message).collect(),
        )
        .into()),
        _ => envelope.data.ok_or_else(|| DecodeError::MissingData.into()),
    }
}

/// A run of results plus the cursor to continue from, if there is more.
pub(crate) struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    did_fallback: Option<bool>,
    edges: Vec<Edge<T>>,
    page_info: PageInfo,
}

#[derive(Deserialize, Debug)]
struct Edge<T> {
    node: Option<T>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl<R> Connection<R> {
    fn into_page<T: From<R>>(self) -> Page<T> {
        let next = if self.page_info.has_next_page {
            self.page_info.end_cursor
        } else {
            None
        };
        Page {
            items: self
                .edges
                .into_iter()
                .filter_map(|edge| edge.node)
                .map(T::from)
                .collect(),
            next,
        }
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct SearchData {
    search: SearchRoot,
}

#[derive(Deserialize, Debug)]
struct SearchRoot {
    teachers: Option<Connection<RawTeacher>>,
}

impl SearchData {
    /// The page of summaries, and whether the service gave up on the text
    /// and fell back to unfiltered results.
    pub fn into_page(self) -> (Page<Professor>, bool) {
        match self.search.teachers {
            Some(conn) => {
                let fell_back = conn.did_fallback.unwrap_or(false);
                (conn.into_page(), fell_back)
            }
            None => (Page::empty(), false),
        }
    }
}

/// The answer to a `node(id:)` query.
#[derive(Deserialize, Debug)]
pub(crate) struct NodeData {
    node: Option<Value>,
}

impl NodeData {
    /// `None` when the service has no such node.
    pub fn into_node<T: DeserializeOwned>(self, kind: NodeKind) -> Result<Option<T>> {
        let node = match self.node {
            Some(node) => node,
            None => return Ok(None),
        };
        let found = node
            .get("__typename")
            .and_then(Value::as_str)
            .unwrap_or("untyped node");
        if found != kind.typename() {
            return Err(DecodeError::UnexpectedNode {
                expected: kind.typename(),
                found: found.to_string(),
            }
            .into());
        }
        Ok(Some(serde_json::from_value(node)?))
    }
}

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTeacher {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    legacy_id: u64,
    first_name: Option<String>,
    last_name: Option<String>,
    department: Option<String>,
    num_ratings: Option<u32>,
    avg_rating: Option<f64>,
    would_take_again_percent: Option<f64>,
    avg_difficulty: Option<f64>,
    ratings: Option<Connection<RawRating>>,
}

impl RawTeacher {
    /// The professor, and the page of ratings that came with them.
    pub fn into_detail(mut self) -> (Professor, Page<Rating>) {
        let ratings = self
            .ratings
            .take()
            .map(Connection::into_page)
            .unwrap_or_else(Page::empty);
        (Professor::from(self), ratings)
    }
}

impl From<RawTeacher> for Professor {
    fn from(raw: RawTeacher) -> Self {
        Professor::new(
            raw.legacy_id,
            raw.first_name.unwrap_or_default(),
            raw.last_name.unwrap_or_default(),
            raw.num_ratings.unwrap_or(0),
            raw.avg_rating,
        )
        .with_department(raw.department.unwrap_or_default())
        .with_would_take_again_percent(raw.would_take_again_percent)
        .with_difficulty(raw.avg_difficulty)
    }
}

/// `wouldTakeAgain` arrives as 1/0, occasionally as a boolean, or null.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(f64),
}

impl Flag {
    fn known(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Number(n) if n == 1.0 => Some(true),
            Self::Number(n) if n == 0.0 => Some(false),
            Self::Number(_) => None,
        }
    }
}

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawRating {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    legacy_id: u64,
    class: Option<String>,
    comment: Option<String>,
    date: Option<String>,
    helpful_rating: Option<f64>,
    clarity_rating: Option<f64>,
    difficulty_rating: Option<f64>,
    would_take_again: Option<Flag>,
    grade: Option<String>,
    #[serde(default)]
    #[serde_as(as = "Option<DashSeparated>")]
    rating_tags: Option<Vec<String>>,
    is_for_online_class: Option<bool>,
}

fn score(value: Option<f64>) -> Option<Score> {
    value
        .filter(|v| v.fract() == 0.0)
        .and_then(|v| Score::new(v as i64))
}

impl From<RawRating> for Rating {
    fn from(raw: RawRating) -> Self {
        Rating {
            id: raw.legacy_id,
            class: raw.class.unwrap_or_default(),
            comment: raw.comment.unwrap_or_default(),
            date: raw.date.unwrap_or_default(),
            helpful_rating: score(raw.helpful_rating),
            clarity_rating: score(raw.clarity_rating),
            difficulty_rating: score(raw.difficulty_rating),
            would_take_again: raw.would_take_again.and_then(Flag::known),
            grade: raw.grade.filter(|g| !g.trim().is_empty()),
            tags: raw.rating_tags.unwrap_or_default(),
            is_for_online_class: raw.is_for_online_class.unwrap_or(false),
        }
    }
}

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSchool {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    legacy_id: u64,
    name: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

impl From<RawSchool> for School {
    fn from(raw: RawSchool) -> Self {
        School {
            id: raw.legacy_id,
            name: raw.name.unwrap_or_default(),
            city: raw.city.unwrap_or_default(),
            state: raw.state.unwrap_or_default(),
        }
    }
}
