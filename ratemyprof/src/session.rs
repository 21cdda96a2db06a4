use futures::{
    stream::{self, Stream},
    StreamExt, TryStreamExt,
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    common::{node_id, NodeKind},
    config::Config,
    error::{Error, Result},
    export,
    graphql::{decode, NodeData, Page, RawSchool, RawTeacher, Request, SearchData},
    schemas::{Professor, School},
    transport::{HttpTransport, Transport},
};

/// Where the next page of a paginated query starts.
#[derive(Default)]
struct Cursor {
    after: Option<String>,
    fetched: usize,
    seen: HashSet<String>,
}

/// Everything this crate does, scoped to one university.
pub struct Session<T = HttpTransport> {
    university_id: String,
    school_node: String,
    config: Config,
    transport: T,
}

impl Session<HttpTransport> {
    /// A session with the default [`Config`], talking to the real service.
    ///
    /// # Errors
    /// Errors if `university_id` is blank, or the HTTP client can't be built.
    pub fn new<S: Into<String>>(university_id: S) -> Result<Self> {
        Self::with_config(university_id, Config::default())
    }

    pub fn with_config<S: Into<String>>(university_id: S, config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(university_id, config, transport)
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport<S: Into<String>>(
        university_id: S,
        config: Config,
        transport: T,
    ) -> Result<Self> {
        let university_id = university_id.into().trim().to_string();
        if university_id.is_empty() {
            return Err(Error::EmptyUniversityId);
        }
        Ok(Self {
            school_node: node_id(NodeKind::School, &university_id),
            university_id,
            config,
            transport,
        })
    }

    pub fn university_id(&self) -> &str {
        &self.university_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name and location of the session's university.
    pub async fn school(&self) -> Result<School> {
        let body = self
            .transport
            .execute(&Request::school(&self.school_node))
            .await?;
        decode::<NodeData>(&body)?
            .into_node::<RawSchool>(NodeKind::School)?
            .map(School::from)
            .ok_or_else(|| Error::not_found(&self.university_id, "School ID"))
    }

    async fn search_page(
        &self,
        text: &str,
        cursor: Option<Cursor>,
    ) -> Result<Option<(Vec<Professor>, Option<Cursor>)>> {
        let cursor = match cursor {
            Some(cursor) => cursor,
            None => return Ok(None),
        };
        let request = Request::teacher_search(
            &self.school_node,
            text,
            self.config.page_size,
            cursor.after.as_deref(),
        );
        let body = self.transport.execute(&request).await?;
        let (page, fell_back) = decode::<SearchData>(&body)?.into_page();
        if fell_back && !text.is_empty() {
            // Later pages keep what the earlier, filtered pages matched.
            if cursor.fetched == 0 {
                warn!(
                    query = text,
                    "service fell back to unfiltered results; treating as no match"
                );
                return Ok(Some((Vec::new(), None)));
            }
            warn!(
                query = text,
                page = cursor.fetched + 1,
                "service fell back to unfiltered results; stopping"
            );
            return Ok(None);
        }

        debug!(query = text, page = cursor.fetched + 1, results = page.items.len(), "search page");
        let next = self.next_cursor(cursor, &page);
        Ok(Some((page.items, next)))
    }

    /// The cursor for the page after `page`, or `None` once paging should
    /// stop. A cursor seen before, or an empty page claiming more follow,
    /// ends paging too.
    fn next_cursor<I>(&self, mut cursor: Cursor, page: &Page<I>) -> Option<Cursor> {
        let next = page.next.as_ref()?;
        cursor.fetched += 1;
        if !self.config.allows_page(cursor.fetched) {
            debug!(pages = cursor.fetched, "page limit reached");
            return None;
        }
        if let Some(after) = cursor.after.take() {
            cursor.seen.insert(after);
        }
        if page.items.is_empty() || cursor.seen.contains(next) {
            warn!(pages = cursor.fetched, cursor = %next, "service cursor did not advance; stopping");
            return None;
        }
        cursor.after = Some(next.clone());
        Some(cursor)
    }

    /// Lazily page through professors whose names match `text`.
    fn teacher_pages<'a>(&'a self, text: String) -> impl Stream<Item = Result<Professor>> + 'a {
        stream::try_unfold(Some(Cursor::default()), move |cursor| {
            let text = text.clone();
            async move { self.search_page(&text, cursor).await }
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
    }

    /// Like [`Session::search_professor`], but yields professors as their
    /// pages arrive. Every call queries the service afresh.
    pub fn search_professor_stream<'a>(
        &'a self,
        name: &str,
    ) -> impl Stream<Item = Result<Professor>> + 'a {
        let text = name.trim().to_string();
        if text.is_empty() {
            stream::empty::<Result<Professor>>().left_stream()
        } else {
            self.teacher_pages(text).right_stream()
        }
    }

    /// Professors at this university whose names match `name`, as the
    /// service orders them. Summaries only: `ratings` is always empty.
    ///
    /// A blank name, or one that matches nobody, gives an empty list.
    pub async fn search_professor(&self, name: &str) -> Result<Vec<Professor>> {
        self.search_professor_stream(name).try_collect().await
    }

    /// Every professor the service lists for this university.
    pub async fn list_professors(&self) -> Result<Vec<Professor>> {
        let professors: Vec<Professor> = self.teacher_pages(String::new()).try_collect().await?;
        info!(
            university = %self.university_id,
            count = professors.len(),
            "listed professors"
        );
        Ok(professors)
    }

    /// A professor with all of their ratings.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the service has no professor with this id.
    pub async fn get_professor_by_id(&self, professor_id: u64) -> Result<Professor> {
        let teacher = node_id(NodeKind::Teacher, professor_id);
        let mut professor: Option<Professor> = None;
        let mut ratings = Vec::new();
        let mut cursor = Some(Cursor::default());

        while let Some(current) = cursor.take() {
            let request =
                Request::teacher(&teacher, self.config.page_size, current.after.as_deref());
            let body = self.transport.execute(&request).await?;
            let raw = decode::<NodeData>(&body)?
                .into_node::<RawTeacher>(NodeKind::Teacher)?
                .ok_or_else(|| Error::not_found(professor_id, "ID"))?;

            let (detail, page): (Professor, Page<_>) = raw.into_detail();
            debug!(
                professor_id,
                page = current.fetched + 1,
                ratings = page.items.len(),
                "ratings page"
            );
            cursor = self.next_cursor(current, &page);
            ratings.extend(page.items);
            professor.get_or_insert(detail);
        }

        professor
            .map(|p| p.with_ratings(ratings))
            .ok_or_else(|| Error::not_found(professor_id, "ID"))
    }

    /// Search for `name` and fetch the first match in full.
    ///
    /// The first result wins even when several professors match; nothing
    /// tries to pick the best one.
    pub async fn get_professor_by_name(&self, name: &str) -> Result<Professor> {
        let matches = self.search_professor(name).await?;
        let first = matches.first().ok_or_else(|| Error::not_found(name, "Name"))?;
        if matches.len() > 1 {
            warn!(
                query = name,
                matches = matches.len(),
                chosen = %first,
                "several professors match; using the first"
            );
        }
        self.get_professor_by_id(first.id).await
    }

    /// Export this university's whole roster. Writes to `path`, or to
    /// [`export::DEFAULT_PROFESSORS_FILE`] in the working directory.
    pub async fn write_professors_to_csv(&self, path: Option<&Path>) -> Result<PathBuf> {
        let professors = self.list_professors().await?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(export::DEFAULT_PROFESSORS_FILE));
        export::write_professors_file(&path, &professors)?;
        info!(path = %path.display(), rows = professors.len(), "wrote professors");
        Ok(path)
    }

    /// Export one professor's ratings. Writes to `path`, or to
    /// `TeacherID_{id}.csv` in the working directory.
    pub async fn write_ratings_to_csv(
        &self,
        professor_id: u64,
        path: Option<&Path>,
    ) -> Result<PathBuf> {
        let professor = self.get_professor_by_id(professor_id).await?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| export::default_ratings_file(professor_id));
        export::write_ratings_file(&path, &professor.ratings)?;
        info!(path = %path.display(), rows = professor.ratings.len(), "wrote ratings");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use hex::ToHex;
    use std::sync::Mutex;

    use super::Session;
    use crate::{
        common::node_id,
        common::NodeKind,
        config::Config,
        error::{Error, Result, TransportError},
        graphql::{
            tests::{rating_node, search_body, teacher_body, teacher_node},
            Request,
        },
        transport::Transport,
    };

    /// Answers requests from a queue of canned bodies, recording what was asked.
    #[derive(Default)]
    struct Canned {
        bodies: Mutex<Vec<String>>,
        seen: Mutex<Vec<serde_json::Value>>,
    }

    impl Canned {
        fn new<I: IntoIterator<Item = String>>(bodies: I) -> Self {
            let mut bodies: Vec<String> = bodies.into_iter().collect();
            bodies.reverse();
            Self {
                bodies: Mutex::new(bodies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<serde_json::Value> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn execute(&self, request: &Request) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push(serde_json::to_value(request).unwrap());
            self.bodies.lock().unwrap().pop().ok_or_else(|| {
                TransportError::Status {
                    endpoint: "canned".into(),
                    status: 503,
                }
                .into()
            })
        }
    }

    fn session(bodies: Vec<String>) -> Session<Canned> {
        Session::with_transport("440", Config::default(), Canned::new(bodies)).unwrap()
    }

    #[test]
    fn test_blank_university_rejected() {
        let err = Session::with_transport(" ", Config::default(), Canned::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::EmptyUniversityId));
    }

    #[tokio::test]
    async fn test_blank_search_sends_nothing() {
        let s = session(vec![]);
        assert!(s.search_professor("").await.unwrap().is_empty());
        assert!(s.search_professor("   ").await.unwrap().is_empty());
        assert!(s.transport.seen().is_empty());
    }

    #[tokio::test]
    async fn test_search_follows_cursors() {
        let s = session(vec![
            search_body(vec![teacher_node(1, "Ann", "Smith")], Some("p1"), false),
            search_body(vec![teacher_node(2, "Bob", "Smith")], None, false),
        ]);
        let profs = s.search_professor("smith").await.unwrap();
        assert_eq!(
            profs.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let seen = s.transport.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["variables"]["query"]["schoolID"], node_id(NodeKind::School, 440));
        assert!(seen[0]["variables"]["cursor"].is_null());
        assert_eq!(seen[1]["variables"]["cursor"], "p1");
    }

    #[tokio::test]
    async fn test_max_pages_stops_early() {
        let config = Config {
            max_pages: Some(1),
            ..Config::default()
        };
        let transport = Canned::new(vec![search_body(
            vec![teacher_node(1, "Ann", "Smith")],
            Some("p1"),
            false,
        )]);
        let s = Session::with_transport("440", config, transport).unwrap();
        assert_eq!(s.search_professor("smith").await.unwrap().len(), 1);
        assert_eq!(s.transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let s = session(vec![
            search_body(vec![], None, false),
            search_body(vec![teacher_node(9, "Fallback", "Result")], None, true),
        ]);
        assert!(s.search_professor("zzzz").await.unwrap().is_empty());
        assert!(s.search_professor("qqqq").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stuck_cursor_stops_search() {
        let stuck = || search_body(vec![teacher_node(1, "Ann", "Smith")], Some("same"), false);
        let s = session(vec![stuck(), stuck(), stuck()]);
        let profs = s.search_professor("smith").await.unwrap();
        assert_eq!(profs.len(), 2);
        assert_eq!(s.transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_cursor_cycle_stops_search() {
        let s = session(vec![
            search_body(vec![teacher_node(1, "Ann", "Smith")], Some("a"), false),
            search_body(vec![teacher_node(2, "Bob", "Smith")], Some("b"), false),
            search_body(vec![teacher_node(3, "Cy", "Smith")], Some("a"), false),
            search_body(vec![teacher_node(4, "Di", "Smith")], Some("b"), false),
        ]);
        let profs = s.search_professor("smith").await.unwrap();
        assert_eq!(profs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(s.transport.seen().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_page_with_more_stops_search() {
        let s = session(vec![
            search_body(vec![teacher_node(1, "Ann", "Smith")], Some("p1"), false),
            search_body(vec![], Some("p2"), false),
            search_body(vec![teacher_node(2, "Bob", "Smith")], None, false),
        ]);
        let profs = s.search_professor("smith").await.unwrap();
        assert_eq!(profs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(s.transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_stuck_cursor_stops_ratings() {
        let stuck = || {
            teacher_body(
                teacher_node(5, "A", "B"),
                vec![rating_node(1, "again")],
                Some("r1"),
            )
        };
        let s = session(vec![stuck(), stuck(), stuck()]);
        let prof = s.get_professor_by_id(5).await.unwrap();
        assert_eq!(prof.ratings.len(), 2);
        assert_eq!(s.transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_late_fallback_keeps_earlier_matches() {
        let s = session(vec![
            search_body(vec![teacher_node(1, "Ann", "Smith")], Some("p1"), false),
            search_body(vec![teacher_node(9, "Fallback", "Result")], Some("p2"), true),
            search_body(vec![teacher_node(10, "Never", "Asked")], None, false),
        ]);
        let profs = s.search_professor("smith").await.unwrap();
        assert_eq!(profs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(s.transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let s = session(vec![]);
        let err = s.search_professor("smith").await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_decode_failure_propagates() {
        let s = session(vec!["<html></html>".to_string()]);
        assert!(matches!(
            s.search_professor("smith").await.unwrap_err(),
            Error::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_collects_all_rating_pages() {
        let s = session(vec![
            teacher_body(
                teacher_node(2255935, "Kristi", "DeBoeuf"),
                vec![rating_node(1, "one"), rating_node(2, "two")],
                Some("r2"),
            ),
            teacher_body(
                teacher_node(2255935, "Kristi", "DeBoeuf"),
                vec![rating_node(3, "three")],
                None,
            ),
        ]);
        let prof = s.get_professor_by_id(2255935).await.unwrap();
        assert_eq!(prof.name, "Kristi DeBoeuf");
        assert_eq!(
            prof.ratings.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let seen = s.transport.seen();
        assert_eq!(seen[0]["variables"]["id"], "VGVhY2hlci0yMjU1OTM1");
        assert_eq!(seen[1]["variables"]["cursor"], "r2");
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let s = session(vec![r#"{"data":{"node":null}}"#.to_string()]);
        let err = s.get_professor_by_id(42).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { parameter: "ID", .. }));
    }

    #[tokio::test]
    async fn test_get_by_name_uses_first_match() {
        let by_name = session(vec![
            search_body(
                vec![teacher_node(7, "Pat", "Lee"), teacher_node(8, "Pat", "Leeds")],
                None,
                false,
            ),
            teacher_body(teacher_node(7, "Pat", "Lee"), vec![rating_node(1, "ok")], None),
        ]);
        let by_id = session(vec![teacher_body(
            teacher_node(7, "Pat", "Lee"),
            vec![rating_node(1, "ok")],
            None,
        )]);

        // lazy: nothing is sent until the stream is polled
        drop(by_name.search_professor_stream("pat lee"));
        assert!(by_name.transport.seen().is_empty());

        assert_eq!(
            by_name.get_professor_by_name("pat lee").await.unwrap(),
            by_id.get_professor_by_id(7).await.unwrap()
        );
        let seen = by_name.transport.seen();
        assert_eq!(seen[1]["variables"]["id"], node_id(NodeKind::Teacher, 7));
    }

    #[tokio::test]
    async fn test_get_by_name_not_found() {
        let s = session(vec![search_body(vec![], None, false)]);
        let err = s.get_professor_by_name("Nobody Atall").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { parameter: "Name", .. }));
    }

    #[tokio::test]
    async fn test_school() {
        let s = session(vec![r#"{"data":{"node":{"__typename":"School","legacyId":"440","name":"Indiana University Bloomington","city":"Bloomington","state":"IN"}}}"#.to_string()]);
        let school = s.school().await.unwrap();
        assert_eq!(school.id, 440);
        assert_eq!(school.name, "Indiana University Bloomington");
    }

    #[tokio::test]
    async fn test_write_ratings_without_ratings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ratings.csv");
        let s = session(vec![teacher_body(teacher_node(5, "No", "Ratings"), vec![], None)]);

        let written = s.write_ratings_to_csv(5, Some(&path)).await.unwrap();
        assert_eq!(written, path);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "id,class,comment,date,helpful_rating,clarity_rating,difficulty_rating,would_take_again,grade,tags,is_for_online_class\n"
        );
    }

    #[tokio::test]
    async fn test_write_professors_lists_roster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("professors.csv");
        let s = session(vec![
            search_body(vec![teacher_node(1, "Ann", "Smith")], Some("p1"), false),
            search_body(
                vec![teacher_node(2, "Bob", "Jones"), teacher_node(3, "Cy", "Young")],
                None,
                false,
            ),
        ]);

        s.write_professors_to_csv(Some(&path)).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert_eq!(s.transport.seen()[0]["variables"]["query"]["text"], "");
    }

    #[tokio::test]
    async fn test_export_failure_after_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let s = session(vec![teacher_body(teacher_node(5, "A", "B"), vec![], None)]);

        let err = s
            .write_ratings_to_csv(5, Some(&blocker.join("ratings.csv")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }

    #[tokio::test]
    #[ignore] // talks to the live service
    async fn test_live_professor_by_id() {
        let s = Session::new("440").unwrap();
        let prof = s.get_professor_by_id(2255935).await.unwrap();
        assert_eq!(prof.name, "Kristi DeBoeuf");
        for rating in &prof.ratings {
            for score in [
                rating.helpful_rating,
                rating.clarity_rating,
                rating.difficulty_rating,
            ]
            .iter()
            .flatten()
            {
                assert!((1..=5).contains(&score.get()));
            }
        }
    }

    #[tokio::test]
    #[ignore] // talks to the live service
    async fn test_live_search_by_name() {
        let s = Session::new("440").unwrap();
        let found = s.search_professor("Kristi DeBoeuf").await.unwrap();
        assert!(found.iter().any(|p| p.id == 2255935));
        assert!(found.iter().all(|p| p.ratings.is_empty()));
    }

    #[tokio::test]
    #[ignore] // talks to the live service
    async fn test_live_random_name() {
        let s = Session::new("440").unwrap();
        let name = rand::random::<[u8; 10]>().encode_hex::<String>();
        assert!(s.search_professor(&name).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore] // talks to the live service
    async fn test_live_ratings_export_header() {
        let dir = tempfile::tempdir().unwrap();
        let s = Session::new("440").unwrap();
        let path = s
            .write_ratings_to_csv(2255935, Some(&dir.path().join("r.csv")))
            .await
            .unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "id,class,comment,date,helpful_rating,clarity_rating,difficulty_rating,would_take_again,grade,tags,is_for_online_class"
        );
    }
}
