/// Settings shared by every request a [`crate::Session`] makes.
#[derive(Clone, Debug)]
pub struct Config {
    /// GraphQL endpoint the queries are posted to.
    pub endpoint: String,
    /// Value of the `Authorization` header. The public site sends `test:test`.
    pub authorization: String,
    pub user_agent: String,
    /// Results requested per page, for professors and ratings alike.
    pub page_size: u32,
    /// Stop paging after this many pages. `None` pages to the end.
    pub max_pages: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "https://www.ratemyprofessors.com/graphql".to_string(),
            authorization: "Basic dGVzdDp0ZXN0".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            page_size: 20,
            max_pages: None,
        }
    }
}

impl Config {
    /// Whether another page may be requested after `pages_fetched` pages.
    pub(crate) fn allows_page(&self, pages_fetched: usize) -> bool {
        self.max_pages.map_or(true, |max| pages_fetched < max)
    }
}
