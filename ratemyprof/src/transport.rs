use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::debug;

use crate::{
    config::Config,
    error::{Result, TransportError},
    graphql::Request,
};

/// Something that can deliver a GraphQL request and hand back the raw body.
///
/// [`HttpTransport`] talks to the real service; tests substitute canned
/// responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<String>;
}

/// A [`reqwest::Client`] preloaded with the headers the service wants.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&config.authorization).map_err(TransportError::from)?,
        );
        Ok(Self {
            client: reqwest::Client::builder()
                .cookie_store(true)
                .user_agent(config.user_agent.as_str())
                .default_headers(headers)
                .build()?,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &Request) -> Result<String> {
        debug!(operation = request.operation_name, "posting query");
        let res = self.client.post(&self.endpoint).json(request).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(res.text().await?)
    }
}
