use async_trait::async_trait;
use nq_core::{Error, NewsFilters, NewsPage, NewsSource, Result};

/// `NewsSource` backed by the news proxy endpoint (or the upstream API
/// directly, given a URL that already carries the credential).
pub struct HttpNewsSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNewsSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl NewsSource for HttpNewsSource {
    async fn fetch_page(&self, filters: &NewsFilters, page: u32) -> Result<NewsPage> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&filters.query_pairs(page))
            .send()
            .await?;

        let status = response.status();
        let body: NewsPage = response.json().await?;
        if !status.is_success() {
            let message = body
                .error
                .unwrap_or_else(|| format!("news request failed with status {}", status));
            return Err(Error::Upstream(message));
        }
        Ok(body)
    }
}
