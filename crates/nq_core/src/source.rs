use async_trait::async_trait;

use crate::models::{NewsFilters, NewsPage};
use crate::Result;

/// A paginated provider of news search results. Pages are 1-indexed; each
/// page carries the total result count so callers can decide whether more
/// pages exist.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_page(&self, filters: &NewsFilters, page: u32) -> Result<NewsPage>;
}
