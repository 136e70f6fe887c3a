use serde::{Deserialize, Serialize};

/// Query the upstream falls back to when the user typed nothing.
pub const DEFAULT_QUERY: &str = "tecnologia";
pub const DEFAULT_LANGUAGE: &str = "pt";
pub const DEFAULT_SORT_BY: &str = "publishedAt";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: String,
}

/// One news item as returned by the upstream API. `url` is the only field
/// guaranteed to identify an article; everything else is display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

/// User-controlled search parameters. All fields are optional; defaults are
/// applied when the query string is built, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsFilters {
    pub q: Option<String>,
    pub search_in: Option<String>,
    pub sources: Option<String>,
    pub domains: Option<String>,
    pub exclude_domains: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub language: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<u32>,
}

impl NewsFilters {
    /// Merges a partial update into this filter set. Only fields present in
    /// the patch overwrite existing values.
    pub fn merge(&mut self, patch: NewsFilters) {
        if patch.q.is_some() {
            self.q = patch.q;
        }
        if patch.search_in.is_some() {
            self.search_in = patch.search_in;
        }
        if patch.sources.is_some() {
            self.sources = patch.sources;
        }
        if patch.domains.is_some() {
            self.domains = patch.domains;
        }
        if patch.exclude_domains.is_some() {
            self.exclude_domains = patch.exclude_domains;
        }
        if patch.from.is_some() {
            self.from = patch.from;
        }
        if patch.to.is_some() {
            self.to = patch.to;
        }
        if patch.language.is_some() {
            self.language = patch.language;
        }
        if patch.sort_by.is_some() {
            self.sort_by = patch.sort_by;
        }
        if patch.page_size.is_some() {
            self.page_size = patch.page_size;
        }
    }

    pub fn effective_page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Builds the query string pairs for one page request, applying the
    /// fetch-time defaults. Unset text fields are sent as empty strings,
    /// which the upstream treats the same as absent.
    pub fn query_pairs(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.q.clone().unwrap_or_else(|| DEFAULT_QUERY.to_string())),
            ("pageSize", self.effective_page_size().to_string()),
            (
                "language",
                self.language
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            ),
            (
                "sortBy",
                self.sort_by
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SORT_BY.to_string()),
            ),
            ("page", page.to_string()),
            ("searchIn", self.search_in.clone().unwrap_or_default()),
            ("sources", self.sources.clone().unwrap_or_default()),
            ("domains", self.domains.clone().unwrap_or_default()),
            (
                "excludeDomains",
                self.exclude_domains.clone().unwrap_or_default(),
            ),
            ("from", self.from.clone().unwrap_or_default()),
            ("to", self.to.clone().unwrap_or_default()),
        ]
    }
}

/// One batch of search results plus pagination metadata. Error responses
/// from the proxy carry only the `error` field, so everything defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsPage {
    pub status: String,
    pub total_results: u32,
    pub articles: Vec<Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
