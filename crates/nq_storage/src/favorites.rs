use std::sync::Arc;

use nq_core::{Article, KeyValueStore};
use tracing::warn;

const FAVORITES_KEY: &str = "favorite-news";

/// Durable set of saved articles, keyed by article URL and kept in insertion
/// order. Persistence is best-effort: storage failures are logged and the
/// in-memory set stays authoritative.
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<Article>,
    loaded: bool,
}

impl Favorites {
    /// Creates an empty store. Call [`Favorites::load`] to pull the
    /// persisted set in; until then the store works purely in memory.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            entries: Vec::new(),
            loaded: false,
        }
    }

    /// One-shot read of the persisted set. A missing or corrupt slot counts
    /// as empty. Toggles issued before the load resolves win over the
    /// stored list: the load only ever initializes an untouched set.
    pub async fn load(&mut self) {
        if self.loaded {
            return;
        }
        let stored = match self.store.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Article>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("ignoring corrupt favorites slot: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read favorites: {}", e);
                Vec::new()
            }
        };
        self.loaded = true;
        if self.entries.is_empty() {
            self.entries = stored;
        } else {
            // The user got here first; make their toggles durable now.
            self.persist().await;
        }
    }

    /// Removes the article if one with the same URL is present, appends it
    /// otherwise. Safe to call before [`Favorites::load`] resolves.
    pub async fn toggle(&mut self, article: Article) {
        if let Some(pos) = self.entries.iter().position(|a| a.url == article.url) {
            self.entries.remove(pos);
        } else {
            self.entries.push(article);
        }
        if self.loaded {
            self.persist().await;
        }
    }

    pub fn is_favorite(&self, url: &str) -> bool {
        !url.is_empty() && self.entries.iter().any(|a| a.url == url)
    }

    pub async fn clear(&mut self) {
        self.entries.clear();
        self.persist().await;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn favorites(&self) -> &[Article] {
        &self.entries
    }

    async fn persist(&self) {
        let raw = match serde_json::to_string(&self.entries) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize favorites: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(FAVORITES_KEY, &raw).await {
            warn!("failed to persist favorites: {}", e);
        }
    }
}
