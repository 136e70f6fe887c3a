use std::sync::Arc;
use std::time::Duration;

use nq_core::{Article, NewsFilters, NewsPage, NewsSource, Result};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::debug;

/// Quiet period after the last filter change before a search starts.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Snapshot of the feed for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub is_loading: bool,
    pub is_fetching_next_page: bool,
    pub is_error: bool,
    pub error_message: Option<String>,
    pub has_next_page: bool,
    pub total_results: u32,
}

/// What [`NewsFeed::drive`] processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    /// The debounce window elapsed; a fresh search started at page 1.
    Settled,
    /// A page arrived and was appended to the session.
    Loaded,
    /// A fetch failed; accumulated pages are kept.
    Failed,
    /// A result for superseded filters arrived and was dropped.
    Stale,
    /// Nothing pending.
    Idle,
}

struct FetchOutcome {
    generation: u64,
    result: Result<NewsPage>,
}

enum Step {
    Settle,
    Outcome(FetchOutcome),
    Nothing,
}

/// Owns one search session: debounces filter changes, fetches pages
/// sequentially through a [`NewsSource`], and accumulates them in order.
///
/// Fetches run as spawned tasks tagged with a generation counter; a result
/// whose generation no longer matches the session is dropped on arrival, so
/// superseded filters can never leak articles into the current session.
pub struct NewsFeed {
    source: Arc<dyn NewsSource>,
    live: NewsFilters,
    session: Option<NewsFilters>,
    settle_at: Option<Instant>,
    generation: u64,
    pages: Vec<NewsPage>,
    total_results: u32,
    in_flight: bool,
    stale_in_flight: u32,
    error: Option<String>,
    tx: mpsc::UnboundedSender<FetchOutcome>,
    rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl NewsFeed {
    /// Creates a feed over `initial` filters. Nothing is fetched until one
    /// debounce window elapses, which gives the caller room to finish
    /// setting its real initial values.
    pub fn new(source: Arc<dyn NewsSource>, initial: NewsFilters) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            live: initial,
            session: None,
            settle_at: Some(Instant::now() + DEBOUNCE_WINDOW),
            generation: 0,
            pages: Vec::new(),
            total_results: 0,
            in_flight: false,
            stale_in_flight: 0,
            error: None,
            tx,
            rx,
        }
    }

    /// Merges a partial filter update and restarts the debounce window.
    /// No fetch happens here.
    pub fn set_filters(&mut self, patch: NewsFilters) {
        self.live.merge(patch);
        self.settle_at = Some(Instant::now() + DEBOUNCE_WINDOW);
    }

    /// Visibility callback from the presentation layer: when the last item
    /// of the list comes into view, request the next page.
    pub fn observe_last_item(&mut self, index: usize, total_item_count: usize) {
        if total_item_count > 0 && index + 1 == total_item_count {
            self.fetch_next_page();
        }
    }

    /// Requests the page after the last one fetched. No-op while another
    /// fetch is in flight or when the session is exhausted.
    pub fn fetch_next_page(&mut self) {
        if self.in_flight || !self.has_next_page() {
            return;
        }
        let Some(filters) = self.session.clone() else {
            return;
        };
        let page = self.pages.len() as u32 + 1;
        self.spawn_fetch(filters, page);
    }

    /// Waits for the next pending event (debounce deadline or fetch result)
    /// and applies it. Returns [`FeedEvent::Idle`] immediately when there is
    /// nothing to wait for.
    pub async fn drive(&mut self) -> FeedEvent {
        let step = if let Some(at) = self.settle_at {
            tokio::select! {
                _ = time::sleep_until(at) => Step::Settle,
                outcome = self.rx.recv() => match outcome {
                    Some(outcome) => Step::Outcome(outcome),
                    None => Step::Nothing,
                },
            }
        } else if self.in_flight || self.stale_in_flight > 0 {
            match self.rx.recv().await {
                Some(outcome) => Step::Outcome(outcome),
                None => Step::Nothing,
            }
        } else {
            Step::Nothing
        };

        match step {
            Step::Settle => {
                self.settle();
                FeedEvent::Settled
            }
            Step::Outcome(outcome) => self.apply(outcome),
            Step::Nothing => FeedEvent::Idle,
        }
    }

    /// All articles fetched for the current session, in page order.
    pub fn articles(&self) -> Vec<&Article> {
        self.pages.iter().flat_map(|p| p.articles.iter()).collect()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages.len()
    }

    pub fn has_next_page(&self) -> bool {
        if self.pages.is_empty() {
            return false;
        }
        let page_size = self
            .session
            .as_ref()
            .map(NewsFilters::effective_page_size)
            .unwrap_or(nq_core::models::DEFAULT_PAGE_SIZE)
            .max(1);
        let total_pages = self.total_results.div_ceil(page_size);
        (self.pages.len() as u32) < total_pages
    }

    pub fn state(&self) -> FeedState {
        FeedState {
            is_loading: self.in_flight && self.pages.is_empty(),
            is_fetching_next_page: self.in_flight && !self.pages.is_empty(),
            is_error: self.error.is_some(),
            error_message: self.error.clone(),
            has_next_page: self.has_next_page(),
            total_results: self.total_results,
        }
    }

    /// The live filters settle into a new session: accumulated pages are
    /// discarded and page 1 is requested. Anything still in flight belongs
    /// to the previous generation and will be dropped on arrival.
    fn settle(&mut self) {
        self.settle_at = None;
        self.generation += 1;
        let filters = self.live.clone();
        self.session = Some(filters.clone());
        self.pages.clear();
        self.total_results = 0;
        self.error = None;
        if self.in_flight {
            self.stale_in_flight += 1;
            self.in_flight = false;
        }
        self.spawn_fetch(filters, 1);
    }

    fn spawn_fetch(&mut self, filters: NewsFilters, page: u32) {
        self.in_flight = true;
        let source = self.source.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = source.fetch_page(&filters, page).await;
            let _ = tx.send(FetchOutcome { generation, result });
        });
    }

    fn apply(&mut self, outcome: FetchOutcome) -> FeedEvent {
        if outcome.generation != self.generation {
            debug!("dropping result from superseded filters");
            self.stale_in_flight = self.stale_in_flight.saturating_sub(1);
            return FeedEvent::Stale;
        }
        self.in_flight = false;
        match outcome.result {
            Ok(page) => {
                self.total_results = page.total_results;
                self.error = None;
                self.pages.push(page);
                FeedEvent::Loaded
            }
            Err(e) => {
                self.error = Some(e.to_string());
                FeedEvent::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nq_core::{ArticleSource, Error};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn article(url: &str) -> Article {
        Article {
            source: ArticleSource {
                id: None,
                name: "Example".to_string(),
            },
            author: None,
            title: format!("Article at {}", url),
            description: None,
            url: url.to_string(),
            url_to_image: None,
            published_at: Some("2024-05-01T12:00:00Z".to_string()),
            content: None,
        }
    }

    fn page(total_results: u32, count: usize, offset: usize) -> NewsPage {
        NewsPage {
            status: "ok".to_string(),
            total_results,
            articles: (0..count)
                .map(|i| article(&format!("https://example.com/{}", offset + i)))
                .collect(),
            error: None,
        }
    }

    fn ok(delay_ms: u64, page: NewsPage) -> (Duration, Result<NewsPage>) {
        (Duration::from_millis(delay_ms), Ok(page))
    }

    fn err(delay_ms: u64, message: &str) -> (Duration, Result<NewsPage>) {
        (
            Duration::from_millis(delay_ms),
            Err(Error::Upstream(message.to_string())),
        )
    }

    struct ScriptedSource {
        requests: Mutex<Vec<(NewsFilters, u32)>>,
        responses: Mutex<VecDeque<(Duration, Result<NewsPage>)>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<(Duration, Result<NewsPage>)>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> (NewsFilters, u32) {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl NewsSource for ScriptedSource {
        async fn fetch_page(&self, filters: &NewsFilters, page: u32) -> Result<NewsPage> {
            let (delay, result) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("fetch_page called more often than scripted");
            self.requests.lock().unwrap().push((filters.clone(), page));
            if !delay.is_zero() {
                time::sleep(delay).await;
            }
            result
        }
    }

    fn with_q(q: &str) -> NewsFilters {
        NewsFilters {
            q: Some(q.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_waits_one_debounce_window() {
        let source = ScriptedSource::new(vec![ok(0, page(5, 5, 0))]);
        let started = Instant::now();
        let mut feed = NewsFeed::new(source.clone(), NewsFilters::default());

        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert!(started.elapsed() >= DEBOUNCE_WINDOW);
        assert!(feed.state().is_loading);

        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert_eq!(source.request_count(), 1);
        assert_eq!(feed.articles().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_filter_changes_coalesce_into_one_fetch() {
        let source = ScriptedSource::new(vec![ok(0, page(5, 5, 0))]);
        let started = Instant::now();
        let mut feed = NewsFeed::new(source.clone(), NewsFilters::default());

        feed.set_filters(with_q("b"));
        for q in ["br", "bra", "brasil"] {
            time::advance(Duration::from_millis(100)).await;
            feed.set_filters(with_q(q));
        }
        // Last change was at t=300ms, so nothing may fire before t=800ms.
        time::advance(Duration::from_millis(499)).await;
        assert_eq!(source.request_count(), 0);

        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert!(started.elapsed() >= Duration::from_millis(800));
        assert_eq!(feed.drive().await, FeedEvent::Loaded);

        assert_eq!(source.request_count(), 1);
        let (filters, page_no) = source.last_request();
        assert_eq!(filters.q.as_deref(), Some("brasil"));
        assert_eq!(page_no, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn has_next_page_follows_the_page_math() {
        // totalResults=95 at the default page size of 20 means 5 pages.
        let source = ScriptedSource::new(vec![
            ok(0, page(95, 20, 0)),
            ok(0, page(95, 20, 20)),
            ok(0, page(95, 20, 40)),
            ok(0, page(95, 20, 60)),
            ok(0, page(95, 15, 80)),
        ]);
        let mut feed = NewsFeed::new(source.clone(), NewsFilters::default());

        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);

        for _ in 2..=5 {
            assert!(feed.has_next_page());
            feed.fetch_next_page();
            assert_eq!(feed.drive().await, FeedEvent::Loaded);
        }
        assert!(!feed.has_next_page());
        assert_eq!(feed.articles().len(), 95);
        assert_eq!(feed.state().total_results, 95);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_next_page_requests_fetch_once() {
        let source = ScriptedSource::new(vec![
            ok(0, page(40, 20, 0)),
            ok(50, page(40, 20, 20)),
        ]);
        let mut feed = NewsFeed::new(source.clone(), NewsFilters::default());
        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);

        feed.fetch_next_page();
        feed.fetch_next_page();
        assert_eq!(feed.drive().await, FeedEvent::Loaded);

        assert_eq!(source.request_count(), 2);
        assert_eq!(feed.articles().len(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn results_for_superseded_filters_are_dropped() {
        let source = ScriptedSource::new(vec![
            // The first session's page is slow and lands long after the
            // filters changed underneath it.
            ok(10_000, page(1, 1, 0)),
            ok(0, page(1, 1, 100)),
        ]);
        let mut feed = NewsFeed::new(source.clone(), with_q("old"));

        assert_eq!(feed.drive().await, FeedEvent::Settled);
        feed.set_filters(with_q("new"));
        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);

        // The slow first fetch finally resolves and must be dropped.
        assert_eq!(feed.drive().await, FeedEvent::Stale);

        let urls: Vec<&str> = feed.articles().iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/100"]);
        assert_eq!(feed.state().total_results, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_change_discards_accumulated_pages() {
        let source = ScriptedSource::new(vec![
            ok(0, page(5, 5, 0)),
            ok(0, page(3, 3, 50)),
        ]);
        let mut feed = NewsFeed::new(source.clone(), with_q("old"));
        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert_eq!(feed.articles().len(), 5);

        feed.set_filters(with_q("new"));
        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert!(feed.articles().is_empty());
        assert_eq!(feed.state().total_results, 0);

        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert_eq!(feed.articles().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn infinite_scroll_drives_the_scenario() {
        let filters = NewsFilters {
            q: Some("brasil".to_string()),
            page_size: Some(10),
            ..Default::default()
        };
        let source = ScriptedSource::new(vec![
            ok(0, page(25, 10, 0)),
            ok(0, page(25, 10, 10)),
            ok(0, page(25, 5, 20)),
        ]);
        let mut feed = NewsFeed::new(source.clone(), filters);

        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert_eq!(feed.articles().len(), 10);
        assert!(feed.has_next_page());

        // A mid-list item coming into view must not fetch anything.
        feed.observe_last_item(5, 10);
        assert!(!feed.state().is_fetching_next_page);

        feed.observe_last_item(9, 10);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert_eq!(feed.articles().len(), 20);
        assert!(feed.has_next_page());

        feed.observe_last_item(19, 20);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert_eq!(feed.articles().len(), 25);
        assert!(!feed.has_next_page());

        // The session is exhausted; observing the last item is a no-op.
        feed.observe_last_item(24, 25);
        assert_eq!(feed.drive().await, FeedEvent::Idle);
        assert_eq!(source.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_page_keeps_earlier_pages_and_retry_clears_it() {
        let source = ScriptedSource::new(vec![
            ok(0, page(40, 20, 0)),
            err(0, "rate limited"),
            ok(0, page(40, 20, 20)),
        ]);
        let mut feed = NewsFeed::new(source.clone(), NewsFilters::default());
        assert_eq!(feed.drive().await, FeedEvent::Settled);
        assert_eq!(feed.drive().await, FeedEvent::Loaded);

        feed.fetch_next_page();
        assert_eq!(feed.drive().await, FeedEvent::Failed);

        let state = feed.state();
        assert!(state.is_error);
        assert!(state.error_message.unwrap().contains("rate limited"));
        assert_eq!(feed.articles().len(), 20);
        assert!(feed.has_next_page());

        // Manual retry.
        feed.fetch_next_page();
        assert_eq!(feed.drive().await, FeedEvent::Loaded);
        assert!(!feed.state().is_error);
        assert_eq!(feed.articles().len(), 40);
    }
}
