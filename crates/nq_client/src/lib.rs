pub mod feed;
pub mod http;

pub use feed::{FeedEvent, FeedState, NewsFeed};
pub use http::HttpNewsSource;

pub mod prelude {
    pub use crate::feed::{FeedEvent, FeedState, NewsFeed};
    pub use crate::http::HttpNewsSource;
    pub use nq_core::{Article, Error, NewsFilters, NewsPage, NewsSource, Result};
}
