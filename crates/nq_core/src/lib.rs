pub mod error;
pub mod models;
pub mod source;
pub mod storage;

pub use error::{Error, Result};
pub use models::{Article, ArticleSource, NewsFilters, NewsPage};
pub use source::NewsSource;
pub use storage::KeyValueStore;

pub mod prelude {
    pub use crate::models::{Article, NewsFilters, NewsPage};
    pub use crate::source::NewsSource;
    pub use crate::storage::KeyValueStore;
    pub use crate::{Error, Result};
}
