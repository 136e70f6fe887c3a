pub mod backends;
pub mod favorites;

pub use backends::*;
pub use favorites::Favorites;

pub mod prelude {
    pub use super::backends::*;
    pub use super::favorites::Favorites;
    pub use nq_core::{Error, KeyValueStore, Result};
}
