pub mod config;
pub mod error;
pub mod id;
pub mod models;
pub mod stats;
pub mod storage;
pub mod types;

pub use config::{ConfigSource, Layered};
pub use error::Error;
pub use id::{article_id, normalize_url};
pub use models::{SummaryRequest, Summarizer};
pub use stats::{BucketAlignment, Histogram, Stats};
pub use storage::{Artifacts, PersistedState, StateStore};
pub use types::{Article, Category, RawFeedItem, SummaryStatus};

pub type Result<T> = std::result::Result<T, Error>;
