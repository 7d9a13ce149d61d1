pub mod cli;
pub mod client;
pub mod collector;
mod logging;
pub mod parse;
pub mod registry;

pub use cli::{handle_command, FeedArgs, FeedCommands};
pub use client::{FeedClient, HttpFeedClient};
pub use collector::{CollectReport, CollectorConfig, FeedCollector, FeedFailure};
pub use registry::{default_registry, FeedEndpoint, Registry};

pub mod prelude {
    pub use super::client::FeedClient;
    pub use super::collector::FeedCollector;
    pub use nm_core::{Category, Error, RawFeedItem, Result};
}
