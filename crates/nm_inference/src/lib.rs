use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nm_core::Error;

pub mod models;

pub use models::create_model;

/// Which backend answers summarization requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenRouter,
    /// Offline stand-in that trims the excerpt; for dry runs.
    Dummy,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> nm_core::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(Provider::OpenRouter),
            "dummy" | "offline" => Ok(Provider::Dummy),
            other => Err(Error::Config(format!(
                "Unknown summarization provider: {}. Available: openrouter, dummy",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub app_name: String,
    pub site_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::OpenRouter,
            api_key: None,
            base_url: models::openrouter::OPENROUTER_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            app_name: "News Minimalist".to_string(),
            site_url: "https://github.com/BOSSincrypto/news-minimalist".to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{Config, Provider};
    pub use nm_core::{Error, Result, SummaryRequest, Summarizer};
}
