use std::time::Duration;

use async_trait::async_trait;
use nm_core::{Error, Result};

const USER_AGENT: &str = "news-minimalist/0.1 (+feed collector)";

/// Raw transport for feed documents, kept behind a trait so collection can be
/// exercised without the network.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFeedClient {
    client: reqwest::Client,
}

impl HttpFeedClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!("{} returned {}", url, status)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
