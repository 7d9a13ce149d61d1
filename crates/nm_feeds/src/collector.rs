use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use nm_core::{Error, RawFeedItem, Result};
use tokio::sync::Semaphore;

use crate::client::FeedClient;
use crate::logging::Logger;
use crate::parse::parse_feed;
use crate::registry::{FeedEndpoint, Registry};

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub concurrency: usize,
    pub timeout: Duration,
    pub max_entries: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(10),
            max_entries: 20,
        }
    }
}

/// A feed that produced nothing this run, and why.
#[derive(Debug, Clone)]
pub struct FeedFailure {
    pub url: String,
    pub source: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct CollectReport {
    pub items: Vec<RawFeedItem>,
    pub feeds_ok: usize,
    pub failures: Vec<FeedFailure>,
}

impl CollectReport {
    pub fn feeds_failed(&self) -> usize {
        self.failures.len()
    }
}

pub struct FeedCollector {
    client: Arc<dyn FeedClient>,
    registry: Registry,
    config: CollectorConfig,
    semaphore: Arc<Semaphore>,
}

impl FeedCollector {
    pub fn new(client: Arc<dyn FeedClient>, registry: Registry, config: CollectorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            client,
            registry,
            config,
            semaphore,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Fetches and parses one endpoint. Every failure, including the timeout,
    /// comes back as an `Err` for the caller to record.
    pub async fn fetch_endpoint(
        &self,
        endpoint: &FeedEndpoint,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<RawFeedItem>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::External(e.into()))?;

        let bytes = tokio::time::timeout(self.config.timeout, self.client.fetch(&endpoint.url))
            .await
            .map_err(|_| {
                Error::Feed(format!(
                    "timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })??;

        parse_feed(&bytes, endpoint, fetched_at, self.config.max_entries)
    }

    /// Polls every registry endpoint concurrently and gathers the results in
    /// registry order. A dead feed only costs its own items.
    pub async fn collect(&self, fetched_at: DateTime<Utc>) -> CollectReport {
        self.collect_from(self.registry.endpoints(), fetched_at).await
    }

    pub async fn collect_from(
        &self,
        endpoints: &[FeedEndpoint],
        fetched_at: DateTime<Utc>,
    ) -> CollectReport {
        tracing::info!("📰 Fetching {} feeds", endpoints.len());

        let fetches = endpoints.iter().map(|endpoint| async move {
            let result = self.fetch_endpoint(endpoint, fetched_at).await;
            (endpoint, result)
        });

        let mut report = CollectReport::default();
        for (endpoint, result) in join_all(fetches).await {
            let logger = Logger::new()
                .with_prefix(endpoint.category.as_str())
                .with_prefix(endpoint.source.as_str());
            match result {
                Ok(items) => {
                    logger.debug(&format!("✨ {} items from {}", items.len(), endpoint.url));
                    report.feeds_ok += 1;
                    report.items.extend(items);
                }
                Err(e) => {
                    logger.warn(&format!("⚠️ Failed to fetch {}: {}", endpoint.url, e));
                    report.failures.push(FeedFailure {
                        url: endpoint.url.clone(),
                        source: endpoint.source.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "📰 Collected {} items ({} feeds ok, {} failed)",
            report.items.len(),
            report.feeds_ok,
            report.feeds_failed()
        );
        report
    }
}
