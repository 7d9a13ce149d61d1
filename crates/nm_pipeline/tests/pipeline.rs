use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use nm_core::{
    Article, Artifacts, BucketAlignment, Category, Error, RawFeedItem, Result, Stats, StateStore,
    SummaryRequest, SummaryStatus, Summarizer,
};
use nm_feeds::{CollectorConfig, FeedClient, FeedCollector, FeedEndpoint, Registry};
use nm_pipeline::{Pipeline, RunContext, RunStatus, Settings};
use nm_storage::{JsonDirStore, MemoryStore};
use tempfile::TempDir;

#[derive(Clone)]
enum Reply {
    Body(String),
    Hang,
    Fail,
}

struct StubClient {
    replies: HashMap<String, Reply>,
}

#[async_trait]
impl FeedClient for StubClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        match self.replies.get(url) {
            Some(Reply::Body(body)) => Ok(body.clone().into_bytes()),
            Some(Reply::Hang) => {
                tokio::time::sleep(StdDuration::from_secs(60)).await;
                Ok(Vec::new())
            }
            Some(Reply::Fail) | None => Err(Error::Feed("connection refused".to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct CountingSummarizer {
    calls: AtomicUsize,
    failing: Mutex<HashSet<String>>,
}

impl CountingSummarizer {
    fn failing_on(titles: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: Mutex::new(titles.iter().map(|t| t.to_string()).collect()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    fn name(&self) -> &str {
        "counting"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&request.title) {
            return Err(Error::Summarization("HTTP 502".to_string()));
        }
        Ok(format!("Сводка: {}", request.title))
    }
}

struct Item<'a> {
    title: &'a str,
    link: &'a str,
    age_hours: i64,
}

fn item<'a>(title: &'a str, link: &'a str, age_hours: i64) -> Item<'a> {
    Item { title, link, age_hours }
}

fn rss(items: &[Item], now: DateTime<Utc>) -> String {
    let entries: String = items
        .iter()
        .map(|i| {
            format!(
                "<item><title>{}</title><link>{}</link><description>About {}</description><pubDate>{}</pubDate></item>",
                i.title,
                i.link,
                i.title,
                (now - Duration::hours(i.age_hours)).to_rfc2822()
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Feed</title><link>https://example.com</link><description>d</description>{}</channel></rss>"#,
        entries
    )
}

/// One feed per (source, reply), all filed under politics.
fn collector(feeds: Vec<(&str, Reply)>) -> FeedCollector {
    let endpoints = feeds
        .iter()
        .map(|(source, _)| FeedEndpoint::new(Category::Politics, source, &format!("https://{}/rss", source)))
        .collect();
    let replies = feeds
        .into_iter()
        .map(|(source, reply)| (format!("https://{}/rss", source), reply))
        .collect();
    FeedCollector::new(
        Arc::new(StubClient { replies }),
        Registry::new(endpoints),
        CollectorConfig {
            timeout: StdDuration::from_millis(200),
            ..CollectorConfig::default()
        },
    )
}

fn context(now: DateTime<Utc>, max_summaries: usize) -> RunContext {
    let mut settings = Settings::default();
    settings.summary.max_per_run = max_summaries;
    RunContext::new(now, settings)
}

async fn published(store: &MemoryStore) -> Artifacts {
    store.current().await.expect("artifacts were published")
}

fn by_url<'a>(artifacts: &'a Artifacts, url: &str) -> &'a Article {
    artifacts
        .list
        .articles
        .iter()
        .find(|a| a.url == url)
        .unwrap_or_else(|| panic!("{} not published", url))
}

fn assert_cluster_invariants(artifacts: &Artifacts) {
    for a in &artifacts.list.articles {
        assert!((0.0..=10.0).contains(&a.significance_score));
        let mut sources: HashSet<&str> = HashSet::from([a.source.as_str()]);
        for id in &a.related_ids {
            let b = &artifacts.by_id[id];
            assert!(b.related_ids.contains(&a.id), "related ids must be symmetric");
            assert_eq!(a.coverage_count, b.coverage_count);
            sources.insert(b.source.as_str());
        }
        assert_eq!(a.coverage_count as usize, sources.len());
    }
    assert!(artifacts.verify().is_ok());
}

#[tokio::test]
async fn test_paraphrased_reports_form_one_story() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        collector(vec![
            ("x.com", Reply::Body(rss(&[item("Prime Minister resigns amid scandal", "https://x.com/pm", 2)], now))),
            ("y.com", Reply::Body(rss(&[item("PM steps down after scandal", "https://y.com/pm", 1)], now))),
        ]),
        Arc::new(CountingSummarizer::default()),
        store.clone(),
    );

    let outcome = pipeline.run(&context(now, 10)).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);

    let artifacts = published(&store).await;
    let x = by_url(&artifacts, "https://x.com/pm");
    let y = by_url(&artifacts, "https://y.com/pm");
    assert_eq!(x.coverage_count, 2);
    assert_eq!(x.related_ids, vec![y.id.clone()]);
    assert_eq!(artifacts.by_id[&x.related_ids[0]].url, "https://y.com/pm");
    assert_cluster_invariants(&artifacts);
}

#[tokio::test]
async fn test_dead_feed_only_costs_its_own_items() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        collector(vec![
            ("a.com", Reply::Body(rss(&[item("Storm hits coast", "https://a.com/1", 1), item("Bridge reopens", "https://a.com/2", 3)], now))),
            ("slow.com", Reply::Hang),
            ("down.com", Reply::Fail),
            ("b.com", Reply::Body(rss(&[item("Orchestra tours Asia", "https://b.com/1", 2)], now))),
        ]),
        Arc::new(CountingSummarizer::default()),
        store.clone(),
    );

    let outcome = pipeline.run(&context(now, 0)).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.feeds_ok, 2);
    assert_eq!(outcome.feeds_failed, 2);

    let artifacts = published(&store).await;
    assert_eq!(artifacts.stats.total_articles, 3);
    assert_eq!(artifacts.stats.feeds_failed, 2);
}

#[tokio::test]
async fn test_credible_outlet_outranks_unknown_outlet() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        collector(vec![
            ("reuters.com", Reply::Body(rss(&[item("War erupts along border", "https://reuters.com/w", 1)], now))),
            ("blog.example", Reply::Body(rss(&[item("War erupts along border", "https://blog.example/w", 1)], now))),
        ]),
        Arc::new(CountingSummarizer::default()),
        store.clone(),
    );
    pipeline.run(&context(now, 0)).await.unwrap();

    let artifacts = published(&store).await;
    let listed = by_url(&artifacts, "https://reuters.com/w");
    let unlisted = by_url(&artifacts, "https://blog.example/w");
    assert!(listed.significance_score > unlisted.significance_score);
}

#[tokio::test]
async fn test_zero_budget_means_no_calls_and_all_fallback() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let summarizer = Arc::new(CountingSummarizer::default());
    let pipeline = Pipeline::new(
        collector(vec![(
            "a.com",
            Reply::Body(rss(&[item("Storm hits coast", "https://a.com/1", 1), item("Election called", "https://a.com/2", 2)], now)),
        )]),
        summarizer.clone(),
        store.clone(),
    );

    let outcome = pipeline.run(&context(now, 0)).await.unwrap();
    assert_eq!(summarizer.calls(), 0);
    assert_eq!(outcome.summaries_attempted, 0);
    let artifacts = published(&store).await;
    assert!(artifacts
        .list
        .articles
        .iter()
        .all(|a| a.summary_status == SummaryStatus::Fallback && !a.summary.is_empty()));
}

#[tokio::test]
async fn test_budget_bounds_calls_per_run() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let summarizer = Arc::new(CountingSummarizer::default());
    let titles = [
        "Storm hits coast",
        "Election called early",
        "Vaccine trial succeeds",
        "Markets tumble overnight",
        "Bridge reopens downtown",
        "Orchestra tours Asia",
        "Rover lands on Mars",
        "Striker signs record deal",
    ];
    let links: Vec<String> = (0..titles.len()).map(|i| format!("https://a.com/{}", i)).collect();
    let items: Vec<Item> = titles.iter().zip(&links).map(|(t, l)| item(t, l, 1)).collect();
    let pipeline = Pipeline::new(
        collector(vec![("a.com", Reply::Body(rss(&items, now)))]),
        summarizer.clone(),
        store.clone(),
    );

    let outcome = pipeline.run(&context(now, 3)).await.unwrap();
    assert!(summarizer.calls() <= 3);
    assert_eq!(outcome.summaries_succeeded, 3);
    assert_eq!(published(&store).await.stats.summarized_count, 3);
}

#[tokio::test]
async fn test_expired_articles_are_pruned_without_new_reports() {
    let now = Utc::now();
    let old = Article::from_raw(
        &RawFeedItem {
            title: "Ancient history".to_string(),
            link: "https://old.com/1".to_string(),
            source: "old.com".to_string(),
            category: Category::Culture,
            published_at: now - Duration::days(8),
            excerpt: String::new(),
        },
        "English",
    );
    let prior = vec![old.clone()];
    let stats = Stats::from_articles(&prior, 5.5, BucketAlignment::Floor, now - Duration::days(1));
    let store = Arc::new(MemoryStore::with_artifacts(Artifacts::new(prior, stats)));

    let pipeline = Pipeline::new(
        collector(vec![("a.com", Reply::Body(rss(&[item("Fresh news", "https://a.com/1", 1)], now)))]),
        Arc::new(CountingSummarizer::default()),
        store.clone(),
    );
    pipeline.run(&context(now, 0)).await.unwrap();

    let artifacts = published(&store).await;
    assert!(!artifacts.by_id.contains_key(&old.id));
    assert_eq!(artifacts.list.articles.len(), 1);
}

#[tokio::test]
async fn test_rerun_on_same_snapshot_is_idempotent() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let feeds = || {
        collector(vec![
            ("x.com", Reply::Body(rss(&[item("Prime Minister resigns amid scandal", "https://x.com/pm", 2), item("Markets rally", "https://x.com/m", 3)], now))),
            ("y.com", Reply::Body(rss(&[item("PM steps down after scandal", "https://y.com/pm?utm_source=rss", 1)], now))),
        ])
    };

    Pipeline::new(feeds(), Arc::new(CountingSummarizer::default()), store.clone())
        .run(&context(now, 10))
        .await
        .unwrap();
    let first = published(&store).await;

    Pipeline::new(feeds(), Arc::new(CountingSummarizer::default()), store.clone())
        .run(&context(now, 10))
        .await
        .unwrap();
    let second = published(&store).await;

    let ids = |a: &Artifacts| a.by_id.keys().cloned().collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(
        serde_json::to_string(&first.stats.histogram).unwrap(),
        serde_json::to_string(&second.stats.histogram).unwrap()
    );
    assert_cluster_invariants(&second);
}

#[tokio::test]
async fn test_failed_summary_is_retried_next_run() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let feeds = || collector(vec![("a.com", Reply::Body(rss(&[item("Vaccine approved", "https://a.com/v", 1)], now)))]);

    let flaky = Arc::new(CountingSummarizer::failing_on(&["Vaccine approved"]));
    let outcome = Pipeline::new(feeds(), flaky.clone(), store.clone())
        .run(&context(now, 5))
        .await
        .unwrap();
    assert_eq!(outcome.summaries_attempted, 1);
    assert_eq!(outcome.summaries_succeeded, 0);
    let article = by_url(&published(&store).await, "https://a.com/v").clone();
    assert_eq!(article.summary_status, SummaryStatus::Fallback);

    let healthy = Arc::new(CountingSummarizer::default());
    Pipeline::new(feeds(), healthy.clone(), store.clone())
        .run(&context(now + Duration::minutes(30), 5))
        .await
        .unwrap();
    assert_eq!(healthy.calls(), 1);
    let article = by_url(&published(&store).await, "https://a.com/v").clone();
    assert_eq!(article.summary_status, SummaryStatus::Summarized);
    assert_eq!(article.language, "Russian");

    // a third run must not spend budget on it again
    let third = Arc::new(CountingSummarizer::default());
    Pipeline::new(feeds(), third.clone(), store.clone())
        .run(&context(now + Duration::minutes(60), 5))
        .await
        .unwrap();
    assert_eq!(third.calls(), 0);
    assert!(by_url(&published(&store).await, "https://a.com/v").is_summarized());
}

#[tokio::test]
async fn test_zero_items_keeps_previous_artifacts() {
    let now = Utc::now();
    let prior = vec![Article::from_raw(
        &RawFeedItem {
            title: "Yesterday's story".to_string(),
            link: "https://a.com/y".to_string(),
            source: "a.com".to_string(),
            category: Category::Society,
            published_at: now - Duration::days(1),
            excerpt: String::new(),
        },
        "English",
    )];
    let stats = Stats::from_articles(&prior, 5.5, BucketAlignment::Floor, now - Duration::hours(1));
    let before = Artifacts::new(prior, stats);
    let store = Arc::new(MemoryStore::with_artifacts(before.clone()));

    let pipeline = Pipeline::new(
        collector(vec![("a.com", Reply::Fail), ("b.com", Reply::Hang)]),
        Arc::new(CountingSummarizer::default()),
        store.clone(),
    );
    let outcome = pipeline.run(&context(now, 5)).await.unwrap();

    assert_eq!(outcome.status, RunStatus::NoItems);
    assert_eq!(outcome.status.exit_code(), 2);
    assert_eq!(outcome.articles_total, 1);
    assert_eq!(store.save_count(), 0);
    assert_eq!(published(&store).await, before);
}

#[tokio::test]
async fn test_corrupt_prior_state_starts_cold() {
    let now = Utc::now();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonDirStore::new(dir.path()));
    let feeds = || collector(vec![("a.com", Reply::Body(rss(&[item("Storm hits coast", "https://a.com/1", 1)], now)))]);

    Pipeline::new(feeds(), Arc::new(CountingSummarizer::default()), store.clone())
        .run(&context(now, 0))
        .await
        .unwrap();
    std::fs::write(store.current_dir().join("articles.json"), "{\"articles\": [").unwrap();

    let outcome = Pipeline::new(feeds(), Arc::new(CountingSummarizer::default()), store.clone())
        .run(&context(now + Duration::minutes(30), 0))
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::ColdStart);
    assert_eq!(outcome.status.exit_code(), 3);

    let reloaded = store.load_artifacts().await.unwrap().unwrap();
    assert_eq!(reloaded.list.articles.len(), 1);
}
