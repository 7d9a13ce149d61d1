use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use nm_core::{Article, PersistedState, Result, StateStore, Summarizer};
use nm_feeds::FeedCollector;

use crate::artifacts::{build_artifacts, BuildOptions};
use crate::budget::BudgetManager;
use crate::cluster::ClusterEngine;
use crate::context::RunContext;
use crate::merge::merge;
use crate::score::Scorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// The prior state could not be read; fresh artifacts were written.
    ColdStart,
    /// Nothing was collected; the prior artifacts were left in place.
    NoItems,
}

impl RunStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::NoItems => 2,
            RunStatus::ColdStart => 3,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::ColdStart => write!(f, "cold start"),
            RunStatus::NoItems => write!(f, "no items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub collected_items: usize,
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub summaries_attempted: usize,
    pub summaries_succeeded: usize,
    pub articles_total: usize,
}

/// One batch pass: load, collect, cluster, score, merge, summarize, publish.
pub struct Pipeline {
    collector: FeedCollector,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn StateStore>,
}

impl Pipeline {
    pub fn new(collector: FeedCollector, summarizer: Arc<dyn Summarizer>, store: Arc<dyn StateStore>) -> Self {
        Self {
            collector,
            summarizer,
            store,
        }
    }

    /// Reads the prior state. Anything unreadable is reported loudly and
    /// treated as absent rather than merged against.
    async fn load_prior(&self) -> (PersistedState, bool) {
        match self.store.load().await {
            Ok(state) => {
                tracing::info!("💾 Loaded {} prior articles", state.articles.len());
                (state, false)
            }
            Err(e) => {
                tracing::error!("❌ Prior state is unreadable, starting cold: {}", e);
                (PersistedState::empty(), true)
            }
        }
    }

    /// Runs the pipeline once. Only publishing can fail the run; feed and
    /// summarization problems are absorbed and show up in the outcome.
    pub async fn run(&self, ctx: &RunContext) -> Result<RunOutcome> {
        let settings = &ctx.settings;
        let (prior, cold_start) = self.load_prior().await;

        let report = self.collector.collect(ctx.now).await;
        let mut outcome = RunOutcome {
            status: if cold_start { RunStatus::ColdStart } else { RunStatus::Completed },
            collected_items: report.items.len(),
            feeds_ok: report.feeds_ok,
            feeds_failed: report.feeds_failed(),
            summaries_attempted: 0,
            summaries_succeeded: 0,
            articles_total: prior.articles.len(),
        };

        if report.items.is_empty() {
            tracing::error!(
                "❌ No items collected from {} feeds; keeping the previous artifacts",
                report.feeds_failed()
            );
            outcome.status = RunStatus::NoItems;
            return Ok(outcome);
        }

        let scorer = Scorer::new(settings.tables.clone());
        let mut seen = HashSet::new();
        let incoming: Vec<Article> = report
            .items
            .into_iter()
            .map(|mut item| {
                scorer.categorize(&mut item);
                Article::from_raw(&item, &settings.summary.source_language)
            })
            .filter(|article| seen.insert(article.id.clone()))
            .collect();

        let engine = ClusterEngine::new(settings.cluster.clone(), ctx.now);
        let mut clustering = engine.cluster(&prior.articles, incoming);
        for article in &mut clustering.articles {
            article.significance_score = scorer.score(article);
        }

        let (mut articles, _) = merge(prior.articles, clustering, ctx.retention_cutoff());

        let budget = BudgetManager::new(self.summarizer.clone(), settings.summary.clone());
        let summaries = budget.run(&mut articles).await;
        outcome.summaries_attempted = summaries.attempted;
        outcome.summaries_succeeded = summaries.succeeded;

        let artifacts = build_artifacts(
            articles,
            BuildOptions {
                now: ctx.now,
                high_threshold: settings.high_threshold,
                alignment: settings.alignment,
                feeds_ok: outcome.feeds_ok,
                feeds_failed: outcome.feeds_failed,
            },
        );
        self.store.save(&artifacts).await?;

        outcome.articles_total = artifacts.stats.total_articles;
        tracing::info!("✅ Run {}: {} articles published", outcome.status, outcome.articles_total);
        Ok(outcome)
    }
}
