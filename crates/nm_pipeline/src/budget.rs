use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use futures::future::join_all;
use nm_core::{Article, Error, Result, SummaryRequest, Summarizer};
use tokio::sync::Semaphore;

use crate::context::SummarySettings;

/// What happened to one article during the summarization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Summarized,
    /// The model only echoed feed text; shown, but not a summary.
    Previewed,
    Failed(String),
    /// Not selected, or the budget ran out before its turn.
    Skipped,
}

#[derive(Debug, Default)]
pub struct SummaryReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub outcomes: Vec<(String, SummaryOutcome)>,
}

impl SummaryReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// A per-run allowance of external calls shared by every worker.
#[derive(Debug)]
pub struct Budget {
    remaining: AtomicUsize,
}

impl Budget {
    pub fn new(limit: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(limit),
        }
    }

    /// Takes one call from the budget; false once it is spent.
    pub fn try_take(&self) -> bool {
        self.remaining
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(AtomicOrdering::SeqCst)
    }
}

/// Highest score first, then most recent, then id.
pub fn selection_order(a: &Article, b: &Article) -> Ordering {
    b.significance_score
        .partial_cmp(&a.significance_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.published_at.cmp(&a.published_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub struct BudgetManager {
    summarizer: Arc<dyn Summarizer>,
    settings: SummarySettings,
}

impl BudgetManager {
    pub fn new(summarizer: Arc<dyn Summarizer>, settings: SummarySettings) -> Self {
        Self {
            summarizer,
            settings,
        }
    }

    /// Indices of the articles that get a call this run.
    pub fn select(&self, articles: &[Article]) -> Vec<usize> {
        let mut eligible: Vec<usize> = (0..articles.len())
            .filter(|&i| articles[i].needs_summary())
            .collect();
        eligible.sort_by(|&a, &b| selection_order(&articles[a], &articles[b]));
        eligible.truncate(self.settings.max_per_run);
        eligible
    }

    fn request(&self, article: &Article) -> SummaryRequest {
        let content = if article.excerpt.is_empty() {
            article.title.clone()
        } else {
            article.excerpt.clone()
        };
        SummaryRequest {
            title: article.title.clone(),
            content,
            model: self.settings.model.clone(),
            language: self.settings.summary_language.clone(),
        }
    }

    async fn call(
        summarizer: Arc<dyn Summarizer>,
        budget: Arc<Budget>,
        semaphore: Arc<Semaphore>,
        timeout: std::time::Duration,
        request: SummaryRequest,
    ) -> Option<Result<String>> {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => return Some(Err(Error::External(e.into()))),
        };
        if !budget.try_take() {
            return None;
        }
        tracing::debug!("🤖 Summarizing: {}", request.title);
        match tokio::time::timeout(timeout, summarizer.summarize(&request)).await {
            Ok(result) => Some(result),
            Err(_) => Some(Err(Error::Summarization(format!("timed out after {:?}", timeout)))),
        }
    }

    /// Summarizes the selected articles and leaves every other article that
    /// still lacks a generated summary in fallback. Failures stay eligible for
    /// the next run; nothing here returns an error.
    pub async fn run(&self, articles: &mut [Article]) -> SummaryReport {
        let selected = self.select(articles);
        let mut report = SummaryReport::default();

        if selected.is_empty() {
            tracing::info!("🤖 No summaries this run (budget {})", self.settings.max_per_run);
        } else {
            tracing::info!(
                "🤖 Summarizing {} articles with {} (budget {})",
                selected.len(),
                self.settings.model,
                self.settings.max_per_run
            );
        }

        let budget = Arc::new(Budget::new(self.settings.max_per_run));
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));

        let calls = selected
            .iter()
            .filter_map(|&i| {
                let article = &mut articles[i];
                article.begin_summary().then(|| {
                    let request = self.request(article);
                    let call = Self::call(
                        self.summarizer.clone(),
                        budget.clone(),
                        semaphore.clone(),
                        self.settings.timeout,
                        request,
                    );
                    async move { (i, call.await) }
                })
            })
            .collect::<Vec<_>>();

        for (i, result) in join_all(calls).await {
            let article = &mut articles[i];
            let outcome = match result {
                Some(Ok(text)) => {
                    report.attempted += 1;
                    report.succeeded += 1;
                    if self.summarizer.is_generative() {
                        article.complete_summary(text, &self.settings.summary_language);
                        SummaryOutcome::Summarized
                    } else {
                        article.show_preview(text, &self.settings.source_language);
                        SummaryOutcome::Previewed
                    }
                }
                Some(Err(e)) => {
                    report.attempted += 1;
                    tracing::warn!("⚠️ Summary failed for {}: {}", article.url, e);
                    article.fall_back(&self.settings.source_language);
                    SummaryOutcome::Failed(e.to_string())
                }
                None => {
                    article.fall_back(&self.settings.source_language);
                    SummaryOutcome::Skipped
                }
            };
            report.outcomes.push((article.id.clone(), outcome));
        }

        for article in articles.iter_mut().filter(|a| a.needs_summary()) {
            article.fall_back(&self.settings.source_language);
        }

        tracing::info!(
            "✨ Summaries: {} succeeded, {} failed, {} left on fallback",
            report.succeeded,
            report.failed(),
            articles.iter().filter(|a| !a.is_summarized()).count()
        );
        report
    }
}
