use chrono::{DateTime, Utc};
use nm_core::{Article, Artifacts, BucketAlignment, Stats};

use crate::budget::selection_order;

/// Compact relative age for display: `<1m`, `42m`, `5h`, `3d`.
pub fn time_ago(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - published_at).num_seconds();
    if seconds < 3600 {
        let minutes = seconds / 60;
        if minutes > 0 {
            format!("{}m", minutes)
        } else {
            "<1m".to_string()
        }
    } else if seconds < 86_400 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{}d", seconds / 86_400)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub now: DateTime<Utc>,
    pub high_threshold: f64,
    pub alignment: BucketAlignment,
    pub feeds_ok: usize,
    pub feeds_failed: usize,
}

/// Produces the three artifacts from the final article set. The list is
/// ordered by score, then recency, then id; stats are recomputed from scratch.
pub fn build_artifacts(mut articles: Vec<Article>, options: BuildOptions) -> Artifacts {
    for article in &mut articles {
        article.time_ago = time_ago(article.published_at, options.now);
    }
    articles.sort_by(selection_order);

    let stats = Stats::from_articles(&articles, options.high_threshold, options.alignment, options.now)
        .with_feed_counts(options.feeds_ok, options.feeds_failed);

    tracing::info!(
        "📊 {} articles, {} high significance, {} summarized",
        stats.total_articles,
        stats.high_significance_count,
        stats.summarized_count
    );
    Artifacts::new(articles, stats)
}
