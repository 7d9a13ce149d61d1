use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use nm_core::Article;

use crate::cluster::{relink, Clustering};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub pruned: usize,
}

fn add_related(article: &mut Article, ids: impl IntoIterator<Item = String>) {
    let mut related: BTreeSet<String> = article.related_ids.drain(..).collect();
    related.extend(ids.into_iter().filter(|id| *id != article.id));
    article.related_ids = related.into_iter().collect();
}

/// Folds this run's clustered articles into the prior set, keyed by id, and
/// drops everything published before `retention_cutoff`.
///
/// A known id keeps its summary and everything else it had, and only takes
/// the new cluster fields, score and a later publish time. Relations are
/// closed over the final set, so they stay symmetric after pruning.
pub fn merge(
    prior: Vec<Article>,
    clustering: Clustering,
    retention_cutoff: DateTime<Utc>,
) -> (Vec<Article>, MergeReport) {
    let mut report = MergeReport::default();
    let mut merged: BTreeMap<String, Article> =
        prior.into_iter().map(|a| (a.id.clone(), a)).collect();

    for incoming in clustering.articles {
        match merged.get_mut(&incoming.id) {
            Some(existing) => {
                existing.significance_score = incoming.significance_score;
                existing.coverage_count = existing.coverage_count.max(incoming.coverage_count);
                if incoming.published_at > existing.published_at {
                    existing.published_at = incoming.published_at;
                }
                add_related(existing, incoming.related_ids);
                report.updated += 1;
            }
            None => {
                merged.insert(incoming.id.clone(), incoming);
                report.inserted += 1;
            }
        }
    }

    for group in &clustering.groups {
        for id in group {
            if let Some(member) = merged.get_mut(id) {
                add_related(member, group.iter().cloned());
            }
        }
    }

    let before = merged.len();
    merged.retain(|_, article| article.published_at >= retention_cutoff);
    report.pruned = before - merged.len();

    let mut articles: Vec<Article> = merged.into_values().collect();
    relink(&mut articles);

    tracing::info!(
        "🧩 Merged state: {} new, {} updated, {} pruned, {} total",
        report.inserted,
        report.updated,
        report.pruned,
        articles.len()
    );
    (articles, report)
}
