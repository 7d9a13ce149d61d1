use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::Stats;
use crate::types::Article;
use crate::{Error, Result};

/// The cross-run memory of the pipeline: whatever the previous run published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub articles: Vec<Article>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl PersistedState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Shape of `articles.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleList {
    pub articles: Vec<Article>,
}

/// The three published artifacts, always written and read as one set.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub list: ArticleList,
    pub by_id: BTreeMap<String, Article>,
    pub stats: Stats,
}

impl Artifacts {
    pub fn new(articles: Vec<Article>, stats: Stats) -> Self {
        let by_id = articles
            .iter()
            .map(|a| (a.id.clone(), a.clone()))
            .collect();
        Self {
            list: ArticleList { articles },
            by_id,
            stats,
        }
    }

    /// Checks the cross-artifact invariants: the list and the map hold exactly
    /// the same ids, ids are unique, and every related id resolves.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for article in &self.list.articles {
            if !seen.insert(article.id.as_str()) {
                return Err(Error::Consistency(format!("duplicate article id {}", article.id)));
            }
            if !self.by_id.contains_key(&article.id) {
                return Err(Error::Consistency(format!(
                    "article {} missing from id index",
                    article.id
                )));
            }
        }
        if seen.len() != self.by_id.len() {
            return Err(Error::Consistency(format!(
                "id index holds {} articles, list holds {}",
                self.by_id.len(),
                seen.len()
            )));
        }
        for article in &self.list.articles {
            if let Some(missing) = article.related_ids.iter().find(|id| !seen.contains(id.as_str())) {
                return Err(Error::Consistency(format!(
                    "article {} references unknown related id {}",
                    article.id, missing
                )));
            }
        }
        Ok(())
    }

    pub fn to_state(&self) -> PersistedState {
        PersistedState {
            articles: self.list.articles.clone(),
            last_refresh: Some(self.stats.last_refresh),
        }
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read what the last run published. An empty state is not an error.
    async fn load(&self) -> Result<PersistedState>;

    /// The artifacts as last published, for re-emission and inspection.
    async fn load_artifacts(&self) -> Result<Option<Artifacts>>;

    /// Publish a complete artifact set so readers never see a mix of two runs.
    async fn save(&self, artifacts: &Artifacts) -> Result<()>;
}
