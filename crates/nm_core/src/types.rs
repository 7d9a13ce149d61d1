use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::article_id;

/// Editorial section a feed (and therefore an article) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Business,
    Technology,
    Science,
    Environment,
    Health,
    Society,
    Culture,
    Sports,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Politics,
        Category::Business,
        Category::Technology,
        Category::Science,
        Category::Environment,
        Category::Health,
        Category::Society,
        Category::Culture,
        Category::Sports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Environment => "environment",
            Category::Health => "health",
            Category::Society => "society",
            Category::Culture => "culture",
            Category::Sports => "sports",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| crate::Error::Config(format!("Unknown category: {}", s)))
    }
}

/// One entry as it came out of a feed, before it has an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeedItem {
    pub title: String,
    pub link: String,
    pub source: String,
    pub category: Category,
    pub published_at: DateTime<Utc>,
    pub excerpt: String,
}

/// Where an article stands with respect to AI summarization.
///
/// `Pending` only exists while a run is talking to the summarization service;
/// persisted articles are `Unsummarized`, `Summarized` or `Fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    #[default]
    Unsummarized,
    Pending,
    Summarized,
    Fallback,
}

impl fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryStatus::Unsummarized => write!(f, "unsummarized"),
            SummaryStatus::Pending => write!(f, "pending"),
            SummaryStatus::Summarized => write!(f, "summarized"),
            SummaryStatus::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    pub published_at: DateTime<Utc>,
    pub significance_score: f64,
    pub coverage_count: u32,
    #[serde(default)]
    pub related_ids: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub summary_status: SummaryStatus,
    #[serde(default)]
    pub language: String,
    /// Display helper, rebuilt from `published_at` every time artifacts are written.
    #[serde(default, skip_deserializing)]
    pub time_ago: String,
}

impl Article {
    pub fn from_raw(raw: &RawFeedItem, source_language: &str) -> Self {
        Self {
            id: article_id(&raw.link),
            title: raw.title.clone(),
            url: raw.link.clone(),
            source: raw.source.clone(),
            category: raw.category,
            published_at: raw.published_at,
            significance_score: 0.0,
            coverage_count: 1,
            related_ids: Vec::new(),
            summary: String::new(),
            excerpt: raw.excerpt.clone(),
            summary_status: SummaryStatus::Unsummarized,
            language: source_language.to_string(),
            time_ago: String::new(),
        }
    }

    pub fn is_summarized(&self) -> bool {
        self.summary_status == SummaryStatus::Summarized
    }

    /// Anything short of a real generated summary can still compete for budget.
    pub fn needs_summary(&self) -> bool {
        matches!(
            self.summary_status,
            SummaryStatus::Unsummarized | SummaryStatus::Fallback
        )
    }

    /// Moves an eligible article to `Pending`. Returns false when the article
    /// is already summarized or in flight.
    pub fn begin_summary(&mut self) -> bool {
        if !self.needs_summary() {
            return false;
        }
        self.summary_status = SummaryStatus::Pending;
        true
    }

    pub fn complete_summary(&mut self, text: String, language: &str) {
        self.summary = text;
        self.language = language.to_string();
        self.summary_status = SummaryStatus::Summarized;
    }

    /// Shows non-generated text in place of a summary without marking the
    /// article summarized. A summarized article is left untouched.
    pub fn show_preview(&mut self, text: String, source_language: &str) {
        if self.is_summarized() {
            return;
        }
        self.summary = text;
        self.language = source_language.to_string();
        self.summary_status = SummaryStatus::Fallback;
    }

    /// Shows the feed excerpt (or the title when the feed had none) in place of
    /// a generated summary. A summarized article is left untouched.
    pub fn fall_back(&mut self, source_language: &str) {
        if self.is_summarized() {
            return;
        }
        self.summary = if self.excerpt.is_empty() {
            self.title.clone()
        } else {
            self.excerpt.clone()
        };
        self.language = source_language.to_string();
        self.summary_status = SummaryStatus::Fallback;
    }
}
