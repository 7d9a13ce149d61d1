use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use nm_core::{BucketAlignment, ConfigSource, Layered};

use crate::normalize::SimilarityMetric;
use crate::tables::ScoringTables;

pub const DEFAULT_MODEL: &str = "qwen/qwen3-235b-a22b-2507";
pub const DEFAULT_MAX_SUMMARIES: usize = 20;

/// Phrase aliases applied to title tokens before comparison, so different
/// wordings of the same fact reduce to the same token.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("prime minister", "primeminister"),
    ("pm", "primeminister"),
    ("premier", "primeminister"),
    ("steps down", "resign"),
    ("step down", "resign"),
    ("stepped down", "resign"),
    ("stepping down", "resign"),
    ("resigns", "resign"),
    ("resigned", "resign"),
    ("resignation", "resign"),
    ("quits", "resign"),
    ("quit", "resign"),
    ("united states", "us"),
    ("u s", "us"),
    ("e u", "eu"),
    ("usa", "us"),
    ("united kingdom", "uk"),
    ("britain", "uk"),
    ("european union", "eu"),
    ("united nations", "un"),
    ("artificial intelligence", "ai"),
    ("kills", "kill"),
    ("killed", "kill"),
    ("dies", "die"),
    ("dead", "die"),
];

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "amid", "after", "before", "over", "as", "is", "are", "was", "were", "be", "from", "into",
    "up", "its", "it", "this", "that", "says", "say", "said", "new",
];

#[derive(Debug, Clone)]
pub struct ClusterSettings {
    pub threshold: f64,
    pub metric: SimilarityMetric,
    /// Persisted articles older than this are not considered as matches.
    pub candidate_window: Duration,
    pub aliases: Vec<(String, String)>,
    pub stopwords: Vec<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            metric: SimilarityMetric::Jaccard,
            candidate_window: Duration::hours(48),
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarySettings {
    pub model: String,
    pub max_per_run: usize,
    pub concurrency: usize,
    pub timeout: StdDuration,
    pub summary_language: String,
    pub source_language: String,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_per_run: DEFAULT_MAX_SUMMARIES,
            concurrency: 4,
            timeout: StdDuration::from_secs(30),
            summary_language: "Russian".to_string(),
            source_language: "English".to_string(),
        }
    }
}

/// Build-time tuning for one pipeline run. Everything here has a default and
/// may be overridden from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub retention: Duration,
    pub high_threshold: f64,
    pub alignment: BucketAlignment,
    pub cluster: ClusterSettings,
    pub summary: SummarySettings,
    pub tables: ScoringTables,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retention: Duration::days(7),
            high_threshold: 5.5,
            alignment: BucketAlignment::Floor,
            cluster: ClusterSettings::default(),
            summary: SummarySettings::default(),
            tables: ScoringTables::default(),
        }
    }
}

/// The two settings a scheduler may override per run, still layered.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub model: Layered<String>,
    pub max_summaries: Layered<usize>,
}

impl Default for RunInputs {
    fn default() -> Self {
        Self {
            model: Layered::new(DEFAULT_MODEL.to_string()),
            max_summaries: Layered::new(DEFAULT_MAX_SUMMARIES),
        }
    }
}

/// Immutable view of everything one run needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub now: DateTime<Utc>,
    pub settings: Settings,
}

impl RunContext {
    pub fn new(now: DateTime<Utc>, settings: Settings) -> Self {
        Self { now, settings }
    }

    /// Resolves the layered run inputs into the settings and reports where
    /// each value came from.
    pub fn resolve(now: DateTime<Utc>, mut settings: Settings, inputs: RunInputs) -> Self {
        let (model, model_source) = inputs.model.resolve();
        let (max, max_source) = inputs.max_summaries.resolve();
        log_resolved("summarization model", &model, model_source);
        log_resolved("max summaries per run", &max, max_source);
        settings.summary.model = model;
        settings.summary.max_per_run = max;
        Self { now, settings }
    }

    pub fn retention_cutoff(&self) -> DateTime<Utc> {
        self.now - self.settings.retention
    }

    pub fn candidate_cutoff(&self) -> DateTime<Utc> {
        self.now - self.settings.cluster.candidate_window
    }
}

fn log_resolved(name: &str, value: &dyn std::fmt::Display, source: ConfigSource) {
    tracing::info!("⚙️ {} = {} ({})", name, value, source);
}
