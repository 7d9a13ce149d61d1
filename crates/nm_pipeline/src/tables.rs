use std::collections::BTreeMap;
use std::path::Path;

use nm_core::{Category, Error, Result};
use serde::{Deserialize, Serialize};

pub const TABLES_VERSION: u32 = 1;

const HIGH_IMPACT: &[&str] = &[
    "war", "conflict", "nuclear", "missile", "invasion", "attack",
    "president", "election", "government", "parliament", "treaty",
    "climate", "earthquake", "hurricane", "disaster", "emergency",
    "breakthrough", "discovery", "cure", "vaccine", "ai", "artificial intelligence",
    "billion", "trillion", "crash", "recession", "inflation",
    "death", "killed", "massacre", "genocide", "terrorism",
];

const MEDIUM_IMPACT: &[&str] = &[
    "policy", "law", "regulation", "trade", "economy", "market",
    "research", "study", "report", "analysis", "investigation",
    "company", "corporation", "merger", "acquisition", "ipo",
    "protest", "demonstration", "strike", "union", "rights",
];

const CREDIBLE_SOURCES: &[&str] = &["bbc", "nytimes", "reuters", "ap", "apnews", "npr", "guardian", "economist"];

const BASELINES: &[(Category, f64)] = &[
    (Category::Politics, 2.5),
    (Category::Business, 2.0),
    (Category::Technology, 2.0),
    (Category::Science, 2.0),
    (Category::Environment, 2.0),
    (Category::Health, 2.5),
    (Category::Society, 2.0),
    (Category::Culture, 1.5),
    (Category::Sports, 1.5),
];

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Politics, &["president", "election", "government", "parliament", "congress", "senate", "minister", "vote", "policy", "political"]),
    (Category::Business, &["market", "stock", "company", "economy", "trade", "investment", "ceo", "profit", "revenue", "merger"]),
    (Category::Technology, &["tech", "software", "app", "ai", "artificial intelligence", "robot", "digital", "cyber", "startup", "innovation"]),
    (Category::Science, &["research", "study", "scientist", "discovery", "experiment", "space", "nasa", "physics", "biology", "chemistry"]),
    (Category::Environment, &["climate", "environment", "carbon", "emission", "pollution", "renewable", "sustainable", "wildlife", "conservation"]),
    (Category::Health, &["health", "medical", "doctor", "hospital", "disease", "vaccine", "treatment", "patient", "drug", "medicine"]),
    (Category::Society, &["community", "social", "rights", "protest", "immigration", "education", "crime", "justice", "poverty"]),
    (Category::Culture, &["art", "music", "film", "movie", "book", "museum", "festival", "celebrity", "entertainment", "culture"]),
    (Category::Sports, &["sport", "game", "match", "team", "player", "championship", "league", "score", "win", "tournament"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub high: f64,
    pub high_cap: f64,
    pub medium: f64,
    pub medium_cap: f64,
    pub credibility_bonus: f64,
    /// Baseline for categories missing from `baselines`.
    pub default_baseline: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            high: 1.2,
            high_cap: 4.0,
            medium: 0.4,
            medium_cap: 2.0,
            credibility_bonus: 1.0,
            default_baseline: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Keyword and weight tables for scoring and categorization. Kept as data so
/// a run can swap them without a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    pub version: u32,
    pub weights: Weights,
    pub high_impact: Vec<String>,
    pub medium_impact: Vec<String>,
    pub credible_sources: Vec<String>,
    /// Keyed by category name.
    pub baselines: BTreeMap<String, f64>,
    /// Order matters: on equal hits the earlier category wins.
    pub category_keywords: Vec<CategoryKeywords>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            version: TABLES_VERSION,
            weights: Weights::default(),
            high_impact: owned(HIGH_IMPACT),
            medium_impact: owned(MEDIUM_IMPACT),
            credible_sources: owned(CREDIBLE_SOURCES),
            baselines: BASELINES
                .iter()
                .map(|(category, value)| (category.to_string(), *value))
                .collect(),
            category_keywords: CATEGORY_KEYWORDS
                .iter()
                .map(|(category, keywords)| CategoryKeywords {
                    category: *category,
                    keywords: owned(keywords),
                })
                .collect(),
        }
    }
}

impl ScoringTables {
    pub fn from_json(raw: &str) -> Result<Self> {
        let tables: ScoringTables = serde_json::from_str(raw)?;
        if tables.version != TABLES_VERSION {
            return Err(Error::Config(format!(
                "Unsupported scoring tables version {} (expected {})",
                tables.version, TABLES_VERSION
            )));
        }
        Ok(tables)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let tables = Self::from_json(&raw)?;
        tracing::info!("📊 Loaded scoring tables v{} from {}", tables.version, path.display());
        Ok(tables)
    }

    pub fn baseline(&self, category: Category) -> f64 {
        self.baselines
            .get(category.as_str())
            .copied()
            .unwrap_or(self.weights.default_baseline)
    }
}
