use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::types::{Article, Category};

pub const BUCKET_WIDTH: f64 = 0.5;
pub const BUCKET_COUNT: usize = 21;
const MAX_SCORE: f64 = 10.0;

/// Which bucket a score that is not a multiple of the bucket width lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketAlignment {
    /// `[5.5, 6.0)` counts under `"5.5"`.
    #[default]
    Floor,
    /// Round to the closest bucket, halves going up.
    Nearest,
}

impl BucketAlignment {
    pub fn bucket_index(&self, score: f64) -> usize {
        let steps = score.clamp(0.0, MAX_SCORE) / BUCKET_WIDTH;
        let index = match self {
            BucketAlignment::Floor => (steps + 1e-9).floor(),
            BucketAlignment::Nearest => steps.round(),
        };
        (index as usize).min(BUCKET_COUNT - 1)
    }
}

/// Score histogram with every bucket from `"0.0"` to `"10.0"` always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; BUCKET_COUNT],
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            counts: [0; BUCKET_COUNT],
        }
    }

    pub fn bucket_key(index: usize) -> String {
        format!("{:.1}", index as f64 * BUCKET_WIDTH)
    }

    fn index_of_key(key: &str) -> Option<usize> {
        let value: f64 = key.trim().parse().ok()?;
        let steps = value / BUCKET_WIDTH;
        if !(0.0..=MAX_SCORE / BUCKET_WIDTH).contains(&steps) || (steps - steps.round()).abs() > 1e-9 {
            return None;
        }
        Some(steps.round() as usize)
    }

    pub fn record(&mut self, score: f64, alignment: BucketAlignment) {
        self.counts[alignment.bucket_index(score)] += 1;
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        Self::index_of_key(key).map(|i| self.counts[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, count)| (Self::bucket_key(i), *count))
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BUCKET_COUNT))?;
        for (key, count) in self.iter() {
            map.serialize_entry(&key, &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HistogramVisitor;

        impl<'de> Visitor<'de> for HistogramVisitor {
            type Value = Histogram;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of score buckets to counts")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Histogram, M::Error> {
                let mut histogram = Histogram::new();
                while let Some((key, count)) = access.next_entry::<String, u32>()? {
                    let index = Histogram::index_of_key(&key)
                        .ok_or_else(|| de::Error::custom(format!("invalid histogram bucket: {}", key)))?;
                    histogram.counts[index] = count;
                }
                Ok(histogram)
            }
        }

        deserializer.deserialize_map(HistogramVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_articles: usize,
    pub high_significance_count: usize,
    pub histogram: Histogram,
    pub last_refresh: DateTime<Utc>,
    #[serde(default)]
    pub summarized_count: usize,
    #[serde(default)]
    pub category_counts: BTreeMap<String, usize>,
    #[serde(default)]
    pub feeds_ok: usize,
    #[serde(default)]
    pub feeds_failed: usize,
}

impl Stats {
    /// Recomputes every aggregate from scratch; nothing carries over from earlier stats.
    pub fn from_articles(
        articles: &[Article],
        high_threshold: f64,
        alignment: BucketAlignment,
        last_refresh: DateTime<Utc>,
    ) -> Self {
        let mut histogram = Histogram::new();
        let mut category_counts: BTreeMap<String, usize> = Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), 0))
            .collect();

        for article in articles {
            histogram.record(article.significance_score, alignment);
            *category_counts
                .entry(article.category.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            total_articles: articles.len(),
            high_significance_count: articles
                .iter()
                .filter(|a| a.significance_score >= high_threshold)
                .count(),
            histogram,
            last_refresh,
            summarized_count: articles.iter().filter(|a| a.is_summarized()).count(),
            category_counts,
            feeds_ok: 0,
            feeds_failed: 0,
        }
    }

    pub fn with_feed_counts(mut self, feeds_ok: usize, feeds_failed: usize) -> Self {
        self.feeds_ok = feeds_ok;
        self.feeds_failed = feeds_failed;
        self
    }
}
