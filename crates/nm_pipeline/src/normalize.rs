use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use nm_core::Error;

use crate::context::ClusterSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMetric {
    /// Shared tokens over all tokens.
    #[default]
    Jaccard,
    /// Shared tokens over the smaller title's tokens.
    Overlap,
}

impl SimilarityMetric {
    pub fn score(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let shared = a.intersection(b).count() as f64;
        let denominator = match self {
            SimilarityMetric::Jaccard => a.union(b).count(),
            SimilarityMetric::Overlap => a.len().min(b.len()),
        };
        shared / denominator as f64
    }
}

impl FromStr for SimilarityMetric {
    type Err = Error;

    fn from_str(s: &str) -> nm_core::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jaccard" => Ok(SimilarityMetric::Jaccard),
            "overlap" => Ok(SimilarityMetric::Overlap),
            other => Err(Error::Config(format!(
                "Unknown similarity metric: {}. Available: jaccard, overlap",
                other
            ))),
        }
    }
}

/// Lowercases, turns everything that is not a letter or digit into a
/// separator and splits. Shared by title comparison and keyword matching.
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn stem(token: &str) -> String {
    let len = token.chars().count();
    if len > 5 && token.ends_with("ing") {
        return token[..token.len() - 3].to_string();
    }
    if len > 4 && token.ends_with("ed") {
        return token[..token.len() - 2].to_string();
    }
    if len > 3 && token.ends_with('s') && !["ss", "us", "is"].iter().any(|end| token.ends_with(end)) {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Reduces a headline to the token set used for similarity.
#[derive(Debug, Clone)]
pub struct TitleNormalizer {
    /// Longest phrase first so "prime minister" wins over "minister".
    aliases: Vec<(Vec<String>, String)>,
    stopwords: HashSet<String>,
}

impl TitleNormalizer {
    pub fn new(settings: &ClusterSettings) -> Self {
        let mut aliases: Vec<(Vec<String>, String)> = settings
            .aliases
            .iter()
            .map(|(from, to)| (words(from), to.clone()))
            .filter(|(from, _)| !from.is_empty())
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            aliases,
            stopwords: settings.stopwords.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn apply_aliases(&self, raw: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(raw.len());
        let mut i = 0;
        'outer: while i < raw.len() {
            for (phrase, replacement) in &self.aliases {
                let end = i + phrase.len();
                if end <= raw.len() && raw[i..end] == phrase[..] {
                    out.push(replacement.clone());
                    i = end;
                    continue 'outer;
                }
            }
            out.push(raw[i].clone());
            i += 1;
        }
        out
    }

    pub fn tokens(&self, title: &str) -> BTreeSet<String> {
        self.apply_aliases(words(title))
            .into_iter()
            .filter(|t| t.chars().count() > 1 && !self.stopwords.contains(t))
            .map(|t| stem(&t))
            .collect()
    }
}
