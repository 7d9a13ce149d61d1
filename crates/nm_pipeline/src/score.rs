use nm_core::{Article, Category, RawFeedItem};

use crate::normalize::words;
use crate::tables::ScoringTables;

fn token_matches(token: &str, word: &str) -> bool {
    token == word || (token.len() == word.len() + 1 && token.starts_with(word) && token.ends_with('s'))
}

/// Counts distinct keywords present in `tokens`, either as a whole token
/// (plural tolerated) or as a run of tokens for multi-word keywords.
pub fn keyword_hits(tokens: &[String], keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| {
            let phrase = words(keyword);
            !phrase.is_empty()
                && tokens.windows(phrase.len()).any(|window| {
                    window
                        .iter()
                        .zip(&phrase)
                        .all(|(token, word)| token_matches(token, word))
                })
        })
        .count()
}

/// Pure scoring over title, source and category.
#[derive(Debug, Clone)]
pub struct Scorer {
    tables: ScoringTables,
}

impl Scorer {
    pub fn new(tables: ScoringTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    /// An outlet matches a domain label of the source exactly, or after a
    /// leading "the" (`theguardian.com` is the Guardian). Whole labels only,
    /// so `ap` does not match `apple.com`.
    pub fn is_credible(&self, source: &str) -> bool {
        let source_tokens = words(source);
        self.tables.credible_sources.iter().any(|outlet| {
            let outlet = outlet.to_lowercase();
            source_tokens
                .iter()
                .any(|label| *label == outlet || label.strip_prefix("the") == Some(outlet.as_str()))
        })
    }

    pub fn score_parts(&self, title: &str, source: &str, category: Category) -> f64 {
        let weights = &self.tables.weights;
        let tokens = words(title);

        let high = keyword_hits(&tokens, &self.tables.high_impact) as f64;
        let medium = keyword_hits(&tokens, &self.tables.medium_impact) as f64;

        let mut raw = self.tables.baseline(category);
        raw += (high * weights.high).min(weights.high_cap);
        raw += (medium * weights.medium).min(weights.medium_cap);
        if self.is_credible(source) {
            raw += weights.credibility_bonus;
        }

        let clamped = if raw.is_finite() { raw.clamp(0.0, 10.0) } else { 0.0 };
        (clamped * 10.0).round() / 10.0
    }

    pub fn score(&self, article: &Article) -> f64 {
        self.score_parts(&article.title, &article.source, article.category)
    }

    /// The category with the most keyword hits in title and excerpt; ties go
    /// to the earlier table entry and no hits leaves the item alone.
    pub fn categorize(&self, item: &mut RawFeedItem) {
        let tokens = words(&format!("{} {}", item.title, item.excerpt));
        let mut best: Option<(Category, usize)> = None;
        for entry in &self.tables.category_keywords {
            let hits = keyword_hits(&tokens, &entry.keywords);
            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((entry.category, hits));
            }
        }
        if let Some((category, _)) = best {
            if category != item.category {
                tracing::debug!("🏷️ {} -> {} ({})", item.category, category, item.title);
                item.category = category;
            }
        }
    }
}
