use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use nm_core::Article;

use crate::context::ClusterSettings;
use crate::normalize::TitleNormalizer;

/// Union-find over article slots.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub fn push(&mut self) -> usize {
        let slot = self.parent.len();
        self.parent.push(slot);
        slot
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }

    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
        for slot in 0..self.parent.len() {
            let root = self.find(slot);
            by_root.entry(root).or_default().push(slot);
        }
        let mut groups: Vec<Vec<usize>> = by_root.into_values().collect();
        groups.sort();
        groups
    }
}

/// Rewrites `related_ids` and `coverage_count` of every article from the
/// connected components of the current relations. Dangling ids are dropped.
/// Afterwards relations are symmetric and every member of a cluster carries
/// the same coverage.
pub fn relink(articles: &mut [Article]) {
    let slots: HashMap<String, usize> = articles
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.clone(), i))
        .collect();

    let mut sets = DisjointSet::new(articles.len());
    for (i, article) in articles.iter().enumerate() {
        for related in &article.related_ids {
            if let Some(&j) = slots.get(related) {
                sets.union(i, j);
            }
        }
    }

    for group in sets.groups() {
        let ids: BTreeSet<String> = group.iter().map(|&i| articles[i].id.clone()).collect();
        let sources: HashSet<String> = group.iter().map(|&i| articles[i].source.clone()).collect();
        let coverage = sources.len().max(1) as u32;
        for &i in &group {
            let own = articles[i].id.clone();
            articles[i].related_ids = ids.iter().filter(|id| **id != own).cloned().collect();
            articles[i].coverage_count = coverage;
        }
    }
}

/// Result of clustering one run's articles against the prior state.
#[derive(Debug, Default)]
pub struct Clustering {
    /// This run's articles (new and re-ingested) plus prior articles that
    /// absorbed a same-source report, with cluster fields filled in.
    pub articles: Vec<Article>,
    /// Every cluster that gained a member this run, as sorted ids. Prior
    /// members are included so the merge can link them back.
    pub groups: Vec<Vec<String>>,
    /// Incoming reports folded into an existing article from the same source.
    pub folded: usize,
    pub reingested: usize,
}

struct Slot {
    article: Article,
    tokens: BTreeSet<String>,
    from_prior: bool,
    /// Eligible as a match target for later items.
    candidate: bool,
    touched: bool,
}

pub struct ClusterEngine {
    settings: ClusterSettings,
    normalizer: TitleNormalizer,
    candidate_cutoff: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Match {
    slot: usize,
    similarity: f64,
}

impl ClusterEngine {
    pub fn new(settings: ClusterSettings, now: DateTime<Utc>) -> Self {
        let normalizer = TitleNormalizer::new(&settings);
        let candidate_cutoff = now - settings.candidate_window;
        Self {
            settings,
            normalizer,
            candidate_cutoff,
        }
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.settings
            .metric
            .score(&self.normalizer.tokens(a), &self.normalizer.tokens(b))
    }

    /// Match order: most similar first, then same category, then most
    /// recently published, then id for determinism.
    fn rank(&self, slots: &[Slot], incoming: &Article, a: &Match, b: &Match) -> Ordering {
        let (sa, sb) = (&slots[a.slot].article, &slots[b.slot].article);
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (sb.category == incoming.category).cmp(&(sa.category == incoming.category)))
            .then_with(|| sb.published_at.cmp(&sa.published_at))
            .then_with(|| sa.id.cmp(&sb.id))
    }

    pub fn cluster(&self, prior: &[Article], mut incoming: Vec<Article>) -> Clustering {
        let mut slots: Vec<Slot> = prior
            .iter()
            .map(|article| Slot {
                tokens: self.normalizer.tokens(&article.title),
                candidate: article.published_at >= self.candidate_cutoff,
                article: article.clone(),
                from_prior: true,
                touched: false,
            })
            .collect();
        let mut by_id: HashMap<String, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.article.id.clone(), i))
            .collect();

        let mut sets = DisjointSet::new(slots.len());
        for (i, slot) in slots.iter().enumerate() {
            for related in &slot.article.related_ids {
                if let Some(&j) = by_id.get(related) {
                    sets.union(i, j);
                }
            }
        }

        // Collector order carries no meaning; fix one.
        incoming.sort_by(|a, b| a.published_at.cmp(&b.published_at).then_with(|| a.id.cmp(&b.id)));

        let mut result = Clustering::default();
        for article in incoming {
            if let Some(&existing) = by_id.get(&article.id) {
                let slot = &mut slots[existing];
                if slot.from_prior && !slot.touched {
                    result.reingested += 1;
                }
                slot.touched = true;
                slot.candidate = true;
                if article.published_at > slot.article.published_at {
                    slot.article.published_at = article.published_at;
                }
                continue;
            }

            let tokens = self.normalizer.tokens(&article.title);
            let mut matches: Vec<Match> = slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.candidate)
                .map(|(i, s)| Match {
                    slot: i,
                    similarity: self.settings.metric.score(&tokens, &s.tokens),
                })
                .filter(|m| m.similarity >= self.settings.threshold && m.similarity > 0.0)
                .collect();
            matches.sort_by(|a, b| self.rank(&slots, &article, a, b));

            let best = matches.first().map(|m| m.slot);
            if let Some(target) = best.and_then(|slot| self.same_source_member(&mut sets, &slots, slot, &article.source)) {
                let slot = &mut slots[target];
                tracing::debug!(
                    "🔁 {} folded into {} (same source {})",
                    article.url,
                    slot.article.id,
                    article.source
                );
                if article.published_at > slot.article.published_at {
                    slot.article.published_at = article.published_at;
                }
                slot.touched = true;
                result.folded += 1;
                continue;
            }

            let new_slot = sets.push();
            by_id.insert(article.id.clone(), new_slot);
            slots.push(Slot {
                article,
                tokens,
                from_prior: false,
                candidate: true,
                touched: true,
            });

            // Join matched clusters greedily as long as no source repeats.
            let mut sources: HashSet<String> = HashSet::from([slots[new_slot].article.source.clone()]);
            for m in &matches {
                let members = self.members(&mut sets, slots.len(), m.slot);
                if members.contains(&new_slot) {
                    continue;
                }
                let theirs: HashSet<String> = members.iter().map(|&i| slots[i].article.source.clone()).collect();
                if theirs.is_disjoint(&sources) {
                    sets.union(new_slot, m.slot);
                    sources.extend(theirs);
                }
            }
        }

        for group in sets.groups() {
            if !group.iter().any(|&i| slots[i].touched) {
                continue;
            }
            let ids: BTreeSet<String> = group.iter().map(|&i| slots[i].article.id.clone()).collect();
            let sources: HashSet<&str> = group.iter().map(|&i| slots[i].article.source.as_str()).collect();
            let coverage = sources.len().max(1) as u32;
            for &i in &group {
                if !slots[i].touched {
                    continue;
                }
                let mut article = slots[i].article.clone();
                article.related_ids = ids.iter().filter(|id| **id != article.id).cloned().collect();
                article.coverage_count = coverage;
                result.articles.push(article);
            }
            if ids.len() > 1 {
                result.groups.push(ids.into_iter().collect());
            }
        }

        tracing::info!(
            "🔗 Clustered {} articles into {} multi-source groups ({} folded, {} re-ingested)",
            result.articles.len(),
            result.groups.len(),
            result.folded,
            result.reingested
        );
        result
    }

    fn members(&self, sets: &mut DisjointSet, len: usize, slot: usize) -> Vec<usize> {
        let root = sets.find(slot);
        (0..len).filter(|&i| sets.find(i) == root).collect()
    }

    /// The report from `source` already in the cluster of `slot`, if any.
    /// Only the best-ranked match is asked; weaker matches are left to the join.
    fn same_source_member(&self, sets: &mut DisjointSet, slots: &[Slot], slot: usize, source: &str) -> Option<usize> {
        self.members(sets, slots.len(), slot)
            .into_iter()
            .filter(|&i| slots[i].article.source == source)
            .min_by(|&a, &b| slots[a].article.id.cmp(&slots[b].article.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use nm_core::{Category, RawFeedItem};

    fn article(title: &str, link: &str, source: &str, age_hours: i64, now: DateTime<Utc>) -> Article {
        categorized(title, link, source, Category::Politics, age_hours, now)
    }

    fn categorized(
        title: &str,
        link: &str,
        source: &str,
        category: Category,
        age_hours: i64,
        now: DateTime<Utc>,
    ) -> Article {
        Article::from_raw(
            &RawFeedItem {
                title: title.to_string(),
                link: link.to_string(),
                source: source.to_string(),
                category,
                published_at: now - Duration::hours(age_hours),
                excerpt: String::new(),
            },
            "English",
        )
    }

    fn engine(now: DateTime<Utc>) -> ClusterEngine {
        ClusterEngine::new(ClusterSettings::default(), now)
    }

    fn find<'a>(articles: &'a [Article], link: &str) -> &'a Article {
        articles.iter().find(|a| a.url == link).unwrap()
    }

    #[test]
    fn test_paraphrased_headlines_cluster() {
        let now = Utc::now();
        let result = engine(now).cluster(
            &[],
            vec![
                article("Prime Minister resigns amid scandal", "https://x.com/1", "x.com", 2, now),
                article("PM steps down after scandal", "https://y.com/1", "y.com", 1, now),
            ],
        );
        assert_eq!(result.articles.len(), 2);
        let a = find(&result.articles, "https://x.com/1");
        let b = find(&result.articles, "https://y.com/1");
        assert_eq!(a.related_ids, vec![b.id.clone()]);
        assert_eq!(b.related_ids, vec![a.id.clone()]);
        assert_eq!(a.coverage_count, 2);
        assert_eq!(b.coverage_count, 2);
        assert_eq!(result.groups.len(), 1);
    }

    #[test]
    fn test_transitive_within_run() {
        let now = Utc::now();
        let result = engine(now).cluster(
            &[],
            vec![
                article("Storm floods coastal towns", "https://a.com/1", "a.com", 3, now),
                article("Heavy rain hits inland farms", "https://b.com/1", "b.com", 2, now),
                article("Storm floods coastal towns, heavy rain hits inland farms", "https://c.com/1", "c.com", 1, now),
            ],
        );
        for a in &result.articles {
            assert_eq!(a.coverage_count, 3);
            assert_eq!(a.related_ids.len(), 2);
        }
    }

    #[test]
    fn test_same_source_is_folded() {
        let now = Utc::now();
        let result = engine(now).cluster(
            &[],
            vec![
                article("Central bank raises interest rates", "https://a.com/1", "a.com", 3, now),
                article("Central bank raises interest rates again", "https://a.com/2", "a.com", 1, now),
            ],
        );
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.folded, 1);
        let kept = &result.articles[0];
        assert_eq!(kept.url, "https://a.com/1");
        assert_eq!(kept.coverage_count, 1);
        assert_eq!(kept.published_at, now - Duration::hours(1));
    }

    #[test]
    fn test_fold_only_into_best_match() {
        let now = Utc::now();
        let result = engine(now).cluster(
            &[],
            vec![
                article("Volcano erupts near capital", "https://a.com/v", "a.com", 3, now),
                article("Volcano erupts, ash cloud grounds flights", "https://s.com/v1", "s.com", 2, now),
                article("Volcano erupts near capital, ash cloud", "https://s.com/v2", "s.com", 1, now),
            ],
        );
        assert_eq!(result.folded, 0);
        let capital = find(&result.articles, "https://a.com/v");
        let later = find(&result.articles, "https://s.com/v2");
        let flights = find(&result.articles, "https://s.com/v1");
        assert_eq!(capital.coverage_count, 2);
        assert_eq!(capital.related_ids, vec![later.id.clone()]);
        assert_eq!(flights.coverage_count, 1);
        assert!(flights.related_ids.is_empty());
    }

    #[test]
    fn test_equal_matches_prefer_same_category() {
        let now = Utc::now();
        let result = engine(now).cluster(
            &[],
            vec![
                categorized("Stock markets slide sharply", "https://a.com/m", "a.com", Category::Politics, 3, now),
                categorized("Tariff talks stall in Geneva", "https://a.com/t", "a.com", Category::Business, 2, now),
                categorized(
                    "Tariff talks stall in Geneva as stock markets slide sharply",
                    "https://c.com/1",
                    "c.com",
                    Category::Politics,
                    1,
                    now,
                ),
            ],
        );
        let markets = find(&result.articles, "https://a.com/m");
        let tariffs = find(&result.articles, "https://a.com/t");
        let fresh = find(&result.articles, "https://c.com/1");
        assert_eq!(fresh.related_ids, vec![markets.id.clone()]);
        assert!(tariffs.related_ids.is_empty());
    }

    #[test]
    fn test_equal_matches_prefer_most_recent() {
        let now = Utc::now();
        let result = engine(now).cluster(
            &[],
            vec![
                article("Stock markets slide sharply", "https://a.com/m", "a.com", 5, now),
                article("Tariff talks stall in Geneva", "https://a.com/t", "a.com", 4, now),
                article(
                    "Tariff talks stall in Geneva as stock markets slide sharply",
                    "https://c.com/1",
                    "c.com",
                    1,
                    now,
                ),
            ],
        );
        let markets = find(&result.articles, "https://a.com/m");
        let tariffs = find(&result.articles, "https://a.com/t");
        let fresh = find(&result.articles, "https://c.com/1");
        assert_eq!(fresh.related_ids, vec![tariffs.id.clone()]);
        assert_eq!(tariffs.coverage_count, 2);
        assert!(markets.related_ids.is_empty());
    }

    #[test]
    fn test_prior_context_and_window() {
        let now = Utc::now();
        let recent = article("Volcano erupts near capital", "https://a.com/v", "a.com", 10, now);
        let stale = article("Volcano erupts near capital", "https://b.com/v", "b.com", 100, now);
        let result = engine(now).cluster(
            &[recent.clone(), stale.clone()],
            vec![article("Volcano erupts near the capital", "https://c.com/v", "c.com", 1, now)],
        );
        let fresh = find(&result.articles, "https://c.com/v");
        assert_eq!(fresh.related_ids, vec![recent.id.clone()]);
        assert_eq!(result.groups, vec![{
            let mut ids = vec![recent.id.clone(), fresh.id.clone()];
            ids.sort();
            ids
        }]);
        // the prior member is only reported through the group
        assert!(result.articles.iter().all(|a| a.id != stale.id && a.id != recent.id));
    }

    #[test]
    fn test_reingested_id_is_not_duplicated() {
        let now = Utc::now();
        let prior = article("Court rules on election dispute", "https://a.com/c", "a.com", 5, now);
        let again = article("Court rules on election dispute", "https://a.com/c", "a.com", 5, now);
        let result = engine(now).cluster(&[prior.clone()], vec![again.clone(), again]);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.reingested, 1);
        assert_eq!(result.articles[0].id, prior.id);
    }

    #[test]
    fn test_relink_closes_relations() {
        let now = Utc::now();
        let mut a = article("One", "https://a.com/1", "a.com", 1, now);
        let b = article("Two", "https://b.com/1", "b.com", 1, now);
        let mut c = article("Three", "https://a.com/2", "a.com", 1, now);
        a.related_ids = vec![b.id.clone()];
        c.related_ids = vec![b.id.clone(), "gone".to_string()];
        let mut articles = vec![a, b, c];
        relink(&mut articles);
        for article in &articles {
            assert_eq!(article.related_ids.len(), 2);
            assert_eq!(article.coverage_count, 2);
        }
    }
}
