use nm_core::Category;

/// One feed to poll, with the outlet label its articles are attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEndpoint {
    pub source: String,
    pub url: String,
    pub category: Category,
}

impl FeedEndpoint {
    pub fn new(category: Category, source: &str, url: &str) -> Self {
        Self {
            source: source.to_string(),
            url: url.to_string(),
            category,
        }
    }
}

use Category::*;

const FEEDS: &[(Category, &str, &str)] = &[
    (Politics, "bbc.co.uk", "https://feeds.bbci.co.uk/news/politics/rss.xml"),
    (Politics, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Politics.xml"),
    (Politics, "npr.org", "https://feeds.npr.org/1014/rss.xml"),
    (Politics, "theguardian.com", "https://www.theguardian.com/politics/rss"),
    (Politics, "washingtonpost.com", "https://feeds.washingtonpost.com/rss/politics"),
    (Politics, "aljazeera.com", "https://www.aljazeera.com/xml/rss/all.xml"),
    (Politics, "reuters.com", "https://feeds.reuters.com/Reuters/worldNews"),
    (Politics, "dw.com", "https://rss.dw.com/rdf/rss-en-all"),
    (Business, "bbc.co.uk", "https://feeds.bbci.co.uk/news/business/rss.xml"),
    (Business, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Business.xml"),
    (Business, "theguardian.com", "https://www.theguardian.com/uk/business/rss"),
    (Business, "bloomberg.com", "https://feeds.bloomberg.com/markets/news.rss"),
    (Business, "cnbc.com", "https://www.cnbc.com/id/100003114/device/rss/rss.html"),
    (Business, "ft.com", "https://feeds.ft.com/rss/home/uk"),
    (Business, "reuters.com", "https://feeds.reuters.com/reuters/businessNews"),
    (Business, "fortune.com", "https://fortune.com/feed/"),
    (Technology, "bbc.co.uk", "https://feeds.bbci.co.uk/news/technology/rss.xml"),
    (Technology, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml"),
    (Technology, "theverge.com", "https://www.theverge.com/rss/index.xml"),
    (Technology, "techcrunch.com", "https://techcrunch.com/feed/"),
    (Technology, "wired.com", "https://www.wired.com/feed/rss"),
    (Technology, "arstechnica.com", "https://feeds.arstechnica.com/arstechnica/index"),
    (Technology, "theguardian.com", "https://www.theguardian.com/uk/technology/rss"),
    (Technology, "engadget.com", "https://www.engadget.com/rss.xml"),
    (Technology, "cnet.com", "https://www.cnet.com/rss/news/"),
    (Science, "bbc.co.uk", "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml"),
    (Science, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Science.xml"),
    (Science, "theguardian.com", "https://www.theguardian.com/science/rss"),
    (Science, "sciencedaily.com", "https://www.sciencedaily.com/rss/all.xml"),
    (Science, "newscientist.com", "https://www.newscientist.com/feed/home/"),
    (Science, "phys.org", "https://phys.org/rss-feed/"),
    (Science, "nature.com", "https://www.nature.com/nature.rss"),
    (Science, "space.com", "https://www.space.com/feeds/all"),
    (Environment, "bbc.co.uk", "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml"),
    (Environment, "theguardian.com", "https://www.theguardian.com/environment/rss"),
    (Environment, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Climate.xml"),
    (Environment, "grist.org", "https://grist.org/feed/"),
    (Environment, "insideclimatenews.org", "https://insideclimatenews.org/feed/"),
    (Health, "bbc.co.uk", "https://feeds.bbci.co.uk/news/health/rss.xml"),
    (Health, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Health.xml"),
    (Health, "theguardian.com", "https://www.theguardian.com/lifeandstyle/health-and-wellbeing/rss"),
    (Health, "statnews.com", "https://www.statnews.com/feed/"),
    (Health, "webmd.com", "https://www.webmd.com/rss/rss.aspx"),
    (Health, "medscape.com", "https://feeds.medscape.com/cx/feeds/rssfeeds.aspx?feed=news"),
    (Society, "bbc.co.uk", "https://feeds.bbci.co.uk/news/world/rss.xml"),
    (Society, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/World.xml"),
    (Society, "theguardian.com", "https://www.theguardian.com/world/rss"),
    (Society, "washingtonpost.com", "https://feeds.washingtonpost.com/rss/world"),
    (Society, "aljazeera.com", "https://www.aljazeera.com/xml/rss/all.xml"),
    (Society, "reuters.com", "https://feeds.reuters.com/Reuters/worldNews"),
    (Society, "dw.com", "https://rss.dw.com/rdf/rss-en-world"),
    (Society, "france24.com", "https://www.france24.com/en/rss"),
    (Culture, "bbc.co.uk", "https://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml"),
    (Culture, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Arts.xml"),
    (Culture, "theguardian.com", "https://www.theguardian.com/culture/rss"),
    (Culture, "variety.com", "https://variety.com/feed/"),
    (Culture, "hollywoodreporter.com", "https://www.hollywoodreporter.com/feed/"),
    (Culture, "pitchfork.com", "https://pitchfork.com/feed/feed-news/rss"),
    (Culture, "rollingstone.com", "https://www.rollingstone.com/feed/"),
    (Sports, "bbc.co.uk", "https://feeds.bbci.co.uk/sport/rss.xml"),
    (Sports, "nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/Sports.xml"),
    (Sports, "theguardian.com", "https://www.theguardian.com/uk/sport/rss"),
    (Sports, "espn.com", "https://www.espn.com/espn/rss/news"),
    (Sports, "yahoo.com", "https://sports.yahoo.com/rss/"),
    (Sports, "skysports.com", "https://www.skysports.com/rss/12040"),
];

/// Static category → endpoints mapping the collector walks each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    endpoints: Vec<FeedEndpoint>,
}

impl Registry {
    pub fn new(endpoints: Vec<FeedEndpoint>) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[FeedEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn by_category(&self, category: Category) -> Vec<&FeedEndpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Endpoints matching either a category name or an exact feed URL.
    pub fn select(&self, target: &str) -> Vec<&FeedEndpoint> {
        match target.parse::<Category>() {
            Ok(category) => self.by_category(category),
            Err(_) => self.endpoints.iter().filter(|e| e.url == target.trim()).collect(),
        }
    }
}

/// The outlets the pipeline has always polled, grouped by section.
pub fn default_registry() -> Registry {
    Registry::new(
        FEEDS
            .iter()
            .map(|(category, source, url)| FeedEndpoint::new(*category, source, url))
            .collect(),
    )
}
