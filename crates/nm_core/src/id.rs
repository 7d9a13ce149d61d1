use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters that only carry campaign tracking and never change the page.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "cmpid", "at_medium", "at_campaign"];

const ID_HEX_LEN: usize = 16;

/// Canonical form of an article link, used as the article's natural key.
pub fn normalize_url(link: &str) -> String {
    let trimmed = link.trim();
    let mut url = match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url,
        _ => return trimmed.to_lowercase(),
    };

    if url.scheme() == "http" {
        let _ = url.set_scheme("https");
    }
    if let Some(host) = url.host_str().map(|h| h.to_lowercase()) {
        if let Some(bare) = host.strip_prefix("www.") {
            let _ = url.set_host(Some(bare));
        }
    }
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// Stable opaque id for an article link: the same URL maps to the same id in every run.
pub fn article_id(link: &str) -> String {
    let digest = Sha256::digest(normalize_url(link).as_bytes());
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(ID_HEX_LEN)
        .collect()
}
