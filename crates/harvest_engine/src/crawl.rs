//! Breadth-first crawling for recursive routing entries.

use std::collections::{HashSet, VecDeque};

use url::Url;

use harvest_logging::harvest_warn;

use crate::fetch::PageFetcher;
use crate::loader::{document_from_output, BodyHint, RateLimiter};
use crate::normalize;
use crate::types::{DocumentBody, FailureKind, FetchFailure, RawDocument};

/// Links per crawled page considered for the frontier.
const CRAWL_LINK_CAP: usize = 500;

/// Breadth-first crawl from `seed`, following links on the seed's host up
/// to `depth` hops out. The visited set is keyed by normalized URL so every
/// page is fetched at most once, cycles included. The seed failing fails
/// the whole crawl; a deeper page failing only costs that page.
pub async fn crawl(
    seed: &str,
    depth: u32,
    fetcher: &dyn PageFetcher,
    limiter: &mut RateLimiter,
    page_limit: usize,
) -> Result<Vec<RawDocument>, FetchFailure> {
    let seed_url = Url::parse(seed)
        .map_err(|err| FetchFailure::new(FailureKind::InvalidUrl, err.to_string()))?;
    let Some(seed_host) = seed_url.host_str().map(str::to_ascii_lowercase) else {
        return Err(FetchFailure::new(
            FailureKind::InvalidUrl,
            "seed url has no host",
        ));
    };

    let mut visited = HashSet::new();
    visited.insert(visit_key(&seed_url));
    let mut frontier = VecDeque::new();
    frontier.push_back((seed_url, 0u32));
    let mut documents = Vec::new();
    let mut truncated = false;

    while let Some((page_url, hop)) = frontier.pop_front() {
        limiter.pause().await;
        let is_seed = hop == 0;
        let output = match fetcher.fetch_page(page_url.as_str()).await {
            Ok(output) => output,
            Err(failure) if is_seed => return Err(failure),
            Err(failure) => {
                harvest_warn!("crawl page {page_url} failed: {}", failure.kind);
                continue;
            }
        };
        let document = match document_from_output(page_url.as_str(), output, BodyHint::Auto) {
            Ok(document) => document,
            Err(failure) if is_seed => return Err(failure),
            Err(failure) => {
                harvest_warn!("crawl page {page_url} unusable: {}", failure.kind);
                continue;
            }
        };

        if hop < depth {
            if let DocumentBody::Html(html) = &document.body {
                for link in normalize::extract_links(html, page_url.as_str(), CRAWL_LINK_CAP) {
                    let Ok(target) = Url::parse(&link.target_url) else {
                        continue;
                    };
                    if !target
                        .host_str()
                        .is_some_and(|host| host.eq_ignore_ascii_case(&seed_host))
                    {
                        continue;
                    }
                    if visited.len() >= page_limit {
                        truncated = true;
                        break;
                    }
                    if visited.insert(visit_key(&target)) {
                        frontier.push_back((target, hop + 1));
                    }
                }
            }
        }
        documents.push(document);
    }
    if truncated {
        harvest_warn!("crawl of {seed} hit the {page_limit}-page limit; frontier truncated");
    }
    Ok(documents)
}

/// Cycle-prevention key: fragment dropped, trailing slash ignored. The Url
/// parser has already lowercased the host.
fn visit_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    let key = String::from(url);
    key.strip_suffix('/').map(ToOwned::to_owned).unwrap_or(key)
}
