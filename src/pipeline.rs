//! Nearby restaurant search: cache, pagination, dedup, classification and
//! mock fallback.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::cache::TtlCache;
use crate::classifier::{classify, is_lodging};
use crate::error::PlacesError;
use crate::mock::MockCatalog;
use crate::models::{Page, PageRequest, Place, SearchQuery, DEFAULT_RADIUS_M, DEFAULT_RESULT_CAP};
use crate::provider::PlacesTransport;

pub const SEARCH_CATEGORY: &str = "restaurant";

/// How often and how long to wait when a continuation token is not ready.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

/// Pagination limits and delays for one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    pub max_pages: usize,
    /// Wait before requesting a continuation page; the provider needs time
    /// to activate a fresh token.
    pub page_delay: Duration,
    pub token_retry: RetryPolicy,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_delay: Duration::from_millis(1600),
            token_retry: RetryPolicy {
                max_retries: 1,
                delay: Duration::from_millis(1600),
            },
        }
    }
}

impl SearchPolicy {
    pub fn without_delays() -> Self {
        Self {
            page_delay: Duration::ZERO,
            token_retry: RetryPolicy {
                max_retries: 1,
                delay: Duration::ZERO,
            },
            ..Self::default()
        }
    }
}

pub type ResultCache = TtlCache<Vec<Place>, Infallible>;

/// Entry point for nearby searches. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct NearbySearch {
    pub(crate) transport: Option<Arc<dyn PlacesTransport>>,
    mock: MockCatalog,
    cache: Arc<ResultCache>,
    policy: SearchPolicy,
}

impl NearbySearch {
    pub fn new(
        transport: Option<Arc<dyn PlacesTransport>>,
        mock: MockCatalog,
        cache: Arc<ResultCache>,
        policy: SearchPolicy,
    ) -> Self {
        Self {
            transport,
            mock,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Transport to use, or `None` when no credential is configured.
    pub(crate) fn live_transport(&self) -> Option<&Arc<dyn PlacesTransport>> {
        self.transport.as_ref().filter(|t| t.is_configured())
    }

    pub async fn search_default(&self, latitude: f64, longitude: f64) -> Vec<Place> {
        self.search(latitude, longitude, DEFAULT_RADIUS_M, DEFAULT_RESULT_CAP).await
    }

    /// Nearby restaurants around a point. Never fails: provider problems
    /// degrade to partial results or to the mock catalog.
    pub async fn search(&self, latitude: f64, longitude: f64, radius: u32, cap: usize) -> Vec<Place> {
        let query = SearchQuery::new(latitude, longitude, radius, cap);
        let key = query.cache_key();
        let this = self.clone();

        match self
            .cache
            .fetch_or_load(&key, move || async move { Ok(this.load(query).await) })
            .await
        {
            Ok(places) => places,
            Err(never) => match never {},
        }
    }

    async fn load(&self, query: SearchQuery) -> Vec<Place> {
        let Some(transport) = self.live_transport().cloned() else {
            info!("No places credential configured, using mock catalog");
            return self.mock_results(&query).await;
        };

        match self.paginate(transport.as_ref(), &query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Nearby search via {} failed before any page: {}", transport.name(), e);
                self.mock_results(&query).await
            }
        }
    }

    async fn mock_results(&self, query: &SearchQuery) -> Vec<Place> {
        self.mock
            .search(query.center.latitude, query.center.longitude, query.radius)
            .await
    }

    /// Walk the provider's pages. Returns `Err` only for a transport
    /// failure on the first page; anything later ends pagination early.
    async fn paginate(&self, transport: &dyn PlacesTransport, query: &SearchQuery) -> Result<Vec<Place>, PlacesError> {
        let mut accumulated: Vec<Place> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token = query.page_token.clone();

        for page_number in 0..self.policy.max_pages {
            let request = PageRequest {
                center: query.center,
                radius: query.radius,
                category: SEARCH_CATEGORY.to_string(),
                page_token: page_token.clone(),
            };

            let page = match self.fetch_with_retry(transport, &request).await {
                Ok(page) => page,
                Err(e) if page_number == 0 && e.is_transport_failure() => return Err(e),
                Err(e) => {
                    warn!(
                        "Stopping pagination at page {} with {} results: {}",
                        page_number + 1,
                        accumulated.len(),
                        e
                    );
                    break;
                }
            };

            let next_token = page.next_page_token.clone();
            let added = merge_page(&mut accumulated, &mut seen, page, query.cap);
            debug!("Page {} added {} new places", page_number + 1, added);

            if accumulated.len() >= query.cap {
                break;
            }
            match next_token {
                Some(token) if page_number + 1 < self.policy.max_pages => {
                    tokio::time::sleep(self.policy.page_delay).await;
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        info!(
            "Nearby search at {:.4},{:.4} r={}m collected {} places",
            query.center.latitude,
            query.center.longitude,
            query.radius,
            accumulated.len()
        );
        Ok(accumulated)
    }

    async fn fetch_with_retry(&self, transport: &dyn PlacesTransport, request: &PageRequest) -> Result<Page, PlacesError> {
        let retry = self.policy.token_retry;
        let mut attempt = 0;
        loop {
            match transport.fetch_page(request).await {
                Err(PlacesError::TokenNotReady) if attempt < retry.max_retries => {
                    attempt += 1;
                    debug!("Page token not ready, retry {} in {:?}", attempt, retry.delay);
                    tokio::time::sleep(retry.delay).await;
                }
                other => return other,
            }
        }
    }
}

/// Append the page's new, non-lodging places. Returns how many were added.
fn merge_page(accumulated: &mut Vec<Place>, seen: &mut HashSet<String>, page: Page, cap: usize) -> usize {
    let before = accumulated.len();
    for candidate in page.candidates {
        if accumulated.len() >= cap {
            break;
        }
        if is_lodging(&candidate.categories) {
            debug!("Skipping lodging result {}", candidate.name);
            continue;
        }
        if !seen.insert(candidate.id.clone()) {
            continue;
        }
        let cuisine = classify(&candidate.name, &candidate.categories);
        accumulated.push(candidate.into_place(cuisine));
    }
    accumulated.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Coordinates};

    fn candidate(id: &str, name: &str, tags: &[&str]) -> Candidate {
        Candidate {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            coordinates: Coordinates::new(0.0, 0.0),
            rating: Some(4.0),
            price_level: None,
            photo_reference: None,
            is_open_now: None,
            phone: None,
            categories: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_merge_dedups_skips_lodging_and_classifies() {
        let mut accumulated = Vec::new();
        let mut seen = HashSet::new();

        let first = Page {
            candidates: vec![
                candidate("x", "Pizza Express", &["restaurant"]),
                candidate("h", "Grand Hotel", &["lodging", "restaurant"]),
            ],
            next_page_token: None,
        };
        let second = Page {
            candidates: vec![candidate("x", "Renamed", &["bar"]), candidate("y", "Sushi Go", &["restaurant"])],
            next_page_token: None,
        };

        assert_eq!(merge_page(&mut accumulated, &mut seen, first, 60), 1);
        assert_eq!(merge_page(&mut accumulated, &mut seen, second, 60), 1);

        let names: Vec<&str> = accumulated.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Pizza Express", "Sushi Go"]);
        assert_eq!(accumulated[0].cuisine_type, "Pizzeria");
        assert_eq!(accumulated[1].cuisine_type, "Sushi");
    }

    #[test]
    fn test_merge_respects_cap() {
        let mut accumulated = Vec::new();
        let mut seen = HashSet::new();
        let page = Page {
            candidates: (0..10).map(|i| candidate(&i.to_string(), "Da Peppe", &[])).collect(),
            next_page_token: None,
        };
        merge_page(&mut accumulated, &mut seen, page, 4);
        assert_eq!(accumulated.len(), 4);
    }

    #[test]
    fn test_policy_defaults() {
        let policy = SearchPolicy::default();
        assert_eq!(policy.max_pages, 3);
        assert_eq!(policy.page_delay, Duration::from_millis(1600));
        assert_eq!(policy.token_retry.max_retries, 1);
        assert_eq!(SearchPolicy::without_delays().page_delay, Duration::ZERO);
    }
}
