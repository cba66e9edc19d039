//! Transports that fetch places from a provider.
//!
//! Each adapter converts provider payloads into [`Candidate`]s and the other
//! canonical types right at the boundary; nothing provider-shaped leaves
//! this module.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::PlacesError;
use crate::models::{Coordinates, Page, PageRequest, PlaceDetails, Suggestion};

pub mod google;
pub mod places_v1;
pub mod proxy;
pub mod wire;

pub use google::GoogleTransport;
pub use places_v1::PlacesV1Transport;
pub use proxy::ProxyTransport;

#[async_trait]
pub trait PlacesTransport: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Whether the transport has what it needs to reach the provider.
    fn is_configured(&self) -> bool;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, PlacesError>;

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PlacesError>;

    async fn autocomplete(&self, input: &str) -> Result<Vec<Suggestion>, PlacesError>;

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError>;

    /// Turn a photo reference into a displayable URL.
    async fn photo_url(&self, reference: &str, max_width: u32) -> Result<Option<String>, PlacesError>;
}

/// References that already are URLs need no resolution.
pub(crate) fn is_direct_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, PlacesError> {
    serde_json::from_str(body).map_err(|e| PlacesError::Decode(e.to_string()))
}

/// Strip the credential from a request URL before it is logged.
pub(crate) fn redact(url: &url::Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "key" { "<redacted>".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    if pairs.is_empty() {
        return shown.to_string();
    }
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
