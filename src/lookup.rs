//! Auxiliary provider lookups. Failures are logged and reported as "no
//! result" so callers never have to handle provider errors.

use log::warn;

use crate::models::{Coordinates, Place, PlaceDetails, Suggestion};
use crate::pipeline::NearbySearch;
use crate::provider::is_direct_url;

impl NearbySearch {
    pub async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }
        let transport = self.live_transport()?;
        match transport.geocode(address).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", address, e);
                None
            }
        }
    }

    pub async fn autocomplete(&self, input: &str) -> Vec<Suggestion> {
        let input = input.trim();
        if input.is_empty() {
            return Vec::new();
        }
        let Some(transport) = self.live_transport() else {
            return Vec::new();
        };
        transport.autocomplete(input).await.unwrap_or_else(|e| {
            warn!("Autocomplete for '{}' failed: {}", input, e);
            Vec::new()
        })
    }

    pub async fn details(&self, place_id: &str) -> Option<PlaceDetails> {
        let transport = self.live_transport()?;
        match transport.details(place_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Details for {} failed: {}", place_id, e);
                None
            }
        }
    }

    /// Display URL for a place photo, if one can be produced.
    pub async fn photo_url(&self, reference: &str, max_width: u32) -> Option<String> {
        if is_direct_url(reference) {
            return Some(reference.to_string());
        }
        let transport = self.live_transport()?;
        match transport.photo_url(reference, max_width).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Photo lookup for {} failed: {}", reference, e);
                None
            }
        }
    }

    /// Geocode free text, then search around the result. Empty when the
    /// text cannot be resolved.
    pub async fn search_near_address(&self, address: &str, radius: u32, cap: usize) -> Vec<Place> {
        match self.geocode(address).await {
            Some(center) => self.search(center.latitude, center.longitude, radius, cap).await,
            None => Vec::new(),
        }
    }
}
