use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use url::Url;

use super::wire::{AutocompleteResponse, DetailsResponse, GeocodeResponse, NearbyResponse};
use super::{decode, is_direct_url, redact, PlacesTransport};
use crate::error::PlacesError;
use crate::models::{Coordinates, Page, PageRequest, PlaceDetails, Suggestion};

pub const GOOGLE_MAPS_API: &str = "https://maps.googleapis.com/maps/api";

pub const DETAILS_FIELDS: &str =
    "place_id,name,formatted_address,formatted_phone_number,geometry,rating,website,reviews";

/// Direct client for the Google Places web service.
#[derive(Clone)]
pub struct GoogleTransport {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleTransport {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self::with_base_url(client, api_key, GOOGLE_MAPS_API)
    }

    pub fn with_base_url(client: Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, PlacesError> {
        let mut url = Url::parse_with_params(&format!("{}/{}", self.base_url, path), params)?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, PlacesError> {
        debug!("Requesting {}", redact(&url));
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Google Places API answered HTTP {}: {}", status, body);
            return Err(PlacesError::provider(status.as_str(), body));
        }
        Ok(body)
    }

    /// Photo endpoint URL for a legacy photo reference.
    pub fn photo_endpoint(&self, reference: &str, max_width: u32) -> Result<Url, PlacesError> {
        self.url(
            "place/photo",
            &[("maxwidth", max_width.to_string().as_str()), ("photo_reference", reference)],
        )
    }
}

#[async_trait]
impl PlacesTransport for GoogleTransport {
    fn name(&self) -> &'static str {
        "google"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, PlacesError> {
        let url = match &request.page_token {
            Some(token) => self.url("place/nearbysearch/json", &[("pagetoken", token.as_str())])?,
            None => {
                let location = format!("{},{}", request.center.latitude, request.center.longitude);
                let radius = request.radius.to_string();
                let url = self.url(
                    "place/nearbysearch/json",
                    &[
                        ("location", location.as_str()),
                        ("radius", radius.as_str()),
                        ("type", request.category.as_str()),
                    ],
                )?;
                url
            }
        };

        let body = self.get_text(url).await?;
        let page = decode::<NearbyResponse>(&body)?.into_page(request.page_token.is_some())?;
        info!(
            "Google nearby search returned {} results (more: {})",
            page.candidates.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PlacesError> {
        info!("Geocoding: {}", address);
        let url = self.url("geocode/json", &[("address", address)])?;
        let body = self.get_text(url).await?;
        decode::<GeocodeResponse>(&body)?.into_coordinates()
    }

    async fn autocomplete(&self, input: &str) -> Result<Vec<Suggestion>, PlacesError> {
        debug!("Autocomplete for: {}", input);
        let url = self.url("place/autocomplete/json", &[("input", input), ("types", "establishment")])?;
        let body = self.get_text(url).await?;
        decode::<AutocompleteResponse>(&body)?.into_suggestions()
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        info!("Getting place details for: {}", place_id);
        let url = self.url("place/details/json", &[("place_id", place_id), ("fields", DETAILS_FIELDS)])?;
        let body = self.get_text(url).await?;
        decode::<DetailsResponse>(&body)?.into_details()
    }

    async fn photo_url(&self, reference: &str, max_width: u32) -> Result<Option<String>, PlacesError> {
        if is_direct_url(reference) {
            return Ok(Some(reference.to_string()));
        }
        if !self.is_configured() {
            return Ok(None);
        }
        Ok(Some(self.photo_endpoint(reference, max_width)?.to_string()))
    }
}
