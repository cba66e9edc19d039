//! Adapter for Places API (New), the service behind the browser Maps SDK.
//!
//! Nearby search returns at most 20 places and has no continuation tokens,
//! so every search is a single page.

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use super::{decode, is_direct_url, PlacesTransport};
use crate::error::PlacesError;
use crate::models::{Candidate, Coordinates, Page, PageRequest, PlaceDetails, Review, Suggestion};

pub const PLACES_V1_API: &str = "https://places.googleapis.com/v1";

const MAX_RESULT_COUNT: u32 = 20;

const NEARBY_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location,\
places.rating,places.priceLevel,places.photos,places.currentOpeningHours.openNow,\
places.types,places.nationalPhoneNumber";

const DETAILS_FIELD_MASK: &str =
    "id,displayName,formattedAddress,location,nationalPhoneNumber,websiteUri,rating,reviews";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    places: Vec<V1Place>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Place {
    id: Option<String>,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    location: Option<V1LatLng>,
    rating: Option<f64>,
    price_level: Option<String>,
    #[serde(default)]
    photos: Vec<V1Photo>,
    current_opening_hours: Option<V1OpeningHours>,
    #[serde(default)]
    types: Vec<String>,
    national_phone_number: Option<String>,
    website_uri: Option<String>,
    #[serde(default)]
    reviews: Vec<V1Review>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct V1LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct V1Photo {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1OpeningHours {
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Review {
    author_attribution: Option<AuthorAttribution>,
    rating: Option<f64>,
    text: Option<LocalizedText>,
    relative_publish_time_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorAttribution {
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<V1Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Suggestion {
    place_prediction: Option<PlacePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacePrediction {
    place_id: String,
    text: LocalizedText,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

fn price_level(level: &str) -> Option<u8> {
    match level {
        "PRICE_LEVEL_INEXPENSIVE" => Some(1),
        "PRICE_LEVEL_MODERATE" => Some(2),
        "PRICE_LEVEL_EXPENSIVE" => Some(3),
        "PRICE_LEVEL_VERY_EXPENSIVE" => Some(4),
        _ => None,
    }
}

impl V1Place {
    fn into_candidate(self) -> Option<Candidate> {
        let id = self.id?;
        let location = self.location?;
        Some(Candidate {
            id,
            name: self.display_name.map(|n| n.text).unwrap_or_default(),
            address: self.formatted_address.unwrap_or_default(),
            coordinates: Coordinates::new(location.latitude, location.longitude),
            rating: self.rating,
            price_level: self.price_level.as_deref().and_then(price_level),
            photo_reference: self.photos.into_iter().next().map(|p| p.name),
            is_open_now: self.current_opening_hours.and_then(|h| h.open_now),
            phone: self.national_phone_number,
            categories: self.types,
        })
    }

    fn into_details(self) -> PlaceDetails {
        PlaceDetails {
            id: self.id.unwrap_or_default(),
            name: self.display_name.map(|n| n.text).unwrap_or_default(),
            address: self.formatted_address.unwrap_or_default(),
            coordinates: self
                .location
                .map(|l| Coordinates::new(l.latitude, l.longitude)),
            phone: self.national_phone_number,
            website: self.website_uri,
            rating: self.rating.unwrap_or(0.0).max(0.0),
            reviews: self
                .reviews
                .into_iter()
                .map(|r| Review {
                    author: r.author_attribution.map(|a| a.display_name).unwrap_or_default(),
                    rating: r.rating.unwrap_or(0.0),
                    text: r.text.map(|t| t.text).unwrap_or_default(),
                    relative_time: r.relative_publish_time_description,
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct PlacesV1Transport {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl PlacesV1Transport {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self::with_base_url(client, api_key, PLACES_V1_API)
    }

    pub fn with_base_url(client: Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder, field_mask: &str) -> RequestBuilder {
        request
            .header("X-Goog-Api-Key", self.api_key.as_deref().unwrap_or_default())
            .header("X-Goog-FieldMask", field_mask)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, PlacesError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }
        error!("Places API v1 answered HTTP {}: {}", status, body);
        Err(match decode::<ErrorEnvelope>(&body) {
            Ok(envelope) => PlacesError::provider(envelope.error.status, envelope.error.message),
            Err(_) => PlacesError::provider(status.as_str(), body),
        })
    }
}

#[async_trait]
impl PlacesTransport for PlacesV1Transport {
    fn name(&self) -> &'static str {
        "places-v1"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, PlacesError> {
        if request.page_token.is_some() {
            debug!("Places API v1 has no continuation pages");
            return Ok(Page::default());
        }

        let body = json!({
            "includedTypes": [request.category],
            "maxResultCount": MAX_RESULT_COUNT,
            "locationRestriction": {
                "circle": {
                    "center": {
                        "latitude": request.center.latitude,
                        "longitude": request.center.longitude,
                    },
                    "radius": f64::from(request.radius),
                }
            }
        });

        let url = format!("{}/places:searchNearby", self.base_url);
        let text = self
            .send(self.authorized(self.client.post(&url), NEARBY_FIELD_MASK).json(&body))
            .await?;
        let response: SearchResponse = decode(&text)?;

        let candidates: Vec<Candidate> = response
            .places
            .into_iter()
            .filter_map(V1Place::into_candidate)
            .collect();
        info!("Places API v1 nearby search returned {} results", candidates.len());

        Ok(Page {
            candidates,
            next_page_token: None,
        })
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PlacesError> {
        info!("Geocoding via text search: {}", address);
        let url = format!("{}/places:searchText", self.base_url);
        let text = self
            .send(
                self.authorized(self.client.post(&url), "places.id,places.location")
                    .json(&json!({ "textQuery": address, "pageSize": 1 })),
            )
            .await?;
        let response: SearchResponse = decode(&text)?;
        Ok(response
            .places
            .into_iter()
            .find_map(|p| p.location)
            .map(|l| Coordinates::new(l.latitude, l.longitude)))
    }

    async fn autocomplete(&self, input: &str) -> Result<Vec<Suggestion>, PlacesError> {
        debug!("Autocomplete for: {}", input);
        let url = format!("{}/places:autocomplete", self.base_url);
        let text = self
            .send(
                self.authorized(self.client.post(&url), "*")
                    .json(&json!({ "input": input, "includedPrimaryTypes": ["restaurant"] })),
            )
            .await?;
        let response: AutocompleteResponse = decode(&text)?;
        Ok(response
            .suggestions
            .into_iter()
            .filter_map(|s| s.place_prediction)
            .map(|p| Suggestion {
                place_id: p.place_id,
                description: p.text.text,
            })
            .collect())
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        info!("Getting place details for: {}", place_id);
        let url = format!("{}/places/{}", self.base_url, place_id);
        match self.send(self.authorized(self.client.get(&url), DETAILS_FIELD_MASK)).await {
            Ok(text) => Ok(Some(decode::<V1Place>(&text)?.into_details())),
            Err(PlacesError::Provider { status, .. }) if status == "NOT_FOUND" => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn photo_url(&self, reference: &str, max_width: u32) -> Result<Option<String>, PlacesError> {
        if is_direct_url(reference) {
            return Ok(Some(reference.to_string()));
        }
        let Some(key) = &self.api_key else {
            return Ok(None);
        };
        let url = url::Url::parse_with_params(
            &format!("{}/{}/media", self.base_url, reference),
            &[("maxWidthPx", max_width.to_string()), ("key", key.clone())],
        )?;
        Ok(Some(url.to_string()))
    }
}
