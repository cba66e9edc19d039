//! Response shapes of the legacy Google Places web service.
//!
//! Used by the direct adapter and by the proxy adapter, since the proxy
//! passes provider responses through unchanged.

use serde::Deserialize;

use crate::error::PlacesError;
use crate::models::{Candidate, Coordinates, Page, PlaceDetails, Review, Suggestion};

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";
pub const STATUS_INVALID_REQUEST: &str = "INVALID_REQUEST";

#[derive(Debug, Deserialize)]
pub struct NearbyResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<WirePlace>,
    pub next_page_token: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: String,
    pub result: Option<WirePlace>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteResponse {
    pub status: String,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub place_id: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct WirePlace {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub vicinity: Option<String>,
    pub formatted_address: Option<String>,
    pub geometry: Option<Geometry>,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    #[serde(default)]
    pub photos: Vec<WirePhoto>,
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub types: Vec<String>,
    pub formatted_phone_number: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct WirePhoto {
    pub photo_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct WireReview {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub text: String,
    pub relative_time_description: Option<String>,
}

/// Map a provider status to an error. `INVALID_REQUEST` on a continuation
/// request means the page token has not propagated yet.
pub fn check_status(status: &str, error_message: Option<&str>, continuation: bool) -> Result<(), PlacesError> {
    match status {
        STATUS_OK | STATUS_ZERO_RESULTS => Ok(()),
        STATUS_INVALID_REQUEST if continuation => Err(PlacesError::TokenNotReady),
        other => Err(PlacesError::provider(other, error_message.unwrap_or("no error message"))),
    }
}

impl NearbyResponse {
    pub fn into_page(self, continuation: bool) -> Result<Page, PlacesError> {
        check_status(&self.status, self.error_message.as_deref(), continuation)?;
        Ok(Page {
            candidates: self.results.into_iter().filter_map(WirePlace::into_candidate).collect(),
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

impl DetailsResponse {
    pub fn into_details(self) -> Result<Option<PlaceDetails>, PlacesError> {
        if self.status == "NOT_FOUND" {
            return Ok(None);
        }
        check_status(&self.status, self.error_message.as_deref(), false)?;
        Ok(self.result.map(WirePlace::into_details))
    }
}

impl AutocompleteResponse {
    pub fn into_suggestions(self) -> Result<Vec<Suggestion>, PlacesError> {
        check_status(&self.status, self.error_message.as_deref(), false)?;
        Ok(self
            .predictions
            .into_iter()
            .map(|p| Suggestion {
                place_id: p.place_id,
                description: p.description,
            })
            .collect())
    }
}

impl GeocodeResponse {
    pub fn into_coordinates(self) -> Result<Option<Coordinates>, PlacesError> {
        check_status(&self.status, self.error_message.as_deref(), false)?;
        Ok(self
            .results
            .into_iter()
            .next()
            .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng)))
    }
}

impl WirePlace {
    /// Results without an id or a location cannot be shown on a map and are dropped.
    pub fn into_candidate(self) -> Option<Candidate> {
        let id = self.place_id?;
        let location = self.geometry?.location;
        Some(Candidate {
            id,
            name: self.name.unwrap_or_default(),
            address: self.vicinity.or(self.formatted_address).unwrap_or_default(),
            coordinates: Coordinates::new(location.lat, location.lng),
            rating: self.rating,
            price_level: self.price_level,
            photo_reference: self.photos.into_iter().next().map(|p| p.photo_reference),
            is_open_now: self.opening_hours.and_then(|h| h.open_now),
            phone: self.formatted_phone_number.or(self.international_phone_number),
            categories: self.types,
        })
    }

    fn into_details(self) -> PlaceDetails {
        PlaceDetails {
            id: self.place_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            address: self.formatted_address.or(self.vicinity).unwrap_or_default(),
            coordinates: self
                .geometry
                .map(|g| Coordinates::new(g.location.lat, g.location.lng)),
            phone: self.formatted_phone_number.or(self.international_phone_number),
            website: self.website,
            rating: self.rating.unwrap_or(0.0).max(0.0),
            reviews: self
                .reviews
                .into_iter()
                .map(|r| Review {
                    author: r.author_name,
                    rating: r.rating,
                    text: r.text,
                    relative_time: r.relative_time_description,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nearby(body: serde_json::Value) -> NearbyResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_nearby_page_conversion() {
        let response = nearby(json!({
            "status": "OK",
            "next_page_token": "tok-2",
            "results": [
                {
                    "place_id": "p1",
                    "name": "Pizzeria Starita",
                    "vicinity": "Via Materdei 27, Napoli",
                    "geometry": { "location": { "lat": 40.8585, "lng": 14.2499 } },
                    "rating": 4.6,
                    "price_level": 1,
                    "photos": [{ "photo_reference": "ref-1", "height": 10, "width": 10 }],
                    "opening_hours": { "open_now": true },
                    "types": ["restaurant", "food", "point_of_interest"]
                },
                { "place_id": "no-geometry", "name": "Ghost" }
            ]
        }));

        let page = response.into_page(false).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok-2"));
        assert_eq!(page.candidates.len(), 1);

        let first = &page.candidates[0];
        assert_eq!(first.id, "p1");
        assert_eq!(first.address, "Via Materdei 27, Napoli");
        assert_eq!(first.photo_reference.as_deref(), Some("ref-1"));
        assert_eq!(first.is_open_now, Some(true));
        assert_eq!(first.categories[0], "restaurant");
    }

    #[test]
    fn test_zero_results_is_an_empty_page() {
        let page = nearby(json!({ "status": "ZERO_RESULTS", "results": [] }))
            .into_page(false)
            .unwrap();
        assert!(page.candidates.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_invalid_request_on_continuation_is_token_not_ready() {
        let err = nearby(json!({ "status": "INVALID_REQUEST" })).into_page(true).unwrap_err();
        assert!(matches!(err, PlacesError::TokenNotReady));

        let err = nearby(json!({ "status": "INVALID_REQUEST" })).into_page(false).unwrap_err();
        assert!(matches!(err, PlacesError::Provider { .. }));
    }

    #[test]
    fn test_denied_carries_message() {
        let err = nearby(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        }))
        .into_page(false)
        .unwrap_err();
        match err {
            PlacesError::Provider { status, message } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_details_conversion() {
        let response: DetailsResponse = serde_json::from_value(json!({
            "status": "OK",
            "result": {
                "place_id": "p1",
                "name": "Da Michele",
                "formatted_address": "Via Cesare Sersale 1, 80139 Napoli NA, Italy",
                "formatted_phone_number": "081 553 9204",
                "geometry": { "location": { "lat": 40.8497, "lng": 14.2633 } },
                "rating": 4.5,
                "reviews": [
                    { "author_name": "Anna", "rating": 5, "text": "Best marinara", "relative_time_description": "a week ago" }
                ]
            }
        }))
        .unwrap();

        let details = response.into_details().unwrap().unwrap();
        assert_eq!(details.phone.as_deref(), Some("081 553 9204"));
        assert_eq!(details.reviews.len(), 1);
        assert_eq!(details.reviews[0].author, "Anna");
    }

    #[test]
    fn test_geocode_takes_first_result() {
        let response: GeocodeResponse = serde_json::from_value(json!({
            "status": "OK",
            "results": [
                { "geometry": { "location": { "lat": 40.85, "lng": 14.27 } } },
                { "geometry": { "location": { "lat": 1.0, "lng": 1.0 } } }
            ]
        }))
        .unwrap();
        assert_eq!(response.into_coordinates().unwrap(), Some(Coordinates::new(40.85, 14.27)));
    }
}
