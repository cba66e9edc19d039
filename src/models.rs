use serde::{Deserialize, Serialize};

pub const DEFAULT_RADIUS_M: u32 = 2_000;
pub const MIN_RADIUS_M: u32 = 1;
pub const MAX_RADIUS_M: u32 = 50_000;
pub const DEFAULT_RESULT_CAP: usize = 60;

/// Cuisine value that disables cuisine filtering.
pub const ALL_CUISINES: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A discovered restaurant.
///
/// `rating` is never negative; `0.0` means the provider has no rating for
/// the place. `cuisine_type` is always derived locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub rating: f64,
    pub price_level: Option<u8>,
    pub photo_reference: Option<String>,
    pub is_open_now: Option<bool>,
    pub cuisine_type: String,
    pub phone: Option<String>,
}

/// A provider result converted to canonical fields, not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub photo_reference: Option<String>,
    pub is_open_now: Option<bool>,
    pub phone: Option<String>,
    pub categories: Vec<String>,
}

impl Candidate {
    pub fn into_place(self, cuisine_type: String) -> Place {
        Place {
            id: self.id,
            name: self.name,
            address: self.address,
            coordinates: self.coordinates,
            rating: self.rating.unwrap_or(0.0).max(0.0),
            price_level: self.price_level.filter(|level| (1..=4).contains(level)),
            photo_reference: self.photo_reference,
            is_open_now: self.is_open_now,
            cuisine_type,
            phone: self.phone,
        }
    }
}

/// One page of provider results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub candidates: Vec<Candidate>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub center: Coordinates,
    pub radius: u32,
    pub cap: usize,
    pub page_token: Option<String>,
}

impl SearchQuery {
    pub fn new(latitude: f64, longitude: f64, radius: u32, cap: usize) -> Self {
        Self {
            center: Coordinates::new(latitude, longitude),
            radius: clamp_radius(radius),
            cap,
            page_token: None,
        }
    }

    pub fn cache_key(&self) -> String {
        crate::cache::search_key(self.center.latitude, self.center.longitude, self.radius, self.cap)
    }
}

pub fn clamp_radius(radius: u32) -> u32 {
    radius.clamp(MIN_RADIUS_M, MAX_RADIUS_M)
}

/// A single provider request issued by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub center: Coordinates,
    pub radius: u32,
    pub category: String,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Rating,
    #[default]
    Distance,
    Price,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rating" => Ok(Self::Rating),
            "distance" => Ok(Self::Distance),
            "price" => Ok(Self::Price),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub cuisine_types: Vec<String>,
    pub price_range: (u8, u8),
    pub min_rating: f64,
    pub max_distance: f64,
    pub show_only_open: bool,
    pub sort_by: SortKey,
    pub search_text: Option<String>,
    pub location_query: Option<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            cuisine_types: vec![ALL_CUISINES.to_string()],
            price_range: (1, 4),
            min_rating: 0.0,
            max_distance: f64::from(MAX_RADIUS_M),
            show_only_open: false,
            sort_by: SortKey::Distance,
            search_text: None,
            location_query: None,
        }
    }
}

/// A place annotated with its distance from the filter's reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlace {
    #[serde(flatten)]
    pub place: Place,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub place_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub author: String,
    pub rating: f64,
    pub text: String,
    pub relative_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: f64,
    pub reviews: Vec<Review>,
}
