//! Backend proxy over Google Places.
//!
//! Keeps the provider credential server-side, caches passthrough responses
//! for the cache TTL and exposes the nearby search pipeline itself.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError, Scope};
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::cache::TtlCache;
use crate::filter::apply_filters;
use crate::models::{
    clamp_radius, Coordinates, FilterCriteria, SortKey, ALL_CUISINES, DEFAULT_RADIUS_M, DEFAULT_RESULT_CAP,
};
use crate::pipeline::NearbySearch;
use crate::provider::google::{DETAILS_FIELDS, GOOGLE_MAPS_API};

/// 500 requests per 15 minutes per IP for the whole server.
pub const GLOBAL_BURST: u32 = 500;
pub const GLOBAL_REPLENISH_MS: u64 = 15 * 60 * 1000 / GLOBAL_BURST as u64;
/// 300 requests per 15 minutes per IP on `/api/places`.
pub const PLACES_BURST: u32 = 300;
pub const PLACES_REPLENISH_MS: u64 = 15 * 60 * 1000 / PLACES_BURST as u64;

const DEFAULT_PHOTO_WIDTH: u32 = 400;

#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Google Places API key not configured")]
    MissingApiKey,

    #[error("{0}")]
    Upstream(String),

    /// The provider answered with a non-OK status. Passed through to the
    /// client but never cached.
    #[error("provider reported an error status")]
    ProviderStatus(Value),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) | Self::ProviderStatus(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            Self::BadRequest(_) => "Invalid request",
            Self::MissingApiKey => "Server misconfigured",
            Self::Upstream(_) | Self::ProviderStatus(_) => "Upstream request failed",
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error.to_string(),
            message: Some(self.to_string()),
        })
    }
}

pub struct AppState {
    client: Client,
    api_key: Option<String>,
    upstream_base: String,
    responses: TtlCache<Value, ProxyError>,
    finder: NearbySearch,
}

impl AppState {
    pub fn new(client: Client, api_key: Option<String>, cache_ttl: std::time::Duration, finder: NearbySearch) -> Self {
        Self::with_upstream(client, api_key, GOOGLE_MAPS_API, cache_ttl, finder)
    }

    pub fn with_upstream(
        client: Client,
        api_key: Option<String>,
        upstream_base: impl Into<String>,
        cache_ttl: std::time::Duration,
        finder: NearbySearch,
    ) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            upstream_base: upstream_base.into().trim_end_matches('/').to_string(),
            responses: TtlCache::new(cache_ttl),
            finder,
        }
    }

    fn upstream_url(&self, path: &str, params: &[(&str, String)]) -> Result<(String, Url), ProxyError> {
        let key = self.api_key.as_deref().ok_or(ProxyError::MissingApiKey)?;
        let mut url = Url::parse_with_params(&format!("{}/{}", self.upstream_base, path), params)
            .map_err(|e| ProxyError::BadRequest(e.to_string()))?;
        let cache_key = url.to_string();
        url.query_pairs_mut().append_pair("key", key);
        Ok((cache_key, url))
    }

    /// Fetch a provider JSON response through the cache.
    async fn passthrough(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProxyError> {
        let (cache_key, url) = self.upstream_url(path, params)?;
        let client = self.client.clone();
        match self
            .responses
            .fetch_or_load(&cache_key, move || fetch_json(client, url))
            .await
        {
            Err(ProxyError::ProviderStatus(body)) => Ok(body),
            other => other,
        }
    }
}

async fn fetch_json(client: Client, url: Url) -> Result<Value, ProxyError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(e.without_url().to_string()))?;
    let status = response.status();
    if !status.is_success() {
        error!("Google Places API answered HTTP {}", status);
        return Err(ProxyError::Upstream(format!("provider answered HTTP {}", status.as_u16())));
    }
    let body: Value = response
        .json()
        .await
        .map_err(|e| ProxyError::Upstream(e.without_url().to_string()))?;

    match body["status"].as_str() {
        None | Some("OK") | Some("ZERO_RESULTS") => Ok(body),
        Some(other) => {
            warn!("Google Places API status {}: {}", other, body["error_message"]);
            Err(ProxyError::ProviderStatus(body))
        }
    }
}

/// Resolve a photo reference to the image URL the provider redirects to,
/// so the credential never reaches the client.
async fn resolve_photo(client: Client, url: Url) -> Result<Value, ProxyError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(e.without_url().to_string()))?;
    if !response.status().is_success() {
        return Err(ProxyError::Upstream(format!(
            "photo lookup answered HTTP {}",
            response.status().as_u16()
        )));
    }
    let resolved = response.url();
    if resolved.query_pairs().any(|(k, _)| k == "key") {
        return Err(ProxyError::Upstream("photo was not redirected to a public url".to_string()));
    }
    info!("Resolved photo to {}", resolved.host_str().unwrap_or_default());
    Ok(json!({ "photoUrl": resolved.as_str() }))
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<u32>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    pagetoken: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsParams {
    fields: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoParams {
    maxwidth: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    input: Option<String>,
    types: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeParams {
    address: Option<String>,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantParams {
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<String>,
    radius: Option<u32>,
    limit: Option<usize>,
    cuisine: Option<String>,
    min_price: Option<u8>,
    max_price: Option<u8>,
    min_rating: Option<f64>,
    max_distance: Option<f64>,
    open_now: Option<bool>,
    sort_by: Option<String>,
    q: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn nearby(state: web::Data<AppState>, params: web::Query<NearbyParams>) -> Result<HttpResponse, ProxyError> {
    let params = params.into_inner();
    let query: Vec<(&str, String)> = match non_empty(params.pagetoken) {
        Some(token) => vec![("pagetoken", token)],
        None => {
            let (Some(latitude), Some(longitude)) = (params.latitude, params.longitude) else {
                return Err(ProxyError::BadRequest("latitude and longitude are required".to_string()));
            };
            vec![
                ("location", format!("{latitude},{longitude}")),
                ("radius", clamp_radius(params.radius.unwrap_or(DEFAULT_RADIUS_M)).to_string()),
                ("type", non_empty(params.place_type).unwrap_or_else(|| "restaurant".to_string())),
            ]
        }
    };

    let body = state.passthrough("place/nearbysearch/json", &query).await?;
    Ok(HttpResponse::Ok().json(body))
}

async fn details(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DetailsParams>,
) -> Result<HttpResponse, ProxyError> {
    let place_id = path.into_inner();
    let fields = non_empty(params.into_inner().fields).unwrap_or_else(|| DETAILS_FIELDS.to_string());
    let body = state
        .passthrough("place/details/json", &[("place_id", place_id), ("fields", fields)])
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

async fn photo(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PhotoParams>,
) -> Result<HttpResponse, ProxyError> {
    let reference = path.into_inner();
    let max_width = params.maxwidth.unwrap_or(DEFAULT_PHOTO_WIDTH).clamp(1, 1600);
    let (cache_key, url) = state.upstream_url(
        "place/photo",
        &[("maxwidth", max_width.to_string()), ("photo_reference", reference)],
    )?;
    let client = state.client.clone();
    let body = state
        .responses
        .fetch_or_load(&cache_key, move || resolve_photo(client, url))
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

async fn autocomplete(
    state: web::Data<AppState>,
    params: web::Query<AutocompleteParams>,
) -> Result<HttpResponse, ProxyError> {
    let params = params.into_inner();
    let input = non_empty(params.input).ok_or_else(|| ProxyError::BadRequest("input is required".to_string()))?;
    let mut query = vec![("input", input)];
    if let Some(types) = non_empty(params.types) {
        query.push(("types", types));
    }
    let body = state.passthrough("place/autocomplete/json", &query).await?;
    Ok(HttpResponse::Ok().json(body))
}

async fn geocode(state: web::Data<AppState>, params: web::Query<GeocodeParams>) -> Result<HttpResponse, ProxyError> {
    let params = params.into_inner();
    let query = match (non_empty(params.address), non_empty(params.place_id)) {
        (_, Some(place_id)) => vec![("place_id", place_id)],
        (Some(address), None) => vec![("address", address)],
        (None, None) => return Err(ProxyError::BadRequest("address or placeId is required".to_string())),
    };
    let body = state.passthrough("geocode/json", &query).await?;
    Ok(HttpResponse::Ok().json(body))
}

async fn restaurants(
    state: web::Data<AppState>,
    params: web::Query<RestaurantParams>,
) -> Result<HttpResponse, ProxyError> {
    let request_id = chrono::Utc::now().format("%Y%m%d%H%M%S%f").to_string();
    let params = params.into_inner();
    debug!("Request {}: restaurant search {:?}", request_id, params);

    let center = match (params.latitude, params.longitude) {
        (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude),
        _ => {
            let location = non_empty(params.location.clone())
                .ok_or_else(|| ProxyError::BadRequest("latitude/longitude or location is required".to_string()))?;
            state.finder.geocode(&location).await.ok_or_else(|| {
                warn!("Request {}: could not geocode '{}'", request_id, location);
                ProxyError::BadRequest(format!("could not resolve location '{location}'"))
            })?
        }
    };

    let sort_by = match params.sort_by.as_deref() {
        Some(raw) => raw.parse::<SortKey>().map_err(ProxyError::BadRequest)?,
        None => SortKey::default(),
    };
    let cuisine_types: Vec<String> = params
        .cuisine
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect()
        })
        .filter(|list: &Vec<String>| !list.is_empty())
        .unwrap_or_else(|| vec![ALL_CUISINES.to_string()]);

    let defaults = FilterCriteria::default();
    let criteria = FilterCriteria {
        cuisine_types,
        price_range: (
            params.min_price.unwrap_or(defaults.price_range.0).clamp(1, 4),
            params.max_price.unwrap_or(defaults.price_range.1).clamp(1, 4),
        ),
        min_rating: params.min_rating.unwrap_or(defaults.min_rating),
        max_distance: params.max_distance.unwrap_or(defaults.max_distance),
        show_only_open: params.open_now.unwrap_or(false),
        sort_by,
        search_text: non_empty(params.q),
        location_query: params.location,
    };

    let results = state
        .finder
        .search(
            center.latitude,
            center.longitude,
            params.radius.unwrap_or(DEFAULT_RADIUS_M),
            params.limit.unwrap_or(DEFAULT_RESULT_CAP),
        )
        .await;
    let ranked = apply_filters(&results, center, &criteria);
    info!(
        "Request {}: {} of {} places match the filters",
        request_id,
        ranked.len(),
        results.len()
    );

    Ok(HttpResponse::Ok().json(json!({
        "center": center,
        "count": ranked.len(),
        "results": ranked,
    })))
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Not found".to_string(),
        message: Some(format!("no route for {}", req.path())),
    })
}

/// Routes outside the places proxy, plus JSON errors for bad query strings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default().error_handler(|err, _req| ProxyError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health))
    .route("/api/restaurants/nearby", web::get().to(restaurants));
}

/// The `/api/places` passthrough routes. Wrap with the stricter rate limit.
pub fn places_scope() -> Scope {
    web::scope("/api/places")
        .route("/nearby", web::get().to(nearby))
        .route("/details/{place_id}", web::get().to(details))
        .route("/photo/{photo_reference}", web::get().to(photo))
        .route("/autocomplete", web::get().to(autocomplete))
        .route("/geocode", web::get().to(geocode))
}
