use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::wire::{AutocompleteResponse, DetailsResponse, GeocodeResponse, NearbyResponse};
use super::{decode, is_direct_url, PlacesTransport};
use crate::error::PlacesError;
use crate::models::{Coordinates, Page, PageRequest, PlaceDetails, Suggestion};

/// Client for our own backend proxy, which holds the provider credential
/// and passes legacy Places responses through.
#[derive(Clone)]
pub struct ProxyTransport {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    error: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoResponse {
    photo_url: Option<String>,
}

impl ProxyTransport {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url, PlacesError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| PlacesError::Decode(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "places"])
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, PlacesError> {
        debug!("Requesting proxy {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }
        error!("Proxy answered HTTP {}: {}", status, body);
        Err(match decode::<ProxyErrorBody>(&body) {
            Ok(e) => PlacesError::provider(
                format!("HTTP {}", status.as_u16()),
                e.message.map_or(e.error.clone(), |m| format!("{}: {}", e.error, m)),
            ),
            Err(_) => PlacesError::provider(format!("HTTP {}", status.as_u16()), body),
        })
    }
}

#[async_trait]
impl PlacesTransport for ProxyTransport {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, PlacesError> {
        let latitude = request.center.latitude.to_string();
        let longitude = request.center.longitude.to_string();
        let radius = request.radius.to_string();
        let url = match &request.page_token {
            Some(token) => self.url(&["nearby"], &[("pagetoken", token.as_str())])?,
            None => self.url(
                &["nearby"],
                &[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("radius", radius.as_str()),
                    ("type", request.category.as_str()),
                ],
            )?,
        };

        let body = self.get_text(url).await?;
        let page = decode::<NearbyResponse>(&body)?.into_page(request.page_token.is_some())?;
        info!("Proxy nearby search returned {} results", page.candidates.len());
        Ok(page)
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PlacesError> {
        let url = self.url(&["geocode"], &[("address", address)])?;
        let body = self.get_text(url).await?;
        decode::<GeocodeResponse>(&body)?.into_coordinates()
    }

    async fn autocomplete(&self, input: &str) -> Result<Vec<Suggestion>, PlacesError> {
        let url = self.url(&["autocomplete"], &[("input", input), ("types", "establishment")])?;
        let body = self.get_text(url).await?;
        decode::<AutocompleteResponse>(&body)?.into_suggestions()
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        let url = self.url(&["details", place_id], &[])?;
        let body = self.get_text(url).await?;
        decode::<DetailsResponse>(&body)?.into_details()
    }

    async fn photo_url(&self, reference: &str, max_width: u32) -> Result<Option<String>, PlacesError> {
        if is_direct_url(reference) {
            return Ok(Some(reference.to_string()));
        }
        let url = self.url(&["photo", reference], &[("maxwidth", max_width.to_string().as_str())])?;
        let body = self.get_text(url).await?;
        Ok(decode::<PhotoResponse>(&body)?.photo_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let proxy = ProxyTransport::new(Client::new(), "http://localhost:3000/");
        let url = proxy
            .url(&["nearby"], &[("latitude", "40.85"), ("longitude", "14.27")])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/places/nearby?latitude=40.85&longitude=14.27");
    }

    #[test]
    fn test_path_segments_are_escaped() {
        let proxy = ProxyTransport::new(Client::new(), "https://api.example.com/backend");
        let url = proxy.url(&["details", "a/b c"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/backend/api/places/details/a%2Fb%20c");
    }

    #[test]
    fn test_blank_base_url_is_not_configured() {
        assert!(!ProxyTransport::new(Client::new(), "  ").is_configured());
        assert!(ProxyTransport::new(Client::new(), "http://localhost:3000").is_configured());
    }
}
