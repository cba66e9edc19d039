use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn, LevelFilter};
use reqwest::Client;

use crate::cache::TtlCache;
use crate::mock::MockCatalog;
use crate::pipeline::{NearbySearch, SearchPolicy};
use crate::provider::{GoogleTransport, PlacesTransport, PlacesV1Transport, ProxyTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacesApi {
    Legacy,
    V1,
}

impl FromStr for PlacesApi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "" => Ok(Self::Legacy),
            "v1" | "new" => Ok(Self::V1),
            other => Err(format!("unknown places api: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub places_api: PlacesApi,
    pub use_backend_proxy: bool,
    pub backend_url: String,
    pub bind_address: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub mock_delay: Duration,
    pub http_timeout: Duration,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_api_key: None,
            places_api: PlacesApi::Legacy,
            use_backend_proxy: false,
            backend_url: "http://localhost:3000".to_string(),
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            cache_ttl: crate::cache::DEFAULT_TTL,
            mock_delay: crate::mock::DEFAULT_LATENCY,
            http_timeout: Duration::from_secs(15),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Read configuration from the environment (after `dotenv`).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            google_api_key: env::var("GOOGLE_PLACES_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
            places_api: parse_or("PLACES_API", defaults.places_api),
            use_backend_proxy: parse_bool("USE_BACKEND_PROXY"),
            backend_url: env::var("BACKEND_URL").unwrap_or(defaults.backend_url),
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parse_or("PORT", defaults.port),
            cache_ttl: Duration::from_secs(parse_or("CACHE_TTL_SECS", defaults.cache_ttl.as_secs())),
            mock_delay: Duration::from_millis(parse_or("MOCK_DELAY_MS", defaults.mock_delay.as_millis() as u64)),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", defaults.http_timeout.as_secs())),
            log_level: parse_or("LOG_LEVEL", defaults.log_level),
        }
    }

    pub fn http_client(&self) -> reqwest::Result<Client> {
        Client::builder().timeout(self.http_timeout).build()
    }

    /// Transport selected by the configuration. Proxy mode wins over a
    /// local credential since the backend holds its own.
    pub fn transport(&self, client: Client) -> Arc<dyn PlacesTransport> {
        if self.use_backend_proxy {
            return Arc::new(ProxyTransport::new(client, self.backend_url.clone()));
        }
        match self.places_api {
            PlacesApi::Legacy => Arc::new(GoogleTransport::new(client, self.google_api_key.clone())),
            PlacesApi::V1 => Arc::new(PlacesV1Transport::new(client, self.google_api_key.clone())),
        }
    }

    pub fn nearby_search(&self, client: Client) -> NearbySearch {
        let transport = self.transport(client);
        info!(
            "Nearby search via {} (live provider: {})",
            transport.name(),
            transport.is_configured()
        );
        NearbySearch::new(
            Some(transport),
            MockCatalog::new(self.mock_delay),
            Arc::new(TtlCache::new(self.cache_ttl)),
            SearchPolicy::default(),
        )
    }

    pub fn log_summary(&self) {
        let mut shown = BTreeMap::new();
        shown.insert(
            "GOOGLE_PLACES_API_KEY",
            self.google_api_key.as_deref().map_or("<unset>".to_string(), mask_api_key),
        );
        shown.insert("PLACES_API", format!("{:?}", self.places_api));
        shown.insert("USE_BACKEND_PROXY", self.use_backend_proxy.to_string());
        shown.insert("BACKEND_URL", self.backend_url.clone());
        shown.insert("BIND_ADDRESS", self.bind_address.clone());
        shown.insert("PORT", self.port.to_string());
        shown.insert("CACHE_TTL_SECS", self.cache_ttl.as_secs().to_string());
        shown.insert("MOCK_DELAY_MS", self.mock_delay.as_millis().to_string());
        shown.insert("LOG_LEVEL", self.log_level.to_string());
        info!("Configuration: {:?}", shown);
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {} value '{}': {}, using default", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

fn parse_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Keep the first five characters of a credential for log lines.
pub fn mask_api_key(key: &str) -> String {
    let visible: String = key.chars().take(5).collect();
    let hidden = key.chars().count().saturating_sub(5);
    format!("{}{}", visible, "*".repeat(hidden))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("AIzaSyABCDEF"), "AIzaS*******");
        assert_eq!(mask_api_key("abc"), "abc");
    }

    #[test]
    fn test_places_api_parse() {
        assert_eq!("V1".parse::<PlacesApi>(), Ok(PlacesApi::V1));
        assert_eq!("legacy".parse::<PlacesApi>(), Ok(PlacesApi::Legacy));
        assert!("soap".parse::<PlacesApi>().is_err());
    }

    #[test]
    fn test_transport_selection() {
        let mut config = Config::default();
        assert_eq!(config.transport(Client::new()).name(), "google");
        assert!(!config.transport(Client::new()).is_configured());

        config.google_api_key = Some("AIza-test".into());
        config.places_api = PlacesApi::V1;
        assert_eq!(config.transport(Client::new()).name(), "places-v1");

        config.use_backend_proxy = true;
        assert_eq!(config.transport(Client::new()).name(), "proxy");
    }
}
