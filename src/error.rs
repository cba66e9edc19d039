use thiserror::Error;

/// Failures reported by a places transport.
///
/// None of these escape the search pipeline; they decide how it recovers.
#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("continuation token is not valid yet")]
    TokenNotReady,

    #[error("provider returned {status}: {message}")]
    Provider { status: String, message: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

// reqwest errors print the request url, which carries the api key.
impl From<reqwest::Error> for PlacesError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.without_url())
    }
}

impl PlacesError {
    pub fn provider(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened before the provider answered at all.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_) | Self::Url(_))
    }
}
