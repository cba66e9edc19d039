pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod logging;
pub mod lookup;
pub mod mock;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod server;

pub use cache::TtlCache;
pub use config::Config;
pub use error::PlacesError;
pub use filter::apply_filters;
pub use models::{Coordinates, FilterCriteria, Place, RankedPlace, SearchQuery, SortKey};
pub use pipeline::{NearbySearch, SearchPolicy};
pub use provider::PlacesTransport;
