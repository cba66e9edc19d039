//! Static restaurant catalog used when no provider credential is set.
//!
//! The entries are clustered around central Naples, so queries far from the
//! city or with a very wide radius return the whole catalog instead of an
//! empty list.

use std::time::Duration;

use log::{debug, info};

use crate::geo::distance_meters;
use crate::models::{Coordinates, Place};

pub const CATALOG_CENTER: Coordinates = Coordinates {
    latitude: 40.8518,
    longitude: 14.2681,
};
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

const FAR_FROM_CENTER_M: f64 = 5_000.0;
const WIDE_RADIUS_M: u32 = 20_000;

struct MockEntry {
    id: &'static str,
    name: &'static str,
    address: &'static str,
    latitude: f64,
    longitude: f64,
    rating: f64,
    price_level: u8,
    is_open_now: bool,
    cuisine_type: &'static str,
    phone: &'static str,
    photo: Option<&'static str>,
}

const ENTRIES: &[MockEntry] = &[
    MockEntry {
        id: "mock_sorbillo",
        name: "Gino e Toto Sorbillo",
        address: "Via dei Tribunali 32, 80138 Napoli",
        latitude: 40.8507,
        longitude: 14.2565,
        rating: 4.8,
        price_level: 1,
        is_open_now: true,
        cuisine_type: "Pizzeria",
        phone: "+39 081 446643",
        photo: Some("https://images.unsplash.com/photo-1513104890138-7c749659a591"),
    },
    MockEntry {
        id: "mock_tandem",
        name: "Tandem Ragù",
        address: "Via Giovanni Paladino 51, 80138 Napoli",
        latitude: 40.8478,
        longitude: 14.2560,
        rating: 4.7,
        price_level: 2,
        is_open_now: true,
        cuisine_type: "Italiano",
        phone: "+39 081 19002468",
        photo: None,
    },
    MockEntry {
        id: "mock_da_michele",
        name: "L'Antica Pizzeria da Michele",
        address: "Via Cesare Sersale 1, 80139 Napoli",
        latitude: 40.8497,
        longitude: 14.2633,
        rating: 4.9,
        price_level: 1,
        is_open_now: true,
        cuisine_type: "Pizzeria",
        phone: "+39 081 5539204",
        photo: Some("https://images.unsplash.com/photo-1574071318508-1cdbab80d002"),
    },
    MockEntry {
        id: "mock_mattonella",
        name: "Osteria della Mattonella",
        address: "Via Giovanni Nicotera 13, 80132 Napoli",
        latitude: 40.8455,
        longitude: 14.2590,
        rating: 4.6,
        price_level: 2,
        is_open_now: false,
        cuisine_type: "Trattoria",
        phone: "+39 081 416541",
        photo: None,
    },
    MockEntry {
        id: "mock_sushi_bar",
        name: "Sushi Bar Partenope",
        address: "Corso Umberto I 150, 80138 Napoli",
        latitude: 40.8540,
        longitude: 14.2700,
        rating: 4.5,
        price_level: 3,
        is_open_now: true,
        cuisine_type: "Sushi",
        phone: "+39 081 5541122",
        photo: None,
    },
    MockEntry {
        id: "mock_caffe_toledo",
        name: "Caffè Toledo",
        address: "Via Toledo 210, 80134 Napoli",
        latitude: 40.8470,
        longitude: 14.2620,
        rating: 4.4,
        price_level: 2,
        is_open_now: true,
        cuisine_type: "Caffè",
        phone: "+39 081 5513760",
        photo: None,
    },
    MockEntry {
        id: "mock_poppella",
        name: "Pasticceria Poppella",
        address: "Via Arena della Sanità 28, 80137 Napoli",
        latitude: 40.8560,
        longitude: 14.2610,
        rating: 4.3,
        price_level: 1,
        is_open_now: false,
        cuisine_type: "Dessert",
        phone: "+39 081 455187",
        photo: None,
    },
    MockEntry {
        id: "mock_burger_garibaldi",
        name: "Garibaldi Burger Lab",
        address: "Piazza Garibaldi 40, 80142 Napoli",
        latitude: 40.8530,
        longitude: 14.2750,
        rating: 4.2,
        price_level: 2,
        is_open_now: true,
        cuisine_type: "Burger",
        phone: "+39 081 283911",
        photo: None,
    },
];

impl MockEntry {
    fn to_place(&self) -> Place {
        Place {
            id: self.id.to_string(),
            name: self.name.to_string(),
            address: self.address.to_string(),
            coordinates: Coordinates::new(self.latitude, self.longitude),
            rating: self.rating,
            price_level: Some(self.price_level),
            photo_reference: self.photo.map(String::from),
            is_open_now: Some(self.is_open_now),
            cuisine_type: self.cuisine_type.to_string(),
            phone: Some(self.phone.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockCatalog {
    latency: Duration,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl MockCatalog {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn len(&self) -> usize {
        ENTRIES.len()
    }

    pub fn is_empty(&self) -> bool {
        ENTRIES.is_empty()
    }

    /// Simulated nearby search. Never returns an empty list.
    pub async fn search(&self, latitude: f64, longitude: f64, radius: u32) -> Vec<Place> {
        tokio::time::sleep(self.latency).await;
        self.search_now(latitude, longitude, radius)
    }

    fn search_now(&self, latitude: f64, longitude: f64, radius: u32) -> Vec<Place> {
        let from_center = distance_meters(
            latitude,
            longitude,
            CATALOG_CENTER.latitude,
            CATALOG_CENTER.longitude,
        );

        if from_center > FAR_FROM_CENTER_M || radius > WIDE_RADIUS_M {
            info!(
                "Mock search {:.0}m from catalog center with radius {}m, returning full catalog",
                from_center, radius
            );
            return by_rating(ENTRIES.iter().map(MockEntry::to_place).collect());
        }

        let nearby: Vec<Place> = ENTRIES
            .iter()
            .filter(|e| distance_meters(latitude, longitude, e.latitude, e.longitude) <= f64::from(radius))
            .map(MockEntry::to_place)
            .collect();

        if nearby.is_empty() {
            debug!("No mock entries within {}m, returning full catalog", radius);
            return by_rating(ENTRIES.iter().map(MockEntry::to_place).collect());
        }

        debug!("Mock search matched {} entries within {}m", nearby.len(), radius);
        by_rating(nearby)
    }
}

fn by_rating(mut places: Vec<Place>) -> Vec<Place> {
    places.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    places
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(places: &[Place]) -> Vec<f64> {
        places.iter().map(|p| p.rating).collect()
    }

    #[test]
    fn test_center_query_returns_everything_sorted() {
        let places = MockCatalog::default().search_now(40.8522, 14.2681, 2000);
        assert_eq!(ratings(&places), vec![4.9, 4.8, 4.7, 4.6, 4.5, 4.4, 4.3, 4.2]);
    }

    #[test]
    fn test_small_radius_filters() {
        // Only the Corso Umberto entry sits within 300 m of this point.
        let places = MockCatalog::default().search_now(40.8522, 14.2681, 300);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, "mock_sushi_bar");
    }

    #[test]
    fn test_never_empty() {
        let catalog = MockCatalog::default();
        let queries = [
            (40.8522, 14.2681, 1),
            (51.5074, -0.1278, 500),
            (-33.8688, 151.2093, 50_000),
            (40.8522, 14.2681, 30_000),
            (0.0, 0.0, 1),
        ];
        for (lat, lng, radius) in queries {
            let places = catalog.search_now(lat, lng, radius);
            assert!(!places.is_empty(), "empty for {lat},{lng} r={radius}");
        }
    }

    #[test]
    fn test_far_query_returns_full_catalog() {
        let places = MockCatalog::default().search_now(45.4642, 9.19, 1000);
        assert_eq!(places.len(), ENTRIES.len());
        assert_eq!(places[0].rating, 4.9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_waits_for_latency() {
        let start = tokio::time::Instant::now();
        let places = MockCatalog::default().search(40.8522, 14.2681, 2000).await;
        assert_eq!(places.len(), 8);
        assert!(start.elapsed() >= DEFAULT_LATENCY);
    }
}
