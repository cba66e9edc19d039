use crate::geo::distance_between;
use crate::models::{Coordinates, FilterCriteria, Place, RankedPlace, SortKey, ALL_CUISINES};

/// Filter and sort `results` for display. The input is left untouched and
/// equal sort keys keep their input order.
pub fn apply_filters(results: &[Place], reference: Coordinates, criteria: &FilterCriteria) -> Vec<RankedPlace> {
    let search_text = criteria
        .search_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    let cuisines: Option<Vec<String>> = if criteria.cuisine_types.iter().any(|c| c == ALL_CUISINES) {
        None
    } else {
        Some(criteria.cuisine_types.iter().map(|c| c.to_lowercase()).collect())
    };
    let (min_price, max_price) = criteria.price_range;

    let mut ranked: Vec<RankedPlace> = results
        .iter()
        .map(|place| RankedPlace {
            distance: distance_between(reference, place.coordinates),
            place: place.clone(),
        })
        .filter(|r| match &search_text {
            Some(text) => matches_text(&r.place, text),
            None => true,
        })
        .filter(|r| match &cuisines {
            Some(wanted) => {
                let cuisine = r.place.cuisine_type.to_lowercase();
                wanted.iter().any(|w| cuisine.contains(w.as_str()))
            }
            None => true,
        })
        .filter(|r| {
            r.place
                .price_level
                .map_or(true, |level| (min_price..=max_price).contains(&level))
        })
        .filter(|r| r.place.rating >= criteria.min_rating)
        .filter(|r| !criteria.show_only_open || r.place.is_open_now == Some(true))
        .filter(|r| r.distance <= criteria.max_distance)
        .collect();

    match criteria.sort_by {
        SortKey::Rating => ranked.sort_by(|a, b| b.place.rating.total_cmp(&a.place.rating)),
        SortKey::Price => ranked.sort_by_key(|r| r.place.price_level.unwrap_or(1)),
        SortKey::Distance => ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance)),
    }

    ranked
}

fn matches_text(place: &Place, text: &str) -> bool {
    place.name.to_lowercase().contains(text)
        || place.address.to_lowercase().contains(text)
        || place.cuisine_type.to_lowercase().contains(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, cuisine: &str, rating: f64, lat: f64, lng: f64) -> Place {
        Place {
            id: id.into(),
            name: format!("Place {id}"),
            address: "Napoli".into(),
            coordinates: Coordinates::new(lat, lng),
            rating,
            price_level: Some(2),
            photo_reference: None,
            is_open_now: Some(true),
            cuisine_type: cuisine.into(),
            phone: None,
        }
    }

    fn naples() -> Coordinates {
        Coordinates::new(40.85, 14.27)
    }

    fn ids(ranked: &[RankedPlace]) -> Vec<&str> {
        ranked.iter().map(|r| r.place.id.as_str()).collect()
    }

    #[test]
    fn test_pizzeria_open_and_well_rated() {
        let results = vec![
            // ~2 km north
            place("match", "Pizzeria", 4.6, 40.868, 14.27),
            place("low-rated", "Pizzeria", 4.0, 40.851, 14.27),
            place("sushi", "Sushi", 4.8, 40.851, 14.27),
        ];
        let criteria = FilterCriteria {
            cuisine_types: vec!["Pizzeria".into()],
            price_range: (1, 4),
            min_rating: 4.5,
            max_distance: 5000.0,
            show_only_open: true,
            sort_by: SortKey::Rating,
            ..FilterCriteria::default()
        };

        let ranked = apply_filters(&results, naples(), &criteria);
        assert_eq!(ids(&ranked), vec!["match"]);
        assert!((ranked[0].distance - 2000.0).abs() < 50.0);
    }

    #[test]
    fn test_all_skips_cuisine_filter() {
        let results = vec![place("a", "Sushi", 4.0, 40.85, 14.27), place("b", "Kebab", 4.0, 40.85, 14.27)];
        let ranked = apply_filters(&results, naples(), &FilterCriteria::default());
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_cuisine_match_is_case_insensitive_substring() {
        let results = vec![place("a", "Pizzeria Napoletana", 4.0, 40.85, 14.27), place("b", "Sushi", 4.0, 40.85, 14.27)];
        let criteria = FilterCriteria {
            cuisine_types: vec!["pizzeria".into()],
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&results, naples(), &criteria)), vec!["a"]);
    }

    #[test]
    fn test_missing_price_is_never_excluded() {
        let mut unpriced = place("unpriced", "Bar", 4.0, 40.85, 14.27);
        unpriced.price_level = None;
        let mut pricey = place("pricey", "Bar", 4.0, 40.85, 14.27);
        pricey.price_level = Some(4);

        let criteria = FilterCriteria {
            price_range: (1, 2),
            ..FilterCriteria::default()
        };
        let ranked = apply_filters(&[unpriced, pricey], naples(), &criteria);
        assert_eq!(ids(&ranked), vec!["unpriced"]);
    }

    #[test]
    fn test_open_only_excludes_unknown_hours() {
        let mut unknown = place("unknown", "Bar", 4.0, 40.85, 14.27);
        unknown.is_open_now = None;
        let mut closed = place("closed", "Bar", 4.0, 40.85, 14.27);
        closed.is_open_now = Some(false);
        let open = place("open", "Bar", 4.0, 40.85, 14.27);

        let criteria = FilterCriteria {
            show_only_open: true,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&[unknown, closed, open], naples(), &criteria)), vec!["open"]);
    }

    #[test]
    fn test_free_text_matches_name_address_or_cuisine() {
        let mut by_address = place("addr", "Bar", 4.0, 40.85, 14.27);
        by_address.address = "Via Toledo 210".into();
        let by_cuisine = place("cuisine", "Trattoria", 4.0, 40.85, 14.27);
        let neither = place("none", "Sushi", 4.0, 40.85, 14.27);

        let criteria = FilterCriteria {
            search_text: Some("TOLEDO".into()),
            ..FilterCriteria::default()
        };
        let results = [by_address.clone(), by_cuisine.clone(), neither.clone()];
        assert_eq!(ids(&apply_filters(&results, naples(), &criteria)), vec!["addr"]);

        let criteria = FilterCriteria {
            search_text: Some("tratt".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&results, naples(), &criteria)), vec!["cuisine"]);
    }

    #[test]
    fn test_rating_sort_is_stable() {
        let results = vec![
            place("first", "Bar", 4.5, 40.85, 14.27),
            place("top", "Bar", 4.9, 40.86, 14.27),
            place("second", "Bar", 4.5, 40.87, 14.27),
        ];
        let criteria = FilterCriteria {
            sort_by: SortKey::Rating,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&results, naples(), &criteria)), vec!["top", "first", "second"]);
    }

    #[test]
    fn test_price_sort_treats_missing_as_one() {
        let mut two = place("two", "Bar", 4.0, 40.85, 14.27);
        two.price_level = Some(2);
        let mut missing = place("missing", "Bar", 4.0, 40.85, 14.27);
        missing.price_level = None;
        let mut one = place("one", "Bar", 4.0, 40.85, 14.27);
        one.price_level = Some(1);

        let criteria = FilterCriteria {
            sort_by: SortKey::Price,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&[two, missing, one], naples(), &criteria)), vec!["missing", "one", "two"]);
    }

    #[test]
    fn test_distance_sort_and_ceiling() {
        let results = vec![
            place("far", "Bar", 4.0, 40.90, 14.27),
            place("near", "Bar", 4.0, 40.851, 14.27),
            place("too-far", "Bar", 4.0, 41.50, 14.27),
        ];
        let criteria = FilterCriteria {
            max_distance: 10_000.0,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&results, naples(), &criteria)), vec!["near", "far"]);
    }

    #[test]
    fn test_idempotent_and_non_destructive() {
        let results = vec![
            place("a", "Pizzeria", 4.2, 40.86, 14.27),
            place("b", "Sushi", 4.7, 40.851, 14.27),
            place("c", "Pizzeria", 4.9, 40.87, 14.28),
        ];
        let snapshot = results.clone();
        let criteria = FilterCriteria {
            sort_by: SortKey::Rating,
            min_rating: 4.3,
            ..FilterCriteria::default()
        };

        let once = apply_filters(&results, naples(), &criteria);
        let twice = apply_filters(&results, naples(), &criteria);
        assert_eq!(once, twice);
        assert_eq!(results, snapshot);
    }
}
