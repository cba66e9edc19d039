use crate::models::Coordinates;

/// Mean earth radius used by the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 points (haversine).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

pub fn distance_between(from: Coordinates, to: Coordinates) -> f64 {
    distance_meters(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_meters(40.8522, 14.2681, 40.8522, 14.2681), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ((40.8522, 14.2681), (41.9028, 12.4964)),
            ((-33.8688, 151.2093), (51.5074, -0.1278)),
            ((0.0, 179.9), (0.0, -179.9)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let there = distance_meters(lat1, lon1, lat2, lon2);
            let back = distance_meters(lat2, lon2, lat1, lon1);
            assert!((there - back).abs() < 1e-6, "{there} != {back}");
        }
    }

    #[test]
    fn test_naples_to_rome() {
        // ~188 km as the crow flies
        let dist = distance_meters(40.8518, 14.2681, 41.9028, 12.4964);
        assert!(dist > 185_000.0 && dist < 192_000.0, "got {dist}");
    }

    #[test]
    fn test_short_hop_across_antimeridian() {
        let dist = distance_meters(0.0, 179.9, 0.0, -179.9);
        assert!(dist < 25_000.0, "got {dist}");
    }
}
