//! Place lookup models.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// A real place returned by the maps provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
    /// `None` when the provider does not report opening state.
    #[serde(default)]
    pub open_now: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_same_point() {
        let p = Coordinates::new(10.7769, 106.7009);
        assert!(p.distance_km(&p) < 1e-9);
    }

    #[test]
    fn distance_matches_known_pair() {
        // Ben Thanh market -> Notre-Dame Cathedral Basilica of Saigon, roughly 1.1 km
        let market = Coordinates::new(10.7725, 106.6980);
        let cathedral = Coordinates::new(10.7798, 106.6990);
        let d = market.distance_km(&cathedral);
        assert!(d > 0.7 && d < 1.2, "unexpected distance {d}");
    }
}
