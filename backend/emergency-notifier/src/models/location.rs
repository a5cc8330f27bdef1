/// Geographic primitives for incident targeting.
///
/// Coordinates are WGS84 decimal degrees, distances are kilometres.
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// One micrometre.
pub const BOUNDARY_TOLERANCE_KM: f64 = 1e-9;

/// Location data point (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude (-90 to 90)
    pub latitude: f64,
    /// Longitude (-180 to 180)
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(format!(
                "Invalid latitude {}: must be between -90 and 90",
                latitude
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!(
                "Invalid longitude {}: must be between -180 and 180",
                longitude
            ));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another point using the Haversine formula (kilometers)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// Annulus around an incident: lower bound exclusive, upper bound inclusive.
///
/// The lower bound keeps the reporter's own position (distance ~0) out of the
/// nearby set. Distances within [`BOUNDARY_TOLERANCE_KM`] of a bound count as
/// lying on it, so rounding in the Haversine computation cannot flip a point
/// sitting exactly on the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusBand {
    pub min_km: f64,
    pub max_km: f64,
}

impl RadiusBand {
    pub fn new(min_km: f64, max_km: f64) -> Self {
        Self { min_km, max_km }
    }

    pub fn contains(&self, distance_km: f64) -> bool {
        distance_km > self.min_km + BOUNDARY_TOLERANCE_KM
            && distance_km <= self.max_km + BOUNDARY_TOLERANCE_KM
    }
}
