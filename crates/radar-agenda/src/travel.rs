//! Distance and travel-time estimate for the event detail view
//!
//! A straight-line haversine distance with flat per-mode speeds; anything
//! smarter is left to external mapping services.

/// How the user travels to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Walk,
    Bike,
    Car,
}

impl TravelMode {
    /// Flat assumed speed in km/h
    pub fn speed_kmh(self) -> f64 {
        match self {
            TravelMode::Walk => 5.0,
            TravelMode::Bike => 15.0,
            TravelMode::Car => 30.0,
        }
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, rounded to 0.1 km
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

/// Rounded travel time for a distance at the mode's flat speed
pub fn estimated_minutes(distance_km: f64, mode: TravelMode) -> u32 {
    (distance_km / mode.speed_kmh() * 60.0).round() as u32
}
