use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Mean earth radius in meters
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A single fix as gotten from a Geolocation API
pub struct LocationFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl LocationFix {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance to `other` in meters
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let (lat_a, lat_b) = (self.latitude.to_radians(), other.latitude.to_radians());
        let half_dlat = (lat_b - lat_a) / 2.0;
        let half_dlong = (other.longitude - self.longitude).to_radians() / 2.0;
        let a = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlong.sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Authorization state of the platform location provider. The platform owns
/// this; consumers only ever see the latest value through
/// [ProviderEvent::AuthorizationChanged] or [LocationProvider::authorization_status]
pub enum AuthorizationStatus {
    /// The user has not been prompted yet
    NotDetermined,
    AuthorizedWhenInUse,
    AuthorizedAlways,
    /// The user declined the prompt
    Denied,
    /// Location access is blocked system-wide (e.g. parental controls)
    Restricted,
    /// Platform statuses this crate doesn't act on
    Other,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }

    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

#[derive(Debug, Clone)]
/// Events the platform provider delivers to a subscriber
pub enum ProviderEvent {
    /// The authorization status changed (e.g. the user answered the prompt)
    AuthorizationChanged(AuthorizationStatus),
    /// A batch of fixes from the hardware stream, best first
    LocationsUpdated(Vec<LocationFix>),
    /// The provider hit an error it can't recover from
    Error(String),
}

/// Seam over the platform location provider.
///
/// `subscribe` registers an observer and hands back its event channel;
/// dropping the receiver deregisters it. Every subscriber gets its own
/// channel, so concurrent consumers never share state.
pub trait LocationProvider: Send + Sync + 'static {
    fn authorization_status(&self) -> AuthorizationStatus;
    /// Ask the platform to prompt the user for location access.
    /// Fire-and-forget, the outcome arrives later as
    /// [ProviderEvent::AuthorizationChanged]
    fn request_permission(&self);
    /// Start the hardware location stream
    fn start_updates(&self);
    /// Stop the hardware location stream
    fn stop_updates(&self);
    fn subscribe(&self) -> mpsc::Receiver<ProviderEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // One degree of latitude along a meridian
    const ONE_DEGREE_METERS: f64 = 111_194.9266;

    #[test]
    fn test_distance_to_self_is_zero() {
        let fix = LocationFix::new(38.8977, -77.0366);
        assert_eq!(fix.distance_meters(&fix), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let equator = LocationFix::new(0.0, 0.0);
        let north = LocationFix::new(1.0, 0.0);
        let distance = equator.distance_meters(&north);
        assert!((distance - ONE_DEGREE_METERS).abs() < 0.1);
    }

    #[test]
    fn test_distance_is_symmetric_and_non_negative() {
        let a = LocationFix::new(48.8566, 2.3522);
        let b = LocationFix::new(51.5074, -0.1278);
        let ab = a.distance_meters(&b);
        let ba = b.distance_meters(&a);
        assert!(ab > 0.0);
        assert_eq!(ab, ba);
        // Paris to London is roughly 344 km
        assert!((ab - 344_000.0).abs() < 5_000.0);
    }
}
