mod acquirer;
mod geocode;
mod location;

pub use acquirer::{
    AcquisitionResult, DistanceResult, SingleLocationAcquirer, distance_to, fetch_single_location,
};
pub use geocode::{AddressInformation, GeocodeResult, Geocoder, lookup_address};
pub use location::{AuthorizationStatus, LocationFix, LocationProvider, ProviderEvent};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
