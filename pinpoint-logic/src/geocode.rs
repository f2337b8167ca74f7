use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Failure message when the geocoder responds with zero candidates
const NO_DATA_MSG: &str = "No data received from reverse geocoder.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// A reverse-geocoded address. Every field is optional, geocoders rarely
/// resolve all of them
pub struct AddressInformation {
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    /// State / administrative area
    pub state: Option<String>,
    /// City / locality
    pub city: Option<String>,
    /// Street / thoroughfare
    pub street: Option<String>,
    /// Street number / sub-thoroughfare
    pub street_number: Option<String>,
    /// Extra descriptive fields the geocoder reported (e.g. name,
    /// subLocality, ocean), keyed as the geocoder names them
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl AddressInformation {
    /// Flat string map for the wire. The named fields are always emitted,
    /// absent ones as an empty string; extra fields appear only when the
    /// geocoder reported them.
    pub fn serializable_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();

        let named = [
            ("countryCode", &self.country_code),
            ("country", &self.country),
            ("postalCode", &self.postal_code),
            ("state", &self.state),
            ("city", &self.city),
            ("street", &self.street),
            ("streetNumber", &self.street_number),
        ];

        for (key, value) in named {
            map.insert(key.to_string(), value.clone().unwrap_or_default());
        }

        map
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Success(AddressInformation),
    Failure(String),
}

/// Seam over the reverse-geocoding collaborator. Candidates come back
/// best-first; callers only ever use the first one.
pub trait Geocoder: Send + Sync {
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Vec<AddressInformation>>> + Send;
}

/// Look up the address for a coordinate pair, taking the first candidate the
/// collaborator returns
pub async fn lookup_address<G: Geocoder>(
    geocoder: &G,
    latitude: f64,
    longitude: f64,
) -> GeocodeResult {
    match geocoder.reverse_geocode(latitude, longitude).await {
        Ok(candidates) => match candidates.into_iter().next() {
            Some(address) => GeocodeResult::Success(address),
            None => GeocodeResult::Failure(NO_DATA_MSG.to_string()),
        },
        Err(err) => GeocodeResult::Failure(format!("Reverse geocoder failed with error: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{MockGeocoder, mk_address};
    use tokio::test;

    #[test]
    async fn test_first_candidate_wins() {
        let second = AddressInformation {
            city: Some("Somewhere Else".to_string()),
            ..Default::default()
        };
        let geocoder = MockGeocoder::candidates(vec![mk_address(), second]);

        let result = lookup_address(&geocoder, 38.8977, -77.0366).await;
        assert_eq!(result, GeocodeResult::Success(mk_address()));
    }

    #[test]
    async fn test_no_candidates_is_a_distinct_failure() {
        let geocoder = MockGeocoder::candidates(vec![]);
        let result = lookup_address(&geocoder, 0.0, 0.0).await;
        assert_eq!(result, GeocodeResult::Failure(NO_DATA_MSG.to_string()));
    }

    #[test]
    async fn test_provider_error_carries_description() {
        let geocoder = MockGeocoder::failing("network unreachable");
        let result = lookup_address(&geocoder, 0.0, 0.0).await;
        assert_eq!(
            result,
            GeocodeResult::Failure(
                "Reverse geocoder failed with error: network unreachable".to_string()
            )
        );
    }

    #[test]
    async fn test_serializable_map_blanks_missing_fields() {
        let mut address = mk_address();
        address.street_number = None;
        address.extra.insert("ocean".to_string(), "Atlantic".to_string());

        let map = address.serializable_map();
        assert_eq!(map["city"], "Washington");
        assert_eq!(map["streetNumber"], "");
        assert_eq!(map["ocean"], "Atlantic");

        // Named fields are always present, extras only when reported
        assert_eq!(map.len(), 8);
    }
}
