use std::sync::Arc;

use http::{HeaderValue, Method, StatusCode, header};
use log::error;
use pinpoint_logic::{
    AcquisitionResult, GeocodeResult, Geocoder, LocationProvider, fetch_single_location,
    lookup_address,
};
use serde_json::{Map, Value};

use crate::request::{ServiceRequest, ServiceResponse};

/// An in-process service the host routing layer dispatches requests to.
/// Registering and unregistering services with the host runtime is the
/// host's concern, not ours.
pub trait Service: Send + Sync {
    /// Path segment the host mounts this service under
    const IDENTIFIER: &'static str;

    /// Handle a single request, producing the full response. Validation
    /// failures come back as 4xx; anything unexpected maps to a 500, never a
    /// panic across this boundary.
    fn perform_request(
        &self,
        request: ServiceRequest,
    ) -> impl Future<Output = ServiceResponse> + Send;
}

/// The location service: dispatches `/location/single` (one-shot fix) and
/// `/location/address` (reverse geocode of a coordinate pair)
pub struct LocationService<P: LocationProvider, G: Geocoder> {
    provider: Arc<P>,
    geocoder: G,
}

impl<P: LocationProvider, G: Geocoder> LocationService<P, G> {
    pub fn new(provider: Arc<P>, geocoder: G) -> Self {
        Self {
            provider,
            geocoder,
        }
    }

    async fn single(&self, request: &ServiceRequest) -> ServiceResponse {
        // No query parameters are expected on this route
        if request.query.is_some() {
            return ServiceResponse::error_status(StatusCode::BAD_REQUEST);
        }

        if request.method != Method::GET {
            return method_not_allowed();
        }

        let mut body = Map::new();

        match fetch_single_location(self.provider.clone()).await {
            AcquisitionResult::Success(fix) => {
                body.insert("status".to_string(), Value::String("success".to_string()));
                // Coordinates round-trip as text, not as JSON numbers
                body.insert(
                    "latitude".to_string(),
                    Value::String(fix.latitude.to_string()),
                );
                body.insert(
                    "longitude".to_string(),
                    Value::String(fix.longitude.to_string()),
                );
            }
            AcquisitionResult::Failure(message) => {
                body.insert("status".to_string(), Value::String("error".to_string()));
                body.insert("message".to_string(), Value::String(message));
            }
        }

        json_response(&body)
    }

    async fn address(&self, request: &ServiceRequest) -> ServiceResponse {
        if request.method != Method::GET {
            return method_not_allowed();
        }

        let pairs = request.query_pairs();
        if pairs.len() != 2 {
            return bad_request("Expected exactly 2 query parameters: 'latitude' and 'longitude'");
        }

        let Some(latitude) = query_f64(&pairs, "latitude") else {
            return bad_request("Parameter 'latitude' of type Double not found in query");
        };
        let Some(longitude) = query_f64(&pairs, "longitude") else {
            return bad_request("Parameter 'longitude' of type Double not found in query");
        };

        let mut body = Map::new();

        match lookup_address(&self.geocoder, latitude, longitude).await {
            GeocodeResult::Success(address) => {
                for (key, value) in address.serializable_map() {
                    body.insert(key, Value::String(value));
                }
                body.insert("status".to_string(), Value::String("success".to_string()));
            }
            GeocodeResult::Failure(message) => {
                body.insert("status".to_string(), Value::String("error".to_string()));
                body.insert("message".to_string(), Value::String(message));
            }
        }

        json_response(&body)
    }
}

impl<P: LocationProvider, G: Geocoder> Service for LocationService<P, G> {
    const IDENTIFIER: &'static str = "location";

    async fn perform_request(&self, request: ServiceRequest) -> ServiceResponse {
        match request.path.to_ascii_lowercase().as_str() {
            "/location/single" => self.single(&request).await,
            "/location/address" => self.address(&request).await,
            _ => ServiceResponse::error_status(StatusCode::BAD_REQUEST),
        }
    }
}

fn query_f64(pairs: &[(String, String)], name: &str) -> Option<f64> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .and_then(|(_, value)| value.parse().ok())
}

/// A 405 must advertise the allowed methods
fn method_not_allowed() -> ServiceResponse {
    ServiceResponse::error_status(StatusCode::METHOD_NOT_ALLOWED)
        .with_header(header::ALLOW, HeaderValue::from_static("GET"))
}

fn bad_request(message: &str) -> ServiceResponse {
    let mut body = Map::new();
    body.insert("status".to_string(), Value::String("error".to_string()));
    body.insert("message".to_string(), Value::String(message.to_string()));

    let mut response = json_response(&body);
    if response.status == StatusCode::OK {
        response.status = StatusCode::BAD_REQUEST;
    }
    response
}

fn json_response(body: &Map<String, Value>) -> ServiceResponse {
    match serde_json::to_vec(body) {
        Ok(data) => ServiceResponse::ok(data),
        Err(why) => {
            error!("JSON serialization error: {why}");
            ServiceResponse::error_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
