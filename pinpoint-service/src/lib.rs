mod request;
mod service;

pub use request::{ServiceRequest, ServiceResponse};
pub use service::{LocationService, Service};
