use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// An inbound request as handed over by the host routing layer. The host only
/// guarantees a method, an absolute path, and the raw query string; services
/// do their own path and query parsing.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

impl ServiceRequest {
    pub fn new(method: Method, path: impl Into<String>, query: Option<&str>) -> Self {
        Self {
            method,
            path: path.into(),
            query: query.map(str::to_string),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, None)
    }

    /// Split the raw query string into key/value pairs. A missing query means
    /// zero pairs; a key without `=` gets an empty value.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(query) = self.query.as_deref() else {
            return Vec::new();
        };

        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect()
    }
}

/// The full response a service hands back to the host routing layer
#[derive(Debug)]
pub struct ServiceResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ServiceResponse {
    /// 200 with a JSON body
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    /// An error status with no body
    pub fn error_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_query_means_no_pairs() {
        let request = ServiceRequest::get("/location/single");
        assert!(request.query_pairs().is_empty());
    }

    #[test]
    fn test_query_pairs_split() {
        let request = ServiceRequest::new(
            Method::GET,
            "/location/address",
            Some("latitude=38.8977&longitude=-77.0366"),
        );
        assert_eq!(
            request.query_pairs(),
            vec![
                ("latitude".to_string(), "38.8977".to_string()),
                ("longitude".to_string(), "-77.0366".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_key_gets_empty_value() {
        let request = ServiceRequest::new(Method::GET, "/location/single", Some("create"));
        assert_eq!(
            request.query_pairs(),
            vec![("create".to_string(), String::new())]
        );
    }
}
