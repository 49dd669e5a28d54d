//! Request/response models exchanged between the worker and its host services.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::{form_urlencoded, Url};

/// Content type used by form-encoded submission relays.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Statuses whose responses cannot carry a body.
pub const NULL_BODY_STATUSES: [u16; 5] = [101, 103, 204, 205, 304];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// HTTP request method.
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// Any other verb, stored uppercased.
    Other(String),
}

impl HttpMethod {
    /// Parses a method token case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the canonical uppercase token.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }
}

impl From<String> for HttpMethod {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<HttpMethod> for String {
    fn from(value: HttpMethod) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Response classification reported by the fetch pipeline.
pub enum ResponseKind {
    /// Same-origin response.
    #[default]
    Basic,
    /// Valid cross-origin CORS response.
    Cors,
    /// Cross-origin response without CORS access.
    Opaque,
    /// Opaque redirect from a `manual` redirect fetch.
    #[serde(rename = "opaqueredirect")]
    OpaqueRedirect,
    /// Network-error response.
    Error,
    /// Constructed response with no fetch provenance.
    Default,
}

/// Normalizes an absolute URL (lowercased scheme/host, default port elided, fragment removed).
///
/// URLs that fail to parse are returned trimmed but otherwise verbatim.
pub fn normalize_url(raw_url: &str) -> String {
    match Url::parse(raw_url.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw_url.trim().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Normalized cache key: method plus absolute URL with the fragment removed.
pub struct RequestKey(String);

impl RequestKey {
    /// Builds a key from a method and raw URL.
    pub fn new(method: &HttpMethod, raw_url: &str) -> Self {
        Self(format!("{} {}", method.as_str(), normalize_url(raw_url)))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Request as seen by the worker.
pub struct WorkerRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Header name/value pairs in arrival order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    #[serde(default)]
    pub body: Option<Vec<u8>>,
}

impl WorkerRequest {
    /// Creates a body-less request.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a form-encoded `POST` request from name/value pairs.
    pub fn form_post(url: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().copied())
            .finish();
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), FORM_URLENCODED.to_string())],
            body: Some(body.into_bytes()),
        }
    }

    /// Returns the normalized cache key.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }

    /// Parses the request URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not absolute or malformed.
    pub fn parsed_url(&self) -> Result<Url, String> {
        Url::parse(&self.url).map_err(|e| format!("invalid request url `{}`: {e}", self.url))
    }

    /// Looks up a header value case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Fully buffered response. Cloning duplicates the body.
pub struct WorkerResponse {
    /// HTTP status; `0` for network-error and opaque responses.
    pub status: u16,
    /// Response classification.
    #[serde(default)]
    pub kind: ResponseKind,
    /// Header name/value pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl WorkerResponse {
    /// Creates a same-origin response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            kind: ResponseKind::Basic,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Creates a network-error response.
    pub fn network_error() -> Self {
        Self {
            status: 0,
            kind: ResponseKind::Error,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns whether this is a network-error response.
    pub fn is_network_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }

    /// Returns whether the status is in the 2xx range and the response is not a network error.
    pub fn is_ok(&self) -> bool {
        !self.is_network_error() && (200..300).contains(&self.status)
    }

    /// Returns whether a fresh fetch may be written into the cache (exactly `200`).
    pub fn is_cacheable_success(&self) -> bool {
        !self.is_network_error() && self.status == 200
    }

    /// Looks up a header value case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns the body to hand to a platform `Response`, or `None` when it must be null.
    ///
    /// Null-body statuses (`101`, `103`, `204`, `205`, `304`) and empty bodies are sent as null.
    pub fn wire_body(&self) -> Option<&[u8]> {
        if self.body.is_empty() || NULL_BODY_STATUSES.contains(&self.status) {
            None
        } else {
            Some(&self.body)
        }
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_slice(&self.body).map_err(|e| e.to_string())
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn method_parse_is_case_insensitive_and_keeps_unknown_verbs() {
        assert_eq!(HttpMethod::parse("get"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse(" Post "), HttpMethod::Post);
        assert_eq!(
            HttpMethod::parse("purge"),
            HttpMethod::Other("PURGE".to_string())
        );
        assert_eq!(HttpMethod::Other("PURGE".to_string()).as_str(), "PURGE");
    }

    #[test]
    fn request_key_normalizes_url_and_drops_fragment() {
        let a = RequestKey::new(&HttpMethod::Get, "HTTPS://Example.org:443/index.html#top");
        let b = RequestKey::new(&HttpMethod::Get, "https://example.org/index.html");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "GET https://example.org/index.html");

        let post = RequestKey::new(&HttpMethod::Post, "https://example.org/index.html");
        assert_ne!(a, post);
    }

    #[test]
    fn form_post_encodes_fields_and_sets_content_type() {
        let request = WorkerRequest::form_post(
            "https://script.example/exec",
            &[("data", "team=254&match 1")],
        );
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some(FORM_URLENCODED));
        assert_eq!(
            request.body.as_deref(),
            Some("data=team%3D254%26match+1".as_bytes())
        );
    }

    #[test]
    fn success_predicates_follow_status_and_kind() {
        assert!(WorkerResponse::new(200, "x").is_cacheable_success());
        assert!(!WorkerResponse::new(204, "").is_cacheable_success());
        assert!(WorkerResponse::new(204, "").is_ok());
        assert!(!WorkerResponse::new(404, "").is_ok());

        let mut errored = WorkerResponse::new(200, "x");
        errored.kind = ResponseKind::Error;
        assert!(!errored.is_cacheable_success());
        assert!(WorkerResponse::network_error().is_network_error());
    }

    #[test]
    fn request_serializes_method_as_token() {
        let request = WorkerRequest::get("https://example.org/");
        let value = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(value["method"], json!("GET"));

        let decoded: WorkerResponse = serde_json::from_value(json!({
            "status": 200,
            "kind": "opaqueredirect",
        }))
        .expect("decode response");
        assert_eq!(decoded.kind, ResponseKind::OpaqueRedirect);
        assert!(decoded.body.is_empty());
    }

    #[test]
    fn response_json_decodes_body() {
        let response = WorkerResponse::new(200, r#"{"success":true}"#);
        let value: serde_json::Value = response.json().expect("json body");
        assert_eq!(value, json!({"success": true}));
        assert!(WorkerResponse::new(200, "not json")
            .json::<serde_json::Value>()
            .is_err());
    }

    #[test]
    fn wire_body_is_null_for_empty_and_null_body_statuses() {
        assert_eq!(WorkerResponse::new(204, "").wire_body(), None);
        assert_eq!(WorkerResponse::new(205, "").wire_body(), None);
        assert_eq!(WorkerResponse::new(304, "stale").wire_body(), None);
        assert_eq!(WorkerResponse::new(200, "").wire_body(), None);
        assert_eq!(
            WorkerResponse::new(200, "shell").wire_body(),
            Some("shell".as_bytes())
        );
    }
}
