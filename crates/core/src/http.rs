//! Request and response values exchanged between the router, the strategies,
//! the fetch pipeline and the cache.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Body of the synthetic response returned when neither network nor cache can answer.
pub const OFFLINE_BODY: &str = "Offline";

/// What the request is for, as reported by the page that issued it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// An intercepted outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    /// Upper-cased HTTP method.
    pub method: String,
    pub mode: RequestMode,
}

impl Request {
    pub fn new(url: Url, method: &str, mode: RequestMode) -> Self {
        Self { url, method: method.trim().to_ascii_uppercase(), mode }
    }

    /// A plain subresource GET, as issued by the worker itself.
    pub fn get(url: Url) -> Self {
        Self::new(url, "GET", RequestMode::default())
    }

    /// A GET for a full page load.
    pub fn navigate(url: Url) -> Self {
        Self::new(url, "GET", RequestMode::Navigate)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A response as served to the page or stored in a cache generation.
///
/// `body` is reference-counted, so cloning a response to both store and
/// return it does not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    /// URL the body was served from after redirects, if known.
    pub url: Option<Url>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into(), url: None }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// The 503 plain-text response served when offline with nothing cached.
    pub fn offline() -> Self {
        Self::new(503, OFFLINE_BODY).with_header("content-type", "text/plain")
    }

    /// True for statuses in 200-299.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_method_normalized() {
        let req = Request::new(Url::parse("https://example.com/").unwrap(), " post ", RequestMode::Cors);
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_navigate_request() {
        let req = Request::navigate(Url::parse("https://example.com/reader.html").unwrap());
        assert!(req.is_get());
        assert!(req.is_navigation());
        assert!(!Request::get(req.url.clone()).is_navigation());
    }

    #[test]
    fn test_request_mode_parse() {
        assert_eq!("navigate".parse::<RequestMode>().unwrap(), RequestMode::Navigate);
        assert_eq!("No-Cors".parse::<RequestMode>().unwrap(), RequestMode::NoCors);
        assert!(matches!("sideways".parse::<RequestMode>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_request_mode_serde() {
        let json = serde_json::to_string(&RequestMode::SameOrigin).unwrap();
        assert_eq!(json, "\"same-origin\"");
    }

    #[test]
    fn test_offline_response() {
        let resp = Response::offline();
        assert_eq!(resp.status, 503);
        assert!(!resp.ok());
        assert_eq!(resp.text(), "Offline");
        assert_eq!(resp.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new(200, "").ok());
        assert!(Response::new(204, "").ok());
        assert!(!Response::new(304, "").ok());
        assert!(!Response::new(404, "").ok());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::new(200, "body").with_header("Content-Type", "text/css");
        assert_eq!(resp.header("content-type"), Some("text/css"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/css"));
    }
}
