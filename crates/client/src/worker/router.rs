//! Request classification.
//!
//! Routing is a pure function of method, scheme and path: no state, no I/O.
//! Precedence is static asset, then document, then content document, then
//! everything else.

use std::sync::LazyLock;

use leaflet_core::Request;
use regex::Regex;
use serde::Serialize;

static STATIC_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(css|js|png|jpg|jpeg|gif|svg|woff|woff2|ttf|eot)$").expect("static asset pattern")
});

static DOCUMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.html?$").expect("document pattern"));

static CONTENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.md$").expect("content pattern"));

/// What kind of resource a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    StaticAsset,
    Document,
    Content,
    Other,
}

/// Caching policy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// Why a request was left to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum Bypass {
    /// Only GET requests are intercepted.
    Method(String),
    /// Extension pseudo-protocols and other schemes the network can't serve.
    Scheme(String),
}

/// Routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Bypass(Bypass),
    Handle(ResourceKind, Strategy),
}

impl ResourceKind {
    /// Classify a URL path.
    pub fn of_path(path: &str) -> Self {
        if STATIC_ASSET.is_match(path) {
            ResourceKind::StaticAsset
        } else if DOCUMENT.is_match(path) || path.ends_with('/') {
            ResourceKind::Document
        } else if CONTENT.is_match(path) {
            ResourceKind::Content
        } else {
            ResourceKind::Other
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            ResourceKind::StaticAsset => Strategy::CacheFirst,
            ResourceKind::Document | ResourceKind::Content => Strategy::NetworkFirst,
            ResourceKind::Other => Strategy::StaleWhileRevalidate,
        }
    }
}

/// Decide whether and how to handle a request.
pub fn route(request: &Request) -> Route {
    if !request.is_get() {
        return Route::Bypass(Bypass::Method(request.method.clone()));
    }

    match request.url.scheme() {
        "http" | "https" => {}
        scheme => return Route::Bypass(Bypass::Scheme(scheme.to_string())),
    }

    let kind = ResourceKind::of_path(request.url.path());
    Route::Handle(kind, kind.strategy())
}
