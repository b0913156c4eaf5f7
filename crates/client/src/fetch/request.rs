//! Intercepted request model.

use bytes::Bytes;
use reqwest::{Method, Url, header};
use serde::{Deserialize, Serialize};

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// What the response will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// `fetch()` / XHR calls.
    #[default]
    Empty,
}

/// A request as seen by the cache controller.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: header::HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request with no headers or body. The URL fragment is dropped.
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self {
            method,
            url,
            mode: RequestMode::default(),
            destination: Destination::default(),
            headers: header::HeaderMap::new(),
            body: None,
        }
    }

    /// A plain GET, as issued by `fetch(url)`.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
    }

    /// A POST carrying a JSON body.
    pub fn post_json(url: Url, body: impl Into<Bytes>) -> Self {
        let mut request = Self::new(Method::POST, url);
        request
            .headers
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        request.body = Some(body.into());
        request
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the URL scheme is one the controller may cache (http/https).
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }
}
