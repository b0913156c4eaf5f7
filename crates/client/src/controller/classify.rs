//! Resource classification.
//!
//! Every intercepted request is sorted into exactly one [`ResourceClass`] by
//! predicates evaluated in a fixed order: navigation, static asset (by file
//! extension), API (by path prefix), image (by destination), then dynamic.

use serde::{Deserialize, Serialize};

use super::strategy::{OfflineFallback, Strategy};
use crate::fetch::{Destination, Request};

/// File extensions served from the immutable static cache.
const STATIC_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "woff", "woff2", "ttf", "otf", "eot", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico",
];

/// `Cache-Control` written onto stored static assets.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// `Cache-Control` written onto stored navigation pages.
pub const NO_STORE_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// `Cache-Control` written onto stored API responses.
pub const API_CACHE_CONTROL: &str = "max-age=300, stale-while-revalidate=86400";

/// Category a request is sorted into for strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Navigation,
    StaticAsset,
    Api,
    Image,
    Dynamic,
}

/// One of the four named caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Static,
    Dynamic,
    Images,
    Api,
}

impl CacheKind {
    pub const ALL: [CacheKind; 4] = [CacheKind::Static, CacheKind::Dynamic, CacheKind::Images, CacheKind::Api];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKind::Static => "static",
            CacheKind::Dynamic => "dynamic",
            CacheKind::Images => "images",
            CacheKind::Api => "api",
        }
    }

    /// Version-tagged cache name, e.g. `v2-images`.
    pub fn cache_name(self, version: &str) -> String {
        format!("{version}-{}", self.as_str())
    }
}

impl ResourceClass {
    /// The cache backing this class.
    pub fn cache_kind(self) -> CacheKind {
        match self {
            ResourceClass::StaticAsset => CacheKind::Static,
            ResourceClass::Navigation | ResourceClass::Dynamic => CacheKind::Dynamic,
            ResourceClass::Image => CacheKind::Images,
            ResourceClass::Api => CacheKind::Api,
        }
    }

    /// The freshness strategy applied to this class.
    pub fn strategy(self) -> Strategy {
        match self {
            ResourceClass::StaticAsset => Strategy::CacheFirst { cache_control: Some(IMMUTABLE_CACHE_CONTROL) },
            ResourceClass::Navigation => Strategy::NetworkFirst {
                cache_control: NO_STORE_CACHE_CONTROL,
                fallback: OfflineFallback::Page,
            },
            ResourceClass::Image => Strategy::StaleWhileRevalidate,
            ResourceClass::Api => Strategy::NetworkFirst { cache_control: API_CACHE_CONTROL, fallback: OfflineFallback::Api },
            ResourceClass::Dynamic => Strategy::CacheFirst { cache_control: None },
        }
    }
}

/// Sorts requests into resource classes.
#[derive(Debug, Clone)]
pub struct Classifier {
    api_prefix: String,
}

impl Classifier {
    pub fn new(api_prefix: impl Into<String>) -> Self {
        Self { api_prefix: api_prefix.into() }
    }

    pub fn classify(&self, request: &Request) -> ResourceClass {
        let path = request.url.path();

        if request.is_navigation() {
            ResourceClass::Navigation
        } else if is_static_asset(path) {
            ResourceClass::StaticAsset
        } else if path.starts_with(&self.api_prefix) {
            ResourceClass::Api
        } else if request.destination == Destination::Image {
            ResourceClass::Image
        } else {
            ResourceClass::Dynamic
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new("/api/")
    }
}

fn is_static_asset(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            STATIC_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RequestMode;
    use reqwest::Url;

    fn get(path: &str) -> Request {
        Request::get(Url::parse("https://example.com").unwrap().join(path).unwrap())
    }

    #[test]
    fn test_navigation_wins_over_extension() {
        let request = Request::navigate(Url::parse("https://example.com/brochure.svg").unwrap());
        assert_eq!(Classifier::default().classify(&request), ResourceClass::Navigation);
    }

    #[test]
    fn test_static_by_extension() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&get("/static/js/main.3f9a1c.js")), ResourceClass::StaticAsset);
        assert_eq!(classifier.classify(&get("/fonts/Brand.WOFF2")), ResourceClass::StaticAsset);
        assert_eq!(classifier.classify(&get("/img/suv.jpg?w=800")), ResourceClass::StaticAsset);
    }

    #[test]
    fn test_static_checked_before_api() {
        assert_eq!(Classifier::default().classify(&get("/api/logo.png")), ResourceClass::StaticAsset);
    }

    #[test]
    fn test_api_by_prefix() {
        assert_eq!(Classifier::default().classify(&get("/api/vehicles?type=suv")), ResourceClass::Api);
        assert_eq!(Classifier::new("/v2/").classify(&get("/v2/dealers")), ResourceClass::Api);
    }

    #[test]
    fn test_image_by_destination() {
        let request = get("/render/configurator").with_destination(Destination::Image);
        assert_eq!(Classifier::default().classify(&request), ResourceClass::Image);
    }

    #[test]
    fn test_everything_else_dynamic() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&get("/models/suv")), ResourceClass::Dynamic);
        assert_eq!(classifier.classify(&get("/.well-known")), ResourceClass::Dynamic);
        let no_cors = get("/feeds/offers").with_mode(RequestMode::NoCors);
        assert_eq!(classifier.classify(&no_cors), ResourceClass::Dynamic);
    }

    #[test]
    fn test_cache_names() {
        assert_eq!(CacheKind::Images.cache_name("v2"), "v2-images");
        assert_eq!(ResourceClass::Navigation.cache_kind(), CacheKind::Dynamic);
        assert_eq!(ResourceClass::Api.cache_kind(), CacheKind::Api);
    }
}
