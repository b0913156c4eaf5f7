//! Image parameter optimization.
//!
//! Picks a quality/width pair per image from the connection speed and where
//! the image is placed, and rewrites the URL query with `q`, `w` and `fm=webp`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Base used to rewrite relative URLs; never appears in the output.
const RELATIVE_BASE: &str = "http://relative.invalid";

const SLOW_NETWORKS: &[&str] = &["slow-2g", "2g", "3g"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageRequest {
    pub url: String,
    /// Placement on the page: `hero`, `thumbnail`, or anything else.
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OptimizeInput {
    pub images: Vec<ImageRequest>,
    /// Effective connection type, e.g. `4g` or `slow-2g`.
    #[serde(default)]
    pub network_speed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OptimizedImage {
    pub original_url: String,
    pub url: String,
    pub context: Option<String>,
    pub quality: u8,
    pub width: u32,
}

/// Quality and width for one image.
pub fn parameters(network_speed: &str, context: Option<&str>) -> (u8, u32) {
    let (quality, width): (u8, u32) =
        if SLOW_NETWORKS.contains(&network_speed.to_ascii_lowercase().as_str()) { (60, 800) } else { (85, 1600) };

    match context {
        Some("hero") => ((quality + 10).min(95), width * 3 / 2),
        Some("thumbnail") => (quality.saturating_sub(20), 320),
        _ => (quality, width),
    }
}

pub fn optimize_images(input: OptimizeInput) -> Vec<OptimizedImage> {
    input
        .images
        .into_iter()
        .map(|image| {
            let (quality, width) = parameters(&input.network_speed, image.context.as_deref());
            OptimizedImage {
                url: rewrite_url(&image.url, quality, width),
                original_url: image.url,
                context: image.context,
                quality,
                width,
            }
        })
        .collect()
}

/// Replace `q`, `w` and `fm` in the query, keeping every other parameter.
///
/// URLs that cannot be parsed are returned unchanged.
fn rewrite_url(raw: &str, quality: u8, width: u32) -> String {
    let (mut url, relative) = match Url::parse(raw) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase) => match Url::parse(RELATIVE_BASE).and_then(|b| b.join(raw)) {
            Ok(url) => (url, true),
            Err(_) => return raw.to_string(),
        },
        Err(_) => return raw.to_string(),
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !matches!(key.as_ref(), "q" | "w" | "fm"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("q", &quality.to_string())
        .append_pair("w", &width.to_string())
        .append_pair("fm", "webp");

    if relative {
        let mut out = url.path().to_string();
        if let Some(query) = url.query() {
            out.push('?');
            out.push_str(query);
        }
        out
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, context: Option<&str>) -> ImageRequest {
        ImageRequest { url: url.into(), context: context.map(String::from) }
    }

    #[test]
    fn test_parameters_by_speed_and_context() {
        assert_eq!(parameters("4g", None), (85, 1600));
        assert_eq!(parameters("3g", None), (60, 800));
        assert_eq!(parameters("slow-2g", Some("gallery")), (60, 800));
        assert_eq!(parameters("4g", Some("hero")), (95, 2400));
        assert_eq!(parameters("2g", Some("hero")), (70, 1200));
        assert_eq!(parameters("4g", Some("thumbnail")), (65, 320));
        assert_eq!(parameters("3g", Some("thumbnail")), (40, 320));
    }

    #[test]
    fn test_rewrite_preserves_other_params() {
        let input = OptimizeInput {
            images: vec![image("https://cdn.example.com/suv.jpg?angle=front&q=100&w=4000", Some("hero"))],
            network_speed: "4g".into(),
        };
        let out = optimize_images(input);
        assert_eq!(out[0].url, "https://cdn.example.com/suv.jpg?angle=front&q=95&w=2400&fm=webp");
        assert_eq!(out[0].original_url, "https://cdn.example.com/suv.jpg?angle=front&q=100&w=4000");
    }

    #[test]
    fn test_rewrite_relative_url() {
        let out = optimize_images(OptimizeInput {
            images: vec![image("/images/sedan.png", Some("thumbnail"))],
            network_speed: "3g".into(),
        });
        assert_eq!(out[0].url, "/images/sedan.png?q=40&w=320&fm=webp");
    }

    #[test]
    fn test_unparseable_url_unchanged() {
        assert_eq!(rewrite_url("http://[::1", 85, 1600), "http://[::1");
    }
}
