//! Request classification.
//!
//! Every intercepted request falls into exactly one class, checked in
//! priority order: navigation, then image, then remote API, then static.
//! The class picks the fetch strategy; nothing downstream re-inspects the
//! request shape.

use driftcache_client::Request;
use regex::Regex;
use url::Url;

use crate::error::WorkerError;

/// The four request classes, one per fetch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Top-level HTML navigation.
    Navigation,
    /// Photo or other image asset.
    Image,
    /// Call to the remote story API.
    RemoteApi,
    /// Everything else: app shell assets, scripts, styles.
    Static,
}

/// Classifies requests by URL shape and declared media-type preference.
pub struct Classifier {
    api_base: Url,
    image_extensions: Regex,
    photo_segments: Vec<String>,
}

impl Classifier {
    pub fn new(api_base: Url, photo_segments: Vec<String>) -> Result<Self, WorkerError> {
        let image_extensions = Regex::new(r"\.(?:png|gif|jpg|jpeg|svg|webp)$")
            .map_err(|e| WorkerError::Config(format!("image extension pattern: {e}")))?;
        Ok(Self { api_base, image_extensions, photo_segments })
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        if request.is_get() && request.wants_html() {
            return RequestClass::Navigation;
        }
        if self.is_image(&request.url) {
            return RequestClass::Image;
        }
        if self.is_remote_api(&request.url) {
            return RequestClass::RemoteApi;
        }
        RequestClass::Static
    }

    /// Image by file extension on the path, or by a known photo path
    /// segment anywhere in the URL (photo endpoints serve images without
    /// an extension).
    fn is_image(&self, url: &Url) -> bool {
        if self.image_extensions.is_match(url.path()) {
            return true;
        }
        let url = url.as_str();
        self.photo_segments.iter().any(|segment| url.contains(segment.as_str()))
    }

    fn is_remote_api(&self, url: &Url) -> bool {
        url.origin() == self.api_base.origin() && url.path().starts_with(self.api_base.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(
            Url::parse("https://story-api.example.com/v1").unwrap(),
            vec!["story-photo".to_string(), "photoUrl".to_string()],
        )
        .unwrap()
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_navigation_wins_over_everything() {
        let c = classifier();
        let request = get("https://story-api.example.com/v1/stories").with_header("accept", "text/html,*/*");
        assert_eq!(c.classify(&request), RequestClass::Navigation);
    }

    #[test]
    fn test_navigation_requires_get() {
        let c = classifier();
        let request = Request::new("POST", Url::parse("http://localhost:8080/form").unwrap())
            .with_header("accept", "text/html");
        assert_ne!(c.classify(&request), RequestClass::Navigation);
    }

    #[test]
    fn test_image_by_extension() {
        let c = classifier();
        for url in [
            "http://localhost:8080/logo.png",
            "http://localhost:8080/hero.webp",
            "https://cdn.example.com/photo.jpeg",
        ] {
            assert_eq!(c.classify(&get(url)), RequestClass::Image, "{url}");
        }
    }

    #[test]
    fn test_image_by_photo_segment() {
        let c = classifier();
        let request = get("https://story-api.example.com/v1/stories/abc/story-photo");
        assert_eq!(c.classify(&request), RequestClass::Image);
    }

    #[test]
    fn test_remote_api() {
        let c = classifier();
        let request = get("https://story-api.example.com/v1/stories?page=1");
        assert_eq!(c.classify(&request), RequestClass::RemoteApi);
    }

    #[test]
    fn test_other_origin_api_path_is_static() {
        let c = classifier();
        let request = get("https://other.example.com/v1/stories");
        assert_eq!(c.classify(&request), RequestClass::Static);
    }

    #[test]
    fn test_shell_assets_are_static() {
        let c = classifier();
        assert_eq!(c.classify(&get("http://localhost:8080/app.js")), RequestClass::Static);
        assert_eq!(c.classify(&get("http://localhost:8080/app.css")), RequestClass::Static);
    }
}
