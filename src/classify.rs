//! Request classification

use crate::http::{Destination, Request, RequestMode};
use serde::Serialize;
use std::fmt;

/// Raster image extensions served through the image route
pub const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Routing category of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Top-level page load or anything asking for HTML
    HtmlNavigation,
    Image,
    /// Scripts, stylesheets, fonts, wasm, JSON and everything else
    Generic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlNavigation => write!(f, "html-navigation"),
            Self::Image => write!(f, "image"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Classify a request. HTML wins over image, image over generic.
pub fn classify(request: &Request) -> Category {
    if is_html_request(request) {
        Category::HtmlNavigation
    } else if is_image_request(request) {
        Category::Image
    } else {
        Category::Generic
    }
}

pub fn is_html_request(request: &Request) -> bool {
    request.mode() == RequestMode::Navigate
        || request
            .accept()
            .map(|accept| accept.contains("text/html"))
            .unwrap_or(false)
}

pub fn is_image_request(request: &Request) -> bool {
    *request.destination() == Destination::Image || has_image_extension(request.url().path())
}

/// Extension check on the URL path only; the query never participates.
fn has_image_extension(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
