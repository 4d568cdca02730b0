//! DTOs for link shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a single URL.
///
/// Only presence is checked here; the full URL rules run in the service.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
}

/// Envelope around the shortened link.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub url: ShortUrl,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortUrl {
    pub short_code: String,
    pub short_url: String,
    /// False when the URL had already been shortened.
    pub created: bool,
}
