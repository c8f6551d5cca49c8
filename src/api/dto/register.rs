//! DTO for the registration endpoint.

use serde::Deserialize;
use validator::Validate;

/// Request to register a short URL.
///
/// ```json
/// { "url": "https://example.com/some/page", "ttl": "10m" }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Destination; must be an absolute URL.
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Lifetime expression such as `30s`, `10m` or `1h30m`.
    #[validate(length(min = 1, message = "TTL must not be empty"))]
    pub ttl: String,
}
