//! Service-wide usage totals.

use serde::{Deserialize, Serialize};

/// Totals computed by scanning the registry. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    #[serde(rename = "totalURLs")]
    pub total_urls: i64,
    #[serde(rename = "totalRedirects")]
    pub total_redirects: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        let stats = ServiceStats::default();
        assert_eq!(stats.total_urls, 0);
        assert_eq!(stats.total_redirects, 0);
    }

    #[test]
    fn test_json_field_names() {
        let stats = ServiceStats {
            total_urls: 3,
            total_redirects: 7,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalURLs"], 3);
        assert_eq!(json["totalRedirects"], 7);
    }
}
