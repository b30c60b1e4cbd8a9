//! Shared User-Agent string for outbound HTTP clients.
//!
//! Open Library asks API consumers to identify themselves; a single format
//! keeps catalog, suggestion and cover traffic consistent.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/bookswipe/bookswipe";

/// Default User-Agent for every outbound service client.
#[must_use]
pub(crate) fn default_service_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookswipe/{version} (book-discovery; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_version_and_url() {
        let ua = default_service_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL");
        assert_eq!(
            Some(env!("CARGO_PKG_VERSION")),
            ua.strip_prefix("bookswipe/")
                .and_then(|s| s.split(' ').next()),
            "UA must contain crate version"
        );
        assert!(ua.contains("book-discovery"));
    }
}
