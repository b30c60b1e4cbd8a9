//! Shared HTTP client construction policy for outbound services.
//!
//! Timeouts and user-agent travel in an explicit [`HttpSettings`] value handed
//! to each client at construction, so catalog, suggestion and cover clients
//! stay consistent without process-wide state.

use std::time::Duration;

use reqwest::Client;

use crate::user_agent;

/// Default connect timeout for outbound services.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default overall request timeout for outbound services.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Networking defaults shared by every outbound client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            user_agent: user_agent::default_service_user_agent(),
        }
    }
}

impl HttpSettings {
    /// Settings with custom timeouts and the default user-agent.
    #[must_use]
    pub fn with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        Self {
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            read_timeout: Duration::from_secs(read_timeout_secs),
            ..Self::default()
        }
    }
}

/// Builds an HTTP client using shared project policy.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when client construction fails.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.read_timeout)
        .user_agent(settings.user_agent.clone())
        .gzip(true)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_settings_default_timeouts() {
        let settings = HttpSettings::default();
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.read_timeout, Duration::from_secs(30));
        assert!(settings.user_agent.starts_with("bookswipe/"));
    }

    #[test]
    fn test_http_settings_with_timeouts_keeps_user_agent() {
        let settings = HttpSettings::with_timeouts(2, 5);
        assert_eq!(settings.connect_timeout, Duration::from_secs(2));
        assert_eq!(settings.read_timeout, Duration::from_secs(5));
        assert_eq!(settings.user_agent, HttpSettings::default().user_agent);
    }

    #[test]
    fn test_build_http_client_succeeds() {
        assert!(build_http_client(&HttpSettings::default()).is_ok());
    }
}
