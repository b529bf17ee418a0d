//! Path-based backend routing.
//!
//! One reserved path goes to the investigation backend with a long
//! deadline; everything else goes to the default backend. Resolution is
//! total: there is no unroutable path.

use std::time::Duration;

/// The reserved path served by the investigation backend.
pub const INVESTIGATION_PATH: &str = "/api/v1/investigate";

/// Deadline for ordinary proxied traffic.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for investigation traffic; runs are long.
pub const INVESTIGATION_TIMEOUT: Duration = Duration::from_secs(600);

/// The two static targets this gateway fronts.
#[derive(Debug, Clone)]
pub struct RouteTable {
    default_backend: String,
    investigation_backend: String,
    default_timeout: Duration,
    investigation_timeout: Duration,
}

/// Where one request goes and how long it may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub backend_url: String,
    pub timeout: Duration,
}

impl RouteTable {
    pub fn new(
        default_backend: impl Into<String>,
        investigation_backend: impl Into<String>,
    ) -> Self {
        Self {
            default_backend: trim_base(default_backend.into()),
            investigation_backend: trim_base(investigation_backend.into()),
            default_timeout: DEFAULT_TIMEOUT,
            investigation_timeout: INVESTIGATION_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, default_timeout: Duration, investigation_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self.investigation_timeout = investigation_timeout;
        self
    }

    /// Resolve a request path to its backend and deadline. Unknown paths
    /// fall to the default backend, which may well 404 them itself.
    pub fn resolve(&self, path: &str) -> RouteDecision {
        if path == INVESTIGATION_PATH {
            RouteDecision {
                backend_url: self.investigation_backend.clone(),
                timeout: self.investigation_timeout,
            }
        } else {
            RouteDecision {
                backend_url: self.default_backend.clone(),
                timeout: self.default_timeout,
            }
        }
    }
}

/// Base URLs are joined with request paths, so a trailing slash would
/// produce `//` in target URLs.
fn trim_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new("http://localhost:8001", "http://localhost:8002")
    }

    #[test]
    fn test_reserved_path_routes_to_investigation_backend() {
        let decision = table().resolve("/api/v1/investigate");
        assert_eq!(decision.backend_url, "http://localhost:8002");
        assert_eq!(decision.timeout, INVESTIGATION_TIMEOUT);
    }

    #[test]
    fn test_other_paths_route_to_default_backend() {
        for path in ["/", "/run", "/api/v1/investigate/extra", "/api/v2/investigate", "/health"] {
            let decision = table().resolve(path);
            assert_eq!(decision.backend_url, "http://localhost:8001", "path {path}");
            assert_eq!(decision.timeout, DEFAULT_TIMEOUT, "path {path}");
        }
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_urls() {
        let table = RouteTable::new("http://localhost:8001/", "http://localhost:8002//");
        assert_eq!(table.resolve("/x").backend_url, "http://localhost:8001");
        assert_eq!(
            table.resolve(INVESTIGATION_PATH).backend_url,
            "http://localhost:8002"
        );
    }

    #[test]
    fn test_timeout_overrides() {
        let table = table().with_timeouts(Duration::from_secs(5), Duration::from_secs(30));
        assert_eq!(table.resolve("/x").timeout, Duration::from_secs(5));
        assert_eq!(
            table.resolve(INVESTIGATION_PATH).timeout,
            Duration::from_secs(30)
        );
    }
}
