use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Options for [`HttpRemote`](super::HttpRemote).
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// Root URL; the entity's collection name is appended as a path segment.
    pub base_url: String,
    /// Per-request timeout. Expiry surfaces as a transport error.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpRemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: format!("optimistic_cache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpRemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
