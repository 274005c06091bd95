//! Connection settings for one app.

use std::time::Duration;

use kintone_transport::{BasicAuth, Credentials};
use serde::{Deserialize, Serialize};

/// Where the app lives and how to reach it.
///
/// Start from [`AppConfig::new`] and override what you need. The struct
/// also deserializes from a host's config file; missing keys take the
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host name of the deployment, e.g. `example.cybozu.com`.
    pub domain: String,
    pub app_id: u64,
    /// Set when the app lives in a guest space.
    pub guest_space_id: Option<u64>,
    pub credentials: Credentials,
    pub basic_auth: Option<BasicAuth>,
    pub user_agent: String,
    /// Upper bound on one request, including reading the reply.
    ///
    /// Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            app_id: 0,
            guest_space_id: None,
            credentials: Credentials::default(),
            basic_auth: None,
            user_agent: format!("kintone-rust/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn new(domain: impl Into<String>, app_id: u64) -> Self {
        Self {
            domain: domain.into(),
            app_id,
            ..Self::default()
        }
    }

    pub fn guest_space(mut self, id: u64) -> Self {
        self.guest_space_id = Some(id);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL of the endpoint `api` (e.g. `"record"`,
    /// `"records/cursor"`).
    pub fn api_url(&self, api: &str) -> String {
        match self.guest_space_id {
            Some(space) => format!("https://{}/k/guest/{space}/v1/{api}.json", self.domain),
            None => format!("https://{}/k/v1/{api}.json", self.domain),
        }
    }
}
