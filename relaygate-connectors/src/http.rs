//! HTTP Snapshot Uplink
//!
//! ## Overview
//!
//! Spreadsheet-style backends (a published script endpoint, a form handler)
//! accept readings as query parameters on a plain GET:
//!
//! ```text
//! GET {base_url}?temp=25.00&humid=61.50&water=420&distance=123.45&vibration=0
//! ```
//!
//! If the base URL already carries a query string the readings are appended
//! with `&`. Such endpoints usually answer with a redirect to a result page;
//! redirects are followed and whatever comes back is discarded.
//!
//! ## Blocking
//!
//! `push_snapshot` blocks for up to the configured timeout. The gateway only
//! calls it from the snapshot task, never from frame ingestion.
//!
//! ## Example Usage
//!
//! ```no_run
//! use relaygate_connectors::http::{HttpConfig, SnapshotUplink};
//!
//! let config = HttpConfig::new("https://sheets.example.com/exec")
//!     .timeout_secs(15)
//!     .header("X-Device", "gateway-01");
//! let uplink = SnapshotUplink::new(config)?;
//! # Ok::<(), relaygate_connectors::ConnectorError>(())
//! ```

use std::time::Duration;

use base64::Engine;
use relaygate_core::state::TelemetrySnapshot;
use relaygate_core::traits::TelemetryUplink;

use crate::{ConnectionStats, ConnectorError};

/// Authentication methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic { username: String, password: String },
}

/// HTTP uplink configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Endpoint receiving the snapshots
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Redirects to follow before giving up
    pub max_redirects: u32,
    /// User agent string
    pub user_agent: String,
}

impl HttpConfig {
    /// Create new configuration with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            auth: AuthMethod::None,
            headers: Vec::new(),
            max_redirects: 5,
            user_agent: format!("RelayGate/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set how many redirects to follow
    pub fn max_redirects(mut self, redirects: u32) -> Self {
        self.max_redirects = redirects;
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConnectorError::ConfigError(
                "Base URL must start with http:// or https://".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConnectorError::ConfigError("Timeout must be non-zero".into()));
        }
        Ok(())
    }

    fn authorization(&self) -> Option<String> {
        match &self.auth {
            AuthMethod::None => None,
            AuthMethod::Bearer(token) => Some(format!("Bearer {}", token)),
            AuthMethod::Basic { username, password } => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", credentials))
            }
        }
    }
}

/// Full request URL for a snapshot
pub fn snapshot_url(base_url: &str, snapshot: &TelemetrySnapshot) -> String {
    let mut url = String::with_capacity(base_url.len() + 96);
    url.push_str(base_url);
    url.push(if base_url.contains('?') { '&' } else { '?' });
    // Writing into a String cannot fail
    let _ = snapshot.write_query(&mut url);
    url
}

/// Sends snapshots as HTTP GET requests using the ureq client
pub struct SnapshotUplink {
    config: HttpConfig,
    agent: ureq::Agent,
    stats: ConnectionStats,
}

impl SnapshotUplink {
    /// Create new uplink
    pub fn new(config: HttpConfig) -> Result<Self, ConnectorError> {
        config.validate()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .redirects(config.max_redirects)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: ConnectionStats::default(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Delivery statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    fn build_request(&self, url: &str) -> ureq::Request {
        let mut request = self.agent.get(url);
        if let Some(authorization) = self.config.authorization() {
            request = request.set("Authorization", &authorization);
        }
        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }
        request
    }

    fn send(&mut self, url: &str) -> Result<(), ConnectorError> {
        match self.build_request(url).call() {
            Ok(response) => {
                log::debug!("snapshot accepted with status {}", response.status());
                self.stats.record_sent(url.len());
                Ok(())
            }
            Err(ureq::Error::Status(code, _response)) => Err(ConnectorError::Status(code)),
            Err(ureq::Error::Transport(e)) => Err(ConnectorError::Transport(e.to_string())),
        }
    }
}

impl TelemetryUplink for SnapshotUplink {
    type Error = ConnectorError;

    fn push_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), Self::Error> {
        let url = snapshot_url(&self.config.base_url, snapshot);
        self.send(&url).map_err(|e| {
            log::warn!("snapshot upload failed: {}", e);
            self.stats.record_failure(&e);
            e
        })
    }
}
