use std::time::Duration;

/// Node runtime configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This node's identity key, as registered with the ledger
    pub key: String,
    /// Version string published with the status heartbeat
    pub version: String,
    /// Interval of the quota enforcement job
    pub quota_interval: Duration,
    /// Interval of the session reconciliation job
    pub reconcile_interval: Duration,
    /// Interval of the status heartbeat job
    pub status_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            quota_interval: Duration::from_secs(10),
            reconcile_interval: Duration::from_secs(120),
            status_interval: Duration::from_secs(300),
        }
    }
}
