use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use tollgate_core::{NodeStatus, RemoteSession, RemoteSubscription, Session};

use crate::{LedgerError, Result};

/// Ledger mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Mock mode for development - state is in-memory
    Mock,
    /// Live HTTP mode against a ledger gateway
    Live,
}

/// Ledger client configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Ledger mode (Mock or Live)
    pub mode: LedgerMode,
    /// Gateway endpoint (only used in Live mode)
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mode: LedgerMode::Mock,
            endpoint: "http://127.0.0.1:26660".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl LedgerConfig {
    /// Create a mock configuration for development
    pub fn mock() -> Self {
        Self {
            mode: LedgerMode::Mock,
            ..Default::default()
        }
    }

    /// Create a live configuration against the given gateway endpoint
    pub fn live(endpoint: impl Into<String>) -> Self {
        Self {
            mode: LedgerMode::Live,
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

/// In-memory state for mock mode
#[derive(Debug, Default)]
struct MockState {
    sessions: HashMap<i64, RemoteSession>,
    subscriptions: HashMap<i64, RemoteSubscription>,
    /// Every batch pushed via `update_sessions`, in call order
    pushed: Vec<Vec<Session>>,
    /// Every heartbeat published via `publish_status`, in call order
    statuses: Vec<NodeStatus>,
    fail_next: bool,
}

/// Client for the authoritative ledger.
///
/// In mock mode all operations work against seeded in-memory state; in
/// live mode they map to the gateway's HTTP surface.
pub struct LedgerClient {
    config: LedgerConfig,
    /// HTTP client (only used in Live mode)
    http: Option<reqwest::Client>,
    /// Mock state (only used in Mock mode)
    mock_state: Arc<RwLock<MockState>>,
}

impl LedgerClient {
    /// Create a new ledger client for the given configuration.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let http = if config.mode == LedgerMode::Live {
            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()?;
            Some(client)
        } else {
            None
        };

        Ok(Self {
            config,
            http,
            mock_state: Arc::new(RwLock::new(MockState::default())),
        })
    }

    /// Create a mock-mode client directly.
    pub fn mock() -> Self {
        Self {
            config: LedgerConfig::mock(),
            http: None,
            mock_state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    /// Check if running in mock mode
    pub fn is_mock(&self) -> bool {
        self.config.mode == LedgerMode::Mock
    }

    fn http(&self) -> Result<&reqwest::Client> {
        self.http
            .as_ref()
            .ok_or_else(|| LedgerError::Transport("HTTP client not initialized".to_string()))
    }

    /// Take the one-shot failure flag (mock mode).
    fn mock_failure(&self) -> Option<LedgerError> {
        let mut state = self.mock_state.write().expect("ledger lock poisoned");
        if state.fail_next {
            state.fail_next = false;
            return Some(LedgerError::Transport("ledger unavailable".to_string()));
        }
        None
    }

    /// Query the canonical session record by id.
    pub async fn query_session(&self, id: i64) -> Result<RemoteSession> {
        debug!(session = id, "Querying ledger session");

        if self.is_mock() {
            if let Some(err) = self.mock_failure() {
                return Err(err);
            }
            let state = self.mock_state.read().expect("ledger lock poisoned");
            return state
                .sessions
                .get(&id)
                .cloned()
                .ok_or(LedgerError::SessionNotFound(id));
        }

        let url = format!("{}/sessions/{}", self.config.endpoint, id);
        let response = self.http()?.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::SessionNotFound(id));
        }
        let response = response.error_for_status()?;
        response
            .json::<RemoteSession>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    /// Query the canonical subscription record by id.
    pub async fn query_subscription(&self, id: i64) -> Result<RemoteSubscription> {
        debug!(subscription = id, "Querying ledger subscription");

        if self.is_mock() {
            if let Some(err) = self.mock_failure() {
                return Err(err);
            }
            let state = self.mock_state.read().expect("ledger lock poisoned");
            return state
                .subscriptions
                .get(&id)
                .cloned()
                .ok_or(LedgerError::SubscriptionNotFound(id));
        }

        let url = format!("{}/subscriptions/{}", self.config.endpoint, id);
        let response = self.http()?.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::SubscriptionNotFound(id));
        }
        let response = response.error_for_status()?;
        response
            .json::<RemoteSubscription>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    /// Push the latest counters of the given sessions upstream in one
    /// batched call.
    pub async fn update_sessions(&self, sessions: &[Session]) -> Result<()> {
        debug!(count = sessions.len(), "Pushing session counters upstream");

        if self.is_mock() {
            if let Some(err) = self.mock_failure() {
                return Err(err);
            }
            let mut state = self.mock_state.write().expect("ledger lock poisoned");
            state.pushed.push(sessions.to_vec());
            return Ok(());
        }

        let url = format!("{}/sessions", self.config.endpoint);
        self.http()?
            .put(&url)
            .json(sessions)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Publish this node's status. Idempotent on the ledger side.
    pub async fn publish_status(&self, status: &NodeStatus) -> Result<()> {
        debug!(key = %status.key, peers = status.peers, "Publishing node status");

        if self.is_mock() {
            if let Some(err) = self.mock_failure() {
                return Err(err);
            }
            let mut state = self.mock_state.write().expect("ledger lock poisoned");
            state.statuses.push(status.clone());
            return Ok(());
        }

        let url = format!("{}/nodes/{}/status", self.config.endpoint, status.key);
        self.http()?
            .put(&url)
            .json(status)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    // ==================== Mock Helpers ====================

    /// Seed a session record (mock mode, for testing)
    pub fn add_mock_session(&self, session: RemoteSession) {
        let mut state = self.mock_state.write().expect("ledger lock poisoned");
        state.sessions.insert(session.id, session);
    }

    /// Seed a subscription record (mock mode, for testing)
    pub fn add_mock_subscription(&self, subscription: RemoteSubscription) {
        let mut state = self.mock_state.write().expect("ledger lock poisoned");
        state.subscriptions.insert(subscription.id, subscription);
    }

    /// Batches pushed via `update_sessions`, in call order (mock mode)
    pub fn pushed_updates(&self) -> Vec<Vec<Session>> {
        let state = self.mock_state.read().expect("ledger lock poisoned");
        state.pushed.clone()
    }

    /// Heartbeats published via `publish_status`, in call order (mock mode)
    pub fn published_statuses(&self) -> Vec<NodeStatus> {
        let state = self.mock_state.read().expect("ledger lock poisoned");
        state.statuses.clone()
    }

    /// Make the next operation fail with a transport error (mock mode)
    pub fn fail_next(&self) {
        let mut state = self.mock_state.write().expect("ledger lock poisoned");
        state.fail_next = true;
    }
}
