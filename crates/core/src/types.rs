use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entitlement status reported by the ledger for sessions and subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Entitled to consume bandwidth
    Active,
    /// No longer active but not yet finalized; may still resolve back to Active
    InactivePending,
    /// Finalized, permanently revoked
    Inactive,
}

impl Status {
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Active)
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, Status::Inactive)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::InactivePending => write!(f, "inactive_pending"),
            Status::Inactive => write!(f, "inactive"),
        }
    }
}

/// Local session record pairing a tunnel peer identity with a ledger-tracked
/// entitlement and the traffic counters last observed from the peer table.
///
/// `id` is assigned by the session establishment flow and shares the ledger's
/// session identifier space. An empty `address` marks the record as retired
/// and pending purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    /// Tunnel peer identity (public key string)
    pub key: String,
    /// Subscriber's ledger account reference; empty means soft-deleted
    pub address: String,
    pub upload: i64,
    pub download: i64,
    /// Quota ceiling in bytes granted by the subscription
    pub available: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Soft-deleted records have their address cleared and are purged by the
    /// reconciliation job at the end of a tick.
    pub fn is_retired(&self) -> bool {
        self.address.is_empty()
    }
}

/// A live connected tunnel endpoint as reported by the transport, with
/// cumulative counters since the peer connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub key: String,
    pub upload: i64,
    pub download: i64,
}

impl Peer {
    /// Total bytes moved in both directions.
    pub fn consumed(&self) -> i64 {
        self.upload.saturating_add(self.download)
    }
}

/// Upload/download byte pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub upload: i64,
    pub download: i64,
}

/// Canonical session record held by the ledger. Read-only to this node;
/// the ledger's upload direction corresponds to this node's download
/// direction for the same flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub id: i64,
    pub subscription: i64,
    pub bandwidth: Bandwidth,
    pub status: Status,
    /// Timestamp of the last status transition
    pub status_at: DateTime<Utc>,
}

/// Canonical subscription record held by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubscription {
    pub id: i64,
    pub status: Status,
}

/// Snapshot published upstream by the status heartbeat job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// This node's identity key, as registered with the ledger
    pub key: String,
    /// Currently connected peer count
    pub peers: usize,
    pub version: String,
}
