//! Tollgate Tunnel
//!
//! The node's view of the tunnel transport's peer table. The transport
//! itself (WireGuard or similar) lives outside this repository; this crate
//! defines the contract the reconciliation jobs consume, plus an in-memory
//! implementation used by tests and local development.

mod memory;

pub use memory::MemoryTunnel;

use async_trait::async_trait;
use thiserror::Error;

use tollgate_core::Peer;

#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("Tunnel transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, TunnelError>;

/// Live peer-table access offered by the tunnel service.
#[async_trait]
pub trait TunnelService: Send + Sync {
    /// Snapshot of currently connected peers with their cumulative
    /// traffic counters.
    async fn peers(&self) -> Result<Vec<Peer>>;

    /// Disconnect the peer with the given key. Disconnecting an absent
    /// peer is a no-op.
    async fn remove_peer(&self, key: &str) -> Result<()>;
}
