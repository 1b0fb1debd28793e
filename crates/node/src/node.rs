use tollgate_core::NodeStatus;
use tollgate_ledger::LedgerClient;
use tollgate_store::SessionStore;
use tollgate_tunnel::TunnelService;

use crate::{NodeConfig, Result};

/// Tollgate node: owns the collaborators and drives the periodic jobs.
///
/// The session store and the peer table are also mutated by the session
/// establishment flow and by peers connecting and disconnecting; no
/// coordination is attempted. Both jobs only move sessions monotonically
/// toward disconnected/retired, so observing a record mid-update delays a
/// correct outcome by at most one tick and never reverses one.
pub struct Node<T> {
    pub(crate) config: NodeConfig,
    pub(crate) store: SessionStore,
    pub(crate) ledger: LedgerClient,
    pub(crate) tunnel: T,
}

impl<T: TunnelService> Node<T> {
    pub fn new(config: NodeConfig, store: SessionStore, ledger: LedgerClient, tunnel: T) -> Self {
        Self {
            config,
            store,
            ledger,
            tunnel,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn ledger(&self) -> &LedgerClient {
        &self.ledger
    }

    pub fn tunnel(&self) -> &T {
        &self.tunnel
    }

    /// Current status snapshot published by the heartbeat job.
    pub async fn status(&self) -> Result<NodeStatus> {
        let peers = self.tunnel.peers().await?;
        Ok(NodeStatus {
            key: self.config.key.clone(),
            peers: peers.len(),
            version: self.config.version.clone(),
        })
    }

    /// Run all jobs until the first fatal error.
    ///
    /// Jobs never finish on their own; the returned error is from whichever
    /// job failed first, and the remaining jobs are cancelled with it.
    pub async fn run(&self) -> Result<()> {
        tokio::try_join!(
            self.job_enforce_quota(),
            self.job_reconcile_sessions(),
            self.job_publish_status(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_tunnel::MemoryTunnel;

    async fn make_node() -> Node<MemoryTunnel> {
        let store = SessionStore::open("sqlite::memory:").await.unwrap();
        let config = NodeConfig {
            key: "node-1".to_string(),
            ..Default::default()
        };
        Node::new(config, store, LedgerClient::mock(), MemoryTunnel::new())
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let node = make_node().await;
        node.tunnel().connect("k1", 0, 0);
        node.tunnel().connect("k2", 0, 0);

        let status = node.status().await.unwrap();
        assert_eq!(status.key, "node-1");
        assert_eq!(status.peers, 2);
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_status_fails_on_peer_table_error() {
        let node = make_node().await;
        node.tunnel().fail_next_peers();
        assert!(node.status().await.is_err());
    }
}
