//! In-memory peer table.
//!
//! Stands in for the real transport in tests and local development. Peers
//! are kept in key order so snapshots are deterministic, and both
//! operations support one-shot failure injection to exercise the jobs'
//! fail-fast paths.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use tollgate_core::Peer;

use crate::{Result, TunnelError, TunnelService};

#[derive(Debug, Default)]
struct State {
    peers: BTreeMap<String, Peer>,
    /// Keys `remove_peer` was called with, in call order
    removed: Vec<String>,
    fail_peers: bool,
    fail_remove: bool,
}

/// In-memory [`TunnelService`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryTunnel {
    state: Arc<RwLock<State>>,
}

impl MemoryTunnel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connected peer with the given cumulative counters.
    pub fn connect(&self, key: &str, upload: i64, download: i64) {
        let mut state = self.state.write().expect("tunnel lock poisoned");
        state.peers.insert(
            key.to_string(),
            Peer {
                key: key.to_string(),
                upload,
                download,
            },
        );
    }

    /// Overwrite the counters of a connected peer; absent keys are ignored.
    pub fn set_counters(&self, key: &str, upload: i64, download: i64) {
        let mut state = self.state.write().expect("tunnel lock poisoned");
        if let Some(peer) = state.peers.get_mut(key) {
            peer.upload = upload;
            peer.download = download;
        }
    }

    pub fn is_connected(&self, key: &str) -> bool {
        let state = self.state.read().expect("tunnel lock poisoned");
        state.peers.contains_key(key)
    }

    pub fn connected_count(&self) -> usize {
        let state = self.state.read().expect("tunnel lock poisoned");
        state.peers.len()
    }

    /// Keys `remove_peer` was called with, in call order (including calls
    /// for peers that were already gone).
    pub fn removed_keys(&self) -> Vec<String> {
        let state = self.state.read().expect("tunnel lock poisoned");
        state.removed.clone()
    }

    /// Make the next `peers` call fail with a transport error.
    pub fn fail_next_peers(&self) {
        let mut state = self.state.write().expect("tunnel lock poisoned");
        state.fail_peers = true;
    }

    /// Make the next `remove_peer` call fail with a transport error.
    pub fn fail_next_remove(&self) {
        let mut state = self.state.write().expect("tunnel lock poisoned");
        state.fail_remove = true;
    }
}

#[async_trait]
impl TunnelService for MemoryTunnel {
    async fn peers(&self) -> Result<Vec<Peer>> {
        let mut state = self.state.write().expect("tunnel lock poisoned");
        if state.fail_peers {
            state.fail_peers = false;
            return Err(TunnelError::Transport("peer table unavailable".to_string()));
        }
        Ok(state.peers.values().cloned().collect())
    }

    async fn remove_peer(&self, key: &str) -> Result<()> {
        let mut state = self.state.write().expect("tunnel lock poisoned");
        if state.fail_remove {
            state.fail_remove = false;
            return Err(TunnelError::Transport(format!(
                "failed to disconnect {key}"
            )));
        }
        state.removed.push(key.to_string());
        state.peers.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_and_list() {
        let tunnel = MemoryTunnel::new();
        tunnel.connect("b", 10, 20);
        tunnel.connect("a", 1, 2);

        let peers = tunnel.peers().await.unwrap();
        assert_eq!(peers.len(), 2);
        // Key order, so snapshots are deterministic
        assert_eq!(peers[0].key, "a");
        assert_eq!(peers[1].key, "b");
        assert_eq!(peers[1].upload, 10);
        assert_eq!(peers[1].download, 20);
    }

    #[tokio::test]
    async fn test_set_counters() {
        let tunnel = MemoryTunnel::new();
        tunnel.connect("a", 0, 0);
        tunnel.set_counters("a", 5, 7);
        tunnel.set_counters("missing", 1, 1);

        let peers = tunnel.peers().await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].upload, 5);
        assert_eq!(peers[0].download, 7);
    }

    #[tokio::test]
    async fn test_remove_peer() {
        let tunnel = MemoryTunnel::new();
        tunnel.connect("a", 0, 0);

        tunnel.remove_peer("a").await.unwrap();
        assert!(!tunnel.is_connected("a"));
        assert_eq!(tunnel.removed_keys(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_absent_peer_is_noop() {
        let tunnel = MemoryTunnel::new();
        tunnel.remove_peer("ghost").await.unwrap();
        assert_eq!(tunnel.connected_count(), 0);
        assert_eq!(tunnel.removed_keys(), vec!["ghost".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_injection_is_one_shot() {
        let tunnel = MemoryTunnel::new();
        tunnel.connect("a", 0, 0);

        tunnel.fail_next_peers();
        assert!(tunnel.peers().await.is_err());
        assert!(tunnel.peers().await.is_ok());

        tunnel.fail_next_remove();
        assert!(tunnel.remove_peer("a").await.is_err());
        assert!(tunnel.is_connected("a"));
        assert!(tunnel.remove_peer("a").await.is_ok());
        assert!(!tunnel.is_connected("a"));
    }
}
