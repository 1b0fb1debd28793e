//! Quota enforcement scenarios over a single tick:
//!   1. Untracked connections are evicted without touching the store
//!   2. Violators are disconnected with their counters persisted
//!   3. Compliant peers stay connected
//!   4. Collaborator failures are fatal to the job

use chrono::Utc;
use tollgate_core::Session;
use tollgate_ledger::LedgerClient;
use tollgate_node::{Node, NodeConfig, NodeError};
use tollgate_store::SessionStore;
use tollgate_tunnel::MemoryTunnel;

async fn make_node() -> Node<MemoryTunnel> {
    let store = SessionStore::open("sqlite::memory:").await.unwrap();
    let config = NodeConfig {
        key: "node-1".to_string(),
        ..Default::default()
    };
    Node::new(config, store, LedgerClient::mock(), MemoryTunnel::new())
}

fn session(id: i64, key: &str, available: i64) -> Session {
    Session {
        id,
        key: key.to_string(),
        address: format!("acct{id}"),
        upload: 0,
        download: 0,
        available,
        created_at: Utc::now(),
    }
}

// ── Untracked connections ───────────────────────────────────────────────────

#[tokio::test]
async fn test_untracked_peer_disconnected_without_store_write() {
    let node = make_node().await;
    node.tunnel().connect("stranger", 100, 200);

    node.enforce_quota_once().await.unwrap();

    assert_eq!(node.tunnel().removed_keys(), vec!["stranger".to_string()]);
    assert!(!node.tunnel().is_connected("stranger"));
    assert!(node.store().all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_untracked_and_tracked_peers_processed_independently() {
    let node = make_node().await;
    node.store().insert(&session(1, "k1", 2000)).await.unwrap();
    node.tunnel().connect("k1", 100, 200);
    node.tunnel().connect("stranger", 1, 1);

    node.enforce_quota_once().await.unwrap();

    assert_eq!(node.tunnel().removed_keys(), vec!["stranger".to_string()]);
    assert!(node.tunnel().is_connected("k1"));
}

// ── Quota comparison ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_quota_exceeded_disconnects_and_persists_counters() {
    // Scenario S1: available=1000, peer reports 400 up / 700 down
    let node = make_node().await;
    node.store().insert(&session(1, "k1", 1000)).await.unwrap();
    node.tunnel().connect("k1", 400, 700);

    node.enforce_quota_once().await.unwrap();

    assert_eq!(node.tunnel().removed_keys(), vec!["k1".to_string()]);
    let stored = node.store().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.upload, 400);
    assert_eq!(stored.download, 700);
    // The record itself is the reconciliation job's business
    assert!(!stored.is_retired());
}

#[tokio::test]
async fn test_within_quota_stays_connected() {
    let node = make_node().await;
    node.store().insert(&session(1, "k1", 2000)).await.unwrap();
    node.tunnel().connect("k1", 400, 700);

    node.enforce_quota_once().await.unwrap();

    assert!(node.tunnel().removed_keys().is_empty());
    assert!(node.tunnel().is_connected("k1"));
    let stored = node.store().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.upload, 400);
    assert_eq!(stored.download, 700);
}

#[tokio::test]
async fn test_consumption_equal_to_quota_is_not_a_violation() {
    let node = make_node().await;
    node.store().insert(&session(1, "k1", 1000)).await.unwrap();
    node.tunnel().connect("k1", 500, 500);

    node.enforce_quota_once().await.unwrap();

    assert!(node.tunnel().is_connected("k1"));
}

#[tokio::test]
async fn test_counters_rewritten_even_when_unchanged() {
    let node = make_node().await;
    node.store().insert(&session(1, "k1", 1000)).await.unwrap();
    node.tunnel().connect("k1", 10, 20);

    node.enforce_quota_once().await.unwrap();
    node.enforce_quota_once().await.unwrap();

    let stored = node.store().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.upload, 10);
    assert_eq!(stored.download, 20);
    assert!(node.tunnel().is_connected("k1"));
}

// ── Empty tick and failure paths ────────────────────────────────────────────

#[tokio::test]
async fn test_no_peers_is_a_noop() {
    let node = make_node().await;
    node.store().insert(&session(1, "k1", 1000)).await.unwrap();

    node.enforce_quota_once().await.unwrap();

    assert!(node.tunnel().removed_keys().is_empty());
    let stored = node.store().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.upload, 0);
    assert_eq!(stored.download, 0);
}

#[tokio::test]
async fn test_peer_list_failure_is_fatal() {
    let node = make_node().await;
    node.tunnel().fail_next_peers();

    let result = node.enforce_quota_once().await;
    assert!(matches!(result, Err(NodeError::Tunnel(_))));
}

#[tokio::test]
async fn test_disconnect_failure_is_fatal() {
    let node = make_node().await;
    node.tunnel().connect("stranger", 0, 0);
    node.tunnel().fail_next_remove();

    let result = node.enforce_quota_once().await;
    assert!(matches!(result, Err(NodeError::Tunnel(_))));
    // No per-peer retry: the peer is still connected after the failed cycle
    assert!(node.tunnel().is_connected("stranger"));
}
