//! Tollgate Core
//!
//! Shared data model for the tollgate node: local session records, live
//! peers, and the read-only ledger views the reconciliation jobs consume.

mod types;

pub use types::{
    Bandwidth, NodeStatus, Peer, RemoteSession, RemoteSubscription, Session, Status,
};
