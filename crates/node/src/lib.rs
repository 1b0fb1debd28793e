//! Tollgate Node
//!
//! Runtime of a node that sells metered tunnel access. Three periodic jobs
//! keep the live peer table, the local session store and the remote ledger
//! consistent:
//!
//! - **Quota enforcement**: cross-checks live peers against session quotas;
//!   disconnects untracked connections and quota violators. Local only, so
//!   it can run on a tight interval.
//! - **Session reconciliation**: merges ledger truth with local records;
//!   disconnects peers, retires rows, and batch-syncs the survivors'
//!   counters upstream.
//! - **Status heartbeat**: republishes this node's status to the ledger.
//!
//! Every collaborator failure is fatal to its job, and the first job error
//! terminates the node (crash-and-restart supervision). Untracked peers,
//! exceeded quotas and revoked entitlements are not errors; they are the
//! steady-state events the jobs exist to handle, and are only logged.

mod config;
mod jobs;
mod node;

pub use config::NodeConfig;
pub use node::Node;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Store error: {0}")]
    Store(#[from] tollgate_store::StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] tollgate_ledger::LedgerError),

    #[error("Tunnel error: {0}")]
    Tunnel(#[from] tollgate_tunnel::TunnelError),
}

pub type Result<T> = std::result::Result<T, NodeError>;
