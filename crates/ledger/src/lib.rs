//! Tollgate Ledger
//!
//! Client for the remote ledger that is authoritative for session and
//! subscription state. Supports two modes:
//!
//! - **Mock Mode**: for development/testing without a ledger. State is
//!   seeded and inspected in-memory.
//! - **Live Mode**: JSON over HTTP against the ledger gateway.
//!
//! The node only ever reads canonical records by id and pushes two kinds
//! of writes upstream: the batched session-counter update and its own
//! status heartbeat.

mod client;

pub use client::{LedgerClient, LedgerConfig, LedgerMode};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Session {0} not found on the ledger")]
    SessionNotFound(i64),

    #[error("Subscription {0} not found on the ledger")]
    SubscriptionNotFound(i64),

    #[error("Ledger transport error: {0}")]
    Transport(String),

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
