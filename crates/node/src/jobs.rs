//! The periodic jobs.
//!
//! Each job is an infinite interval-driven loop: the first cycle runs
//! immediately on start, ticks are not queued, and a cycle that overruns
//! its interval is followed by exactly one immediate cycle rather than a
//! catch-up burst. A cycle error unwinds the loop; there is no per-record
//! retry or backoff.

use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use tollgate_tunnel::TunnelService;

use crate::{Node, Result};

impl<T: TunnelService> Node<T> {
    /// Quota enforcement job: keep live usage within each session's quota
    /// and evict connections with no backing session record.
    pub async fn job_enforce_quota(&self) -> Result<()> {
        info!(
            name = "enforce_quota",
            interval = ?self.config.quota_interval,
            "Starting a job"
        );

        let mut ticker = time::interval(self.config.quota_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.enforce_quota_once().await?;
        }
    }

    /// One quota enforcement cycle.
    ///
    /// Never deletes records and never talks to the ledger; cleanup of a
    /// violator's ledger-side state is the reconciliation job's business.
    pub async fn enforce_quota_once(&self) -> Result<()> {
        let peers = self.tunnel.peers().await?;
        if peers.is_empty() {
            return Ok(());
        }
        info!(count = peers.len(), "Validating the usage of connected peers");

        for peer in &peers {
            let Some(session) = self.store.find_by_key(&peer.key).await? else {
                info!(key = %peer.key, "Unknown connected peer");
                self.tunnel.remove_peer(&peer.key).await?;
                continue;
            };

            // Unconditional overwrite, even if the counters are unchanged
            if let Err(err) = self
                .store
                .update_counters(session.id, peer.upload, peer.download)
                .await
            {
                warn!(session = session.id, %err, "Failed to persist peer counters");
            }

            let consumed = peer.consumed();
            if consumed > session.available {
                info!(
                    key = %peer.key,
                    consumed,
                    available = session.available,
                    "Peer quota exceeded"
                );
                self.tunnel.remove_peer(&session.key).await?;
            }
        }

        Ok(())
    }

    /// Session reconciliation job: merge ledger truth with local records,
    /// then commit pending deletions and batch-sync the survivors.
    pub async fn job_reconcile_sessions(&self) -> Result<()> {
        info!(
            name = "reconcile_sessions",
            interval = ?self.config.reconcile_interval,
            "Starting a job"
        );

        let mut ticker = time::interval(self.config.reconcile_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.reconcile_sessions_once().await?;
        }
    }

    /// One reconciliation cycle.
    pub async fn reconcile_sessions_once(&self) -> Result<()> {
        let mut items = self.store.all().await?;
        if !items.is_empty() {
            info!(count = items.len(), "Validating the saved sessions");
        }

        // Reverse scan: removing the current element never shifts the
        // indices of unvisited ones, so each record is visited exactly once.
        let mut i = items.len();
        while i > 0 {
            i -= 1;

            let remote = self.ledger.query_session(items[i].id).await?;
            let subscription = self.ledger.query_subscription(remote.subscription).await?;

            let mut remove_peer = false;
            let mut remove_session = false;
            let mut skip_update = false;

            // The ledger's upload direction is this node's download
            // direction for the same flow; equality means no traffic has
            // advanced since the last successful sync.
            if items[i].download == remote.bandwidth.upload {
                skip_update = true;
                if items[i].created_at < remote.status_at {
                    remove_peer = true;
                }

                info!(
                    session = items[i].id,
                    key = %items[i].key,
                    created_at = %items[i].created_at,
                    status_at = %remote.status_at,
                    "Stale peer connection"
                );
            }
            if !subscription.status.is_active() {
                remove_peer = true;
                if subscription.status.is_inactive() {
                    remove_session = true;
                    skip_update = true;
                }

                info!(
                    session = items[i].id,
                    key = %items[i].key,
                    subscription = subscription.id,
                    status = %subscription.status,
                    "Invalid subscription status"
                );
            }
            if !remote.status.is_active() {
                remove_peer = true;
                if remote.status.is_inactive() {
                    remove_session = true;
                    skip_update = true;
                }

                info!(
                    session = items[i].id,
                    key = %items[i].key,
                    status = %remote.status,
                    "Invalid session status"
                );
            }

            if remove_peer {
                self.tunnel.remove_peer(&items[i].key).await?;
            }

            if remove_session {
                if let Err(err) = self.store.clear_address(items[i].id).await {
                    warn!(session = items[i].id, %err, "Failed to retire session record");
                }
            }

            if skip_update {
                items.remove(i);
            }
        }

        // Purges the rows retired this cycle and sweeps any left over from
        // a prior incomplete one.
        if let Err(err) = self.store.purge_deleted().await {
            warn!(%err, "Failed to purge retired sessions");
        }

        if items.is_empty() {
            return Ok(());
        }

        self.ledger.update_sessions(&items).await?;
        Ok(())
    }

    /// Status heartbeat job: republish this node's status upstream.
    pub async fn job_publish_status(&self) -> Result<()> {
        info!(
            name = "publish_status",
            interval = ?self.config.status_interval,
            "Starting a job"
        );

        let mut ticker = time::interval(self.config.status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.publish_status_once().await?;
        }
    }

    /// One heartbeat cycle.
    pub async fn publish_status_once(&self) -> Result<()> {
        let status = self.status().await?;
        self.ledger.publish_status(&status).await?;
        Ok(())
    }
}
