//! Orchestrates a single client write or delete on the leader: local
//! apply, replication fan-out, and quorum-to-response translation.

use crate::replication::ReplicationDispatcher;
use crate::store::{KvStore, ReplicationMessage};
use std::sync::Arc;
use tracing::info;

/// Result of coordinating one write, ready to be turned into an HTTP response.
#[derive(Debug, Clone, Copy)]
pub enum WriteOutcome {
    QuorumReached { version: u64, acks: usize },
    QuorumMissed { acks: usize, quorum: usize },
}

pub struct WriteCoordinator {
    store: Arc<KvStore>,
    dispatcher: ReplicationDispatcher,
    quorum: usize,
}

impl WriteCoordinator {
    pub fn new(store: Arc<KvStore>, dispatcher: ReplicationDispatcher, quorum: usize) -> Self {
        Self {
            store,
            dispatcher,
            quorum,
        }
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn follower_urls(&self) -> &[String] {
        self.dispatcher.follower_urls()
    }

    /// Applies `key = value` locally, then replicates it to all
    /// followers, waiting for quorum.
    pub async fn write(&self, key: &str, value: &str) -> WriteOutcome {
        let version = self.store.apply_local_write(key, value);
        let msg = ReplicationMessage::write(key, value, version);
        self.finish(version, msg).await
    }

    /// Deletes `key` locally, then replicates the tombstone to all
    /// followers, waiting for quorum. Follows the same version rule as
    /// a write.
    pub async fn delete(&self, key: &str) -> WriteOutcome {
        let version = self.store.apply_local_delete(key);
        let msg = ReplicationMessage::delete(key, version);
        self.finish(version, msg).await
    }

    async fn finish(&self, version: u64, msg: ReplicationMessage) -> WriteOutcome {
        let outcome = self.dispatcher.dispatch(msg, self.quorum).await;
        if outcome.quorum_met(self.quorum) {
            info!(version, acks = outcome.acks, quorum = self.quorum, "quorum reached");
            WriteOutcome::QuorumReached {
                version,
                acks: outcome.acks,
            }
        } else {
            info!(version, acks = outcome.acks, quorum = self.quorum, "quorum missed");
            WriteOutcome::QuorumMissed {
                acks: outcome.acks,
                quorum: self.quorum,
            }
        }
    }
}
