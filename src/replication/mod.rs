//! The leader's replication dispatcher: fans a single write out to every
//! follower concurrently, waits for the first `quorum` acknowledgements,
//! and abandons the rest once quorum is reached.

use crate::store::ReplicationMessage;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Outcome of dispatching one write to the follower set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub acks: usize,
}

impl DispatchOutcome {
    pub fn quorum_met(&self, quorum: usize) -> bool {
        self.acks >= quorum
    }
}

/// Fans a replication message out to the configured followers.
///
/// Holds one shared [`reqwest::Client`] so concurrent dispatches reuse
/// pooled connections instead of opening a new one per follower per write.
pub struct ReplicationDispatcher {
    client: reqwest::Client,
    follower_urls: Vec<String>,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl ReplicationDispatcher {
    pub fn new(follower_urls: Vec<String>, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            client,
            follower_urls,
            min_delay_ms,
            max_delay_ms,
        }
    }

    pub fn follower_count(&self) -> usize {
        self.follower_urls.len()
    }

    pub fn follower_urls(&self) -> &[String] {
        &self.follower_urls
    }

    /// Dispatches `msg` to every follower concurrently and returns once
    /// `quorum` acknowledgements have arrived, or every attempt has
    /// resolved (whichever comes first). Attempts still in flight when
    /// quorum is reached are aborted, not merely ignored.
    pub async fn dispatch(&self, msg: ReplicationMessage, quorum: usize) -> DispatchOutcome {
        let msg = Arc::new(msg);
        let mut tasks = JoinSet::new();

        for follower_url in &self.follower_urls {
            let client = self.client.clone();
            let follower_url = follower_url.clone();
            let msg = Arc::clone(&msg);
            let delay_ms = random_delay_ms(self.min_delay_ms, self.max_delay_ms);
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let outcome = send_replicate(&client, &follower_url, &msg).await;
                (follower_url, outcome)
            });
        }

        let mut acks = 0usize;
        while acks < quorum {
            match tasks.join_next().await {
                Some(Ok((follower_url, Ok(())))) => {
                    debug!(follower = %follower_url, "replication acknowledged");
                    acks += 1;
                }
                Some(Ok((follower_url, Err(err)))) => {
                    warn!(follower = %follower_url, error = %err, "replication attempt failed");
                }
                Some(Err(join_err)) => {
                    warn!(error = %join_err, "replication task panicked or was cancelled");
                }
                None => break,
            }
        }

        // Dropping the JoinSet aborts every task that hasn't completed yet,
        // bounding their lifetime once we've stopped waiting on them.
        drop(tasks);

        DispatchOutcome { acks }
    }
}

fn random_delay_ms(min_ms: u64, max_ms: u64) -> u64 {
    if min_ms >= max_ms {
        return min_ms;
    }
    rand::thread_rng().gen_range(min_ms..=max_ms)
}

async fn send_replicate(
    client: &reqwest::Client,
    follower_url: &str,
    msg: &ReplicationMessage,
) -> Result<(), String> {
    let url = format!("{}/replicate", follower_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(msg)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("follower returned status {}", response.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_met_compares_acks_to_quorum() {
        let outcome = DispatchOutcome { acks: 3 };
        assert!(outcome.quorum_met(3));
        assert!(outcome.quorum_met(2));
        assert!(!outcome.quorum_met(4));
    }

    #[test]
    fn random_delay_respects_bounds() {
        for _ in 0..50 {
            let d = random_delay_ms(10, 20);
            assert!((10..=20).contains(&d));
        }
        assert_eq!(random_delay_ms(5, 5), 5);
    }

    #[tokio::test]
    async fn dispatch_against_no_followers_returns_zero_acks() {
        let dispatcher = ReplicationDispatcher::new(Vec::new(), 0, 0);
        let outcome = dispatcher
            .dispatch(ReplicationMessage::write("k", "v", 1), 0)
            .await;
        assert_eq!(outcome.acks, 0);
    }
}
