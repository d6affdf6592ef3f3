//! Process configuration, parsed and validated once at startup from
//! environment variables. Invalid configuration is rejected here,
//! before the HTTP listener binds.

use crate::core::{DbError, Result};
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Follower => "follower",
        }
    }
}

/// Leader-only replication parameters.
#[derive(Debug, Clone)]
pub struct LeaderConfig {
    pub follower_urls: Vec<String>,
    pub quorum: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub role: Role,
    pub bind_addr: SocketAddr,
    /// Informational only; followers don't dial the leader directly.
    pub leader_url: Option<String>,
    pub leader: Option<LeaderConfig>,
}

impl NodeSettings {
    /// Reads and validates configuration from the environment. Never
    /// panics; all failures are reported as [`DbError::Configuration`]
    /// so `main` can log and exit non-zero.
    pub fn from_env() -> Result<Self> {
        let role = match std::env::var("NODE_TYPE").as_deref() {
            Ok("leader") => Role::Leader,
            Ok("follower") => Role::Follower,
            Ok(other) => {
                return Err(DbError::Configuration(format!(
                    "NODE_TYPE must be 'leader' or 'follower', got '{other}'"
                )));
            }
            Err(_) => {
                return Err(DbError::Configuration(
                    "NODE_TYPE must be set to 'leader' or 'follower'".to_string(),
                ));
            }
        };

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| DbError::Configuration(format!("invalid BIND_ADDR '{bind_addr}': {e}")))?;

        let leader_url = std::env::var("LEADER_URL").ok();

        let leader = match role {
            Role::Leader => Some(Self::parse_leader_config()?),
            Role::Follower => None,
        };

        Ok(Self {
            role,
            bind_addr,
            leader_url,
            leader,
        })
    }

    fn parse_leader_config() -> Result<LeaderConfig> {
        let follower_urls: Vec<String> = std::env::var("FOLLOWER_URLS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let quorum: usize = std::env::var("WRITE_QUORUM")
            .map_err(|_| DbError::Configuration("WRITE_QUORUM must be set on the leader".into()))?
            .parse()
            .map_err(|e| DbError::Configuration(format!("invalid WRITE_QUORUM: {e}")))?;

        if quorum == 0 {
            return Err(DbError::Configuration(
                "WRITE_QUORUM must be at least 1".to_string(),
            ));
        }
        if quorum > follower_urls.len() {
            return Err(DbError::Configuration(format!(
                "WRITE_QUORUM ({quorum}) cannot exceed the number of followers ({})",
                follower_urls.len()
            )));
        }

        let min_delay_ms = parse_delay_env("MIN_DELAY_MS", 0)?;
        let max_delay_ms = parse_delay_env("MAX_DELAY_MS", 1000)?;
        if min_delay_ms > max_delay_ms {
            return Err(DbError::Configuration(format!(
                "MIN_DELAY_MS ({min_delay_ms}) must not exceed MAX_DELAY_MS ({max_delay_ms})"
            )));
        }

        Ok(LeaderConfig {
            follower_urls,
            quorum,
            min_delay_ms,
            max_delay_ms,
        })
    }
}

fn parse_delay_env(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| DbError::Configuration(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
