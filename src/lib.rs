//! Distributed in-memory key-value store with single-leader,
//! semi-synchronous quorum replication.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod replication;
pub mod store;
pub mod web;

pub use config::{LeaderConfig, NodeSettings, Role};
pub use core::{DbError, Result};
pub use coordinator::{WriteCoordinator, WriteOutcome};
pub use replication::{DispatchOutcome, ReplicationDispatcher};
pub use store::{Entry, KvStore, ReplicationMessage};
pub use web::{build_router, AppState};
