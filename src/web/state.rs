use crate::config::Role;
use crate::coordinator::WriteCoordinator;
use crate::store::KvStore;
use std::sync::Arc;

/// Shared application state handed to every axum handler. Both leader
/// and follower nodes build one of these; `coordinator` is only
/// populated on the leader, since only the leader replicates writes.
#[derive(Clone)]
pub struct AppState {
    pub role: Role,
    pub store: Arc<KvStore>,
    pub coordinator: Option<Arc<WriteCoordinator>>,
}

impl AppState {
    pub fn leader(store: Arc<KvStore>, coordinator: Arc<WriteCoordinator>) -> Self {
        Self {
            role: Role::Leader,
            store,
            coordinator: Some(coordinator),
        }
    }

    pub fn follower(store: Arc<KvStore>) -> Self {
        Self {
            role: Role::Follower,
            store,
            coordinator: None,
        }
    }

    pub fn is_leader(&self) -> bool {
        self.role == Role::Leader
    }
}
