use clap::Parser;
use semisync_kv::config::{NodeSettings, Role};
use semisync_kv::coordinator::WriteCoordinator;
use semisync_kv::replication::ReplicationDispatcher;
use semisync_kv::store::KvStore;
use semisync_kv::web::{build_router, AppState};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "semisync-kv")]
#[command(about = "Distributed in-memory key-value store with quorum replication", long_about = None)]
struct Cli;

#[tokio::main]
async fn main() {
    let _ = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .init();

    let settings = match NodeSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "configuration error");
            std::process::exit(1);
        }
    };

    let store = Arc::new(KvStore::new());
    let state = match settings.role {
        Role::Leader => {
            let leader = settings
                .leader
                .clone()
                .expect("leader role always carries a LeaderConfig");
            info!(
                followers = leader.follower_urls.len(),
                quorum = leader.quorum,
                "starting as leader"
            );
            let dispatcher = ReplicationDispatcher::new(
                leader.follower_urls.clone(),
                leader.min_delay_ms,
                leader.max_delay_ms,
            );
            let coordinator = Arc::new(WriteCoordinator::new(
                Arc::clone(&store),
                dispatcher,
                leader.quorum,
            ));
            AppState::leader(store, coordinator)
        }
        Role::Follower => {
            info!(leader_url = ?settings.leader_url, "starting as follower");
            AppState::follower(store)
        }
    };

    let router = build_router(state);
    let listener = match tokio::net::TcpListener::bind(settings.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %settings.bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %settings.bind_addr, "listening");
    if let Err(err) = axum::serve(listener, router).await {
        error!(error = %err, "server error");
        std::process::exit(1);
    }
}
