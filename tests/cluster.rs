//! End-to-end tests that drive a small cluster of real in-process HTTP
//! nodes over the network, the way an external client would.

use semisync_kv::config::Role;
use semisync_kv::coordinator::WriteCoordinator;
use semisync_kv::replication::ReplicationDispatcher;
use semisync_kv::store::KvStore;
use semisync_kv::web::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;

/// Binds a follower node to an ephemeral port and serves it in the
/// background for the lifetime of the test process.
async fn spawn_follower() -> String {
    let state = AppState::follower(Arc::new(KvStore::new()));
    spawn_node(state).await
}

/// Binds a leader node wired to the given follower URLs.
async fn spawn_leader(follower_urls: Vec<String>, quorum: usize) -> String {
    let store = Arc::new(KvStore::new());
    let dispatcher = ReplicationDispatcher::new(follower_urls, 0, 5);
    let coordinator = Arc::new(WriteCoordinator::new(store.clone(), dispatcher, quorum));
    let state = AppState::leader(store, coordinator);
    spawn_node(state).await
}

async fn spawn_node(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn write(client: &reqwest::Client, leader: &str, key: &str, value: &str) -> Value {
    client
        .post(format!("{leader}/write"))
        .json(&json!({ "key": key, "value": value }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn read(client: &reqwest::Client, node: &str, key: &str) -> Value {
    client
        .get(format!("{node}/read/{key}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn single_write_reaches_the_whole_cluster() {
    let f1 = spawn_follower().await;
    let f2 = spawn_follower().await;
    let leader = spawn_leader(vec![f1.clone(), f2.clone()], 2).await;
    let client = reqwest::Client::new();

    let body = write(&client, &leader, "alpha", "1").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["quorum_reached"], 2);

    // Give the already-acknowledged followers' local apply a moment; the
    // HTTP response only guarantees the replicate call was acknowledged,
    // which happens after the follower has already applied it.
    for node in [&leader, &f1, &f2] {
        let body = read(&client, node, "alpha").await;
        assert_eq!(body["found"], true);
        assert_eq!(body["value"], "1");
    }
}

#[tokio::test]
async fn quorum_is_met_despite_an_unreachable_follower() {
    let f1 = spawn_follower().await;
    let f2 = spawn_follower().await;
    let unreachable = "http://127.0.0.1:1".to_string();
    let leader = spawn_leader(vec![f1.clone(), f2.clone(), unreachable], 2).await;
    let client = reqwest::Client::new();

    let body = write(&client, &leader, "beta", "2").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["quorum_reached"], 2);
}

#[tokio::test]
async fn quorum_miss_is_reported_but_local_write_still_applies() {
    let unreachable_a = "http://127.0.0.1:1".to_string();
    let unreachable_b = "http://127.0.0.1:2".to_string();
    let leader = spawn_leader(vec![unreachable_a, unreachable_b], 1).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{leader}/write"))
        .json(&json!({ "key": "gamma", "value": "3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["acks"], 0);

    let body = read(&client, &leader, "gamma").await;
    assert_eq!(body["found"], true);
    assert_eq!(body["value"], "3");
}

#[tokio::test]
async fn concurrent_writes_to_the_same_key_converge_on_the_latest_version() {
    let f1 = spawn_follower().await;
    let leader = spawn_leader(vec![f1.clone()], 1).await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let leader = leader.clone();
        handles.push(tokio::spawn(async move {
            write(&client, &leader, "hot", &i.to_string()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let leader_value = read(&client, &leader, "hot").await;
    let follower_value = read(&client, &f1, "hot").await;
    assert_eq!(leader_value["value"], follower_value["value"]);
}

#[tokio::test]
async fn follower_rejects_client_writes() {
    let follower = spawn_follower().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{follower}/write"))
        .json(&json!({ "key": "k", "value": "v" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn delete_propagates_and_read_reports_absent() {
    let f1 = spawn_follower().await;
    let leader = spawn_leader(vec![f1.clone()], 1).await;
    let client = reqwest::Client::new();

    write(&client, &leader, "gone", "here").await;
    let response = client
        .delete(format!("{leader}/kv/gone"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    for node in [&leader, &f1] {
        let body = read(&client, node, "gone").await;
        assert_eq!(body["found"], false);
    }
}

#[tokio::test]
async fn stale_replicate_message_is_dropped_by_follower() {
    let follower = spawn_follower().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{follower}/replicate"))
        .json(&json!({ "key": "k", "value": "fresh", "version": 5, "delete": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{follower}/replicate"))
        .json(&json!({ "key": "k", "value": "stale", "version": 2, "delete": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = read(&client, &follower, "k").await;
    assert_eq!(body["value"], "fresh");
}

#[tokio::test]
async fn status_reports_role_and_key_count() {
    let f1 = spawn_follower().await;
    let leader = spawn_leader(vec![f1.clone()], 1).await;
    let client = reqwest::Client::new();

    write(&client, &leader, "k1", "v1").await;

    let body: Value = client
        .get(format!("{leader}/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["role"], Role::Leader.as_str());
    assert_eq!(body["key_count"], 1);
    assert_eq!(body["quorum"], 1);
}
