#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Integration tests for `RestClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nettopo_api::{RestClient, TransportConfig};
use nettopo_core::model::{
    Connection, EntityId, Group, GroupGeometry, Node, NodePatch, NodeStatus, NodeType,
};
use nettopo_core::{CoreError, Persistence};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RestClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

// ── Fetch ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_topology() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/topology"))
        .respond_with(ok(json!({
            "nodes": [
                { "id": "n1", "name": "Uplink", "type": "INTERNET", "status": "ONLINE" },
                { "id": "n2", "name": "Core", "type": "ROUTER", "groupId": "g1" }
            ],
            "connections": [
                { "id": "c1", "sourceNodeId": "n1", "targetNodeId": "n2", "isActiveSource": true }
            ],
            "groups": [{ "id": "g1", "name": "Rack" }],
            "groupConnections": []
        })))
        .mount(&server)
        .await;

    let snapshot = client.fetch_topology().await.unwrap();

    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(snapshot.nodes[0].node_type, NodeType::Internet);
    assert_eq!(snapshot.nodes[0].status, NodeStatus::Online);
    assert_eq!(snapshot.nodes[1].group_id, Some(EntityId::from("g1")));
    assert!(snapshot.connections[0].is_active_source);
    assert_eq!(snapshot.groups[0].width, 300.0);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        token: Some("s3cret".to_string().into()),
        ..TransportConfig::default()
    };
    let client = RestClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/topology"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client.fetch_topology().await.unwrap();
    assert!(snapshot.is_empty());
}

// ── Nodes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_node_returns_server_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/nodes"))
        .respond_with(ok(json!({ "id": "srv-1", "name": "Edge", "type": "SWITCH" })))
        .mount(&server)
        .await;

    let local = Node::new("tmp-1", "Edge", NodeType::Switch);
    let stored = client.create_node(&local).await.unwrap();

    assert_eq!(stored.id, EntityId::from("srv-1"));
    assert_eq!(stored.name, "Edge");
}

#[tokio::test]
async fn test_create_without_echo_keeps_local_entity() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/groups"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let group = Group::new("g1", "Office");
    let stored = client.create_group(&group).await.unwrap();
    assert_eq!(stored, group);
}

#[tokio::test]
async fn test_update_node_sends_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/nodes/n1"))
        .and(body_json(json!({ "name": "Renamed" })))
        .respond_with(ok(json!({ "id": "n1", "name": "Renamed", "type": "SERVER" })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = NodePatch {
        name: Some("Renamed".into()),
        ..NodePatch::default()
    };
    let node = client
        .update_node(&EntityId::from("n1"), &patch)
        .await
        .unwrap();
    assert_eq!(node.name, "Renamed");
}

#[tokio::test]
async fn test_update_node_position_body() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/nodes/n1/position"))
        .and(body_json(json!({ "positionX": 120.0, "positionY": 40.0 })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_node_position(&EntityId::from("n1"), 120.0, 40.0)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_node_with_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/nodes/n1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_node(&EntityId::from("n1")).await.unwrap();
}

// ── Connections and groups ──────────────────────────────────────────

#[tokio::test]
async fn test_set_active_source_route() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/connections/c7/active-source"))
        .respond_with(ok(json!({ "id": "c7" })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_active_source(&EntityId::from("c7"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_connection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/connections"))
        .respond_with(ok(json!({
            "id": "c1", "sourceNodeId": "a", "targetNodeId": "b", "label": "10G"
        })))
        .mount(&server)
        .await;

    let stored = client
        .create_connection(&Connection::new("c1", "a", "b"))
        .await
        .unwrap();
    assert_eq!(stored.label.as_deref(), Some("10G"));
}

#[tokio::test]
async fn test_update_group_position_omits_absent_size() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/groups/g1/position"))
        .and(body_json(json!({ "x": 100.0, "y": 250.0 })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let geometry = GroupGeometry {
        x: 100.0,
        y: 250.0,
        width: None,
        height: None,
    };
    client
        .update_group_position(&EntityId::from("g1"), &geometry)
        .await
        .unwrap();
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_maps_to_persistence() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/groups/g1"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "success": false, "error": "Group not found" })),
        )
        .mount(&server)
        .await;

    let result = client.delete_group(&EntityId::from("g1")).await;

    match result {
        Err(CoreError::Persistence { message }) => {
            assert!(message.contains("404"), "message: {message}");
            assert!(message.contains("Group not found"), "message: {message}");
        }
        other => panic!("expected Persistence error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/group-connections"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "duplicate link" })),
        )
        .mount(&server)
        .await;

    let link = nettopo_core::model::GroupConnection::new("gc1", "g1", "g2");
    let result = client.create_group_connection(&link).await;

    assert!(
        matches!(&result, Err(CoreError::Persistence { message }) if message.contains("duplicate link")),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/topology"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.fetch_topology().await;
    assert!(
        matches!(&result, Err(CoreError::Persistence { message }) if message.contains("Deserialization")),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_is_persistence_error() {
    let client = RestClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
    );

    let result = client.fetch_topology().await;
    assert!(matches!(result, Err(CoreError::Persistence { .. })));
}
