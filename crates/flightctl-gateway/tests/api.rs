//! End-to-end API tests over the full router stack.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use uuid::Uuid;

use flightctl_api::{
    ApiStatus, Device, DeviceList, DeviceSpec, DeviceTemplate, Fleet, FleetSpec, ObjectMeta,
};
use flightctl_gateway::versioning::{
    API_VERSION_HEADER, DEPRECATION_HEADER, SUPPORTED_VERSIONS_HEADER,
};
use flightctl_gateway::{build_router, AppState, GatewayConfig};
use flightctl_store::{Db, Store};

const ORG_ID_HEADER: &str = "flightctl-org-id";

fn test_server() -> TestServer {
    let db = Db::open_in_memory().unwrap();
    let store = Arc::new(Store::new(&db));
    store.initial_migration().unwrap();

    let app = build_router(AppState::new(store), &GatewayConfig::default()).unwrap();
    TestServer::new(app).unwrap()
}

fn device(name: &str, image: &str) -> Device {
    Device {
        metadata: ObjectMeta::named(name),
        spec: Some(DeviceSpec {
            os_image: Some(image.to_string()),
            config: None,
        }),
        status: None,
    }
}

#[tokio::test]
async fn device_crud_round_trip() {
    let server = test_server();

    let response = server
        .post("/api/v1/devices")
        .json(&device("dev-1", "img:1"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Device = response.json();
    assert_eq!(created.metadata.generation, Some(1));
    assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));

    // Duplicate create conflicts.
    server
        .post("/api/v1/devices")
        .json(&device("dev-1", "img:1"))
        .await
        .assert_status(StatusCode::CONFLICT);

    let fetched: Device = server.get("/api/v1/devices/dev-1").await.json();
    assert_eq!(fetched.spec.unwrap().os_image.as_deref(), Some("img:1"));

    // Replace with a new spec advances generation and version.
    let response = server
        .put("/api/v1/devices/dev-1")
        .json(&device("dev-1", "img:2"))
        .await;
    response.assert_status_ok();
    let updated: Device = response.json();
    assert_eq!(updated.metadata.generation, Some(2));
    assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));

    // Replace of an absent name creates it.
    server
        .put("/api/v1/devices/dev-2")
        .json(&device("dev-2", "img:1"))
        .await
        .assert_status(StatusCode::CREATED);

    // Delete is idempotent.
    server
        .delete("/api/v1/devices/dev-1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete("/api/v1/devices/dev-1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get("/api/v1/devices/dev-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stale_resource_version_is_a_conflict() {
    let server = test_server();
    server
        .post("/api/v1/devices")
        .json(&device("dev-1", "img:1"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .put("/api/v1/devices/dev-1")
        .json(&device("dev-1", "img:2"))
        .await
        .assert_status_ok();

    let mut stale = device("dev-1", "img:3");
    stale.metadata.resource_version = Some("1".to_string());
    server
        .put("/api/v1/devices/dev-1")
        .json(&stale)
        .await
        .assert_status(StatusCode::CONFLICT);

    let mut malformed = device("dev-1", "img:3");
    malformed.metadata.resource_version = Some("latest".to_string());
    server
        .put("/api/v1/devices/dev-1")
        .json(&malformed)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owned_fleet_rejects_direct_spec_writes() {
    let server = test_server();

    let mut owned = Fleet {
        metadata: ObjectMeta::named("edge"),
        spec: Some(FleetSpec {
            selector: None,
            template: DeviceTemplate::default(),
        }),
        status: None,
    };
    owned.metadata.owner = Some("ResourceSync/sync-1".to_string());
    server
        .post("/api/v1/fleets")
        .json(&owned)
        .await
        .assert_status(StatusCode::CREATED);

    let mut changed = owned.clone();
    changed.metadata.owner = None;
    changed.spec.as_mut().unwrap().template.spec.os_image = Some("img:2".to_string());
    let response = server.put("/api/v1/fleets/edge").json(&changed).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: ApiStatus = response.json();
    assert_eq!(body.status, "Failure");
}

#[tokio::test]
async fn pagination_over_http_follows_continue_tokens() {
    let server = test_server();
    for i in 0..5 {
        server
            .post("/api/v1/devices")
            .json(&device(&format!("dev-{i}"), "img:1"))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let mut seen = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let mut request = server.get("/api/v1/devices").add_query_param("limit", 2);
        if let Some(token) = &token {
            request = request.add_query_param("continue", token);
        }
        let page: DeviceList = request.await.json();
        seen.extend(
            page.items
                .iter()
                .map(|d| d.metadata.name.clone().unwrap()),
        );
        match page.metadata.continue_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    assert_eq!(seen, vec!["dev-0", "dev-1", "dev-2", "dev-3", "dev-4"]);
}

#[tokio::test]
async fn organizations_partition_resources() {
    let server = test_server();
    let org = Uuid::new_v4().to_string();

    server
        .post("/api/v1/devices")
        .add_header(ORG_ID_HEADER, org.as_str())
        .json(&device("dev-1", "img:1"))
        .await
        .assert_status(StatusCode::CREATED);

    // Visible in its organization, absent from the default one.
    server
        .get("/api/v1/devices/dev-1")
        .add_header(ORG_ID_HEADER, org.as_str())
        .await
        .assert_status_ok();
    server
        .get("/api/v1/devices/dev-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .get("/api/v1/devices/dev-1")
        .add_header(ORG_ID_HEADER, "not-a-uuid")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn version_negotiation_spans_the_full_stack() {
    let server = test_server();

    // Device endpoints serve both versions; v1 is deprecated.
    let response = server
        .get("/api/v1/devices")
        .add_header(API_VERSION_HEADER, "v1")
        .await;
    response.assert_status_ok();
    assert_eq!(response.headers().get(&API_VERSION_HEADER).unwrap(), "v1");
    assert!(response.headers().get(&DEPRECATION_HEADER).is_some());
    assert!(response.headers().get(&SUPPORTED_VERSIONS_HEADER).is_none());

    let response = server
        .get("/api/v1/devices")
        .add_header(API_VERSION_HEADER, "v2")
        .await;
    response.assert_status(StatusCode::NOT_ACCEPTABLE);
    assert_eq!(
        response.headers().get(&SUPPORTED_VERSIONS_HEADER).unwrap(),
        "v1beta1, v1"
    );

    // Fleet endpoints have no metadata: only the fallback is served.
    server
        .get("/api/v1/fleets")
        .await
        .assert_status_ok();
    server
        .get("/api/v1/fleets")
        .add_header(API_VERSION_HEADER, "v1")
        .await
        .assert_status(StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn health_is_served_outside_versioning() {
    let server = test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert!(response.headers().get(&API_VERSION_HEADER).is_none());
}

#[tokio::test]
async fn default_organization_is_listed() {
    let server = test_server();
    let response = server.get("/api/v1/organizations").await;
    response.assert_status_ok();
    let list: flightctl_api::OrganizationList = response.json();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].name, "default");
}
