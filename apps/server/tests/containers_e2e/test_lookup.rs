//! E2E tests: lookups by indexed fields.

use serde_json::json;
use uuid::Uuid;

use super::test_helpers::*;

/// Identifier lookups return only matching top-level containers.
#[actix_rt::test]
async fn test_lookup_by_identifier() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;
    let identifier = unique_identifier("lookup");
    let other = unique_identifier("lookup-other");

    create_container(&app, json!({ "Identifier": identifier })).await;
    create_container(&app, json!({ "Identifier": identifier, "ShortIdentifier": "b" })).await;
    create_container(
        &app,
        json!({ "Identifier": other, "TestClasses": [{ "Identifier": identifier }] }),
    )
    .await;

    let (status, body) = list_containers(&app, &format!("identifier={}", identifier)).await;

    assert_eq!(status, 200);
    assert_eq!(body["total"], 2);
    for container in body["containers"].as_array().unwrap() {
        assert_eq!(container["Identifier"], identifier);
    }
}

/// Capture and key log lookups find the linked container.
#[actix_rt::test]
async fn test_lookup_by_artifact_ids() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;
    let pcap = Uuid::now_v7();
    let keylog = Uuid::now_v7();

    let created = create_container(
        &app,
        json!({
            "Identifier": unique_identifier("artifacts"),
            "PcapStorageId": pcap,
            "KeylogfileStorageId": keylog
        }),
    )
    .await;
    create_container(&app, json!({ "Identifier": unique_identifier("no-artifacts") })).await;

    let (status, body) = list_containers(&app, &format!("pcap_storage_id={}", pcap)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["containers"][0]["Id"], created["Id"]);

    let (status, body) =
        list_containers(&app, &format!("keylogfile_storage_id={}", keylog)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["containers"][0]["PcapStorageId"], pcap.to_string());

    let (status, body) =
        list_containers(&app, &format!("pcap_storage_id={}", Uuid::now_v7())).await;
    assert_eq!(status, 200);
    assert_eq!(body["containers"], json!([]));
}

/// Combining lookup filters is rejected.
#[actix_rt::test]
async fn test_lookup_rejects_multiple_filters() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let (status, body) = list_containers(
        &app,
        &format!("identifier=x&pcap_storage_id={}", Uuid::now_v7()),
    )
    .await;

    assert_eq!(status, 400, "Combined filters should fail: {:?}", body);
}

/// Plain listing is paginated.
#[actix_rt::test]
async fn test_list_pagination() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    create_container(&app, json!({ "Identifier": unique_identifier("page") })).await;
    create_container(&app, json!({ "Identifier": unique_identifier("page") })).await;

    let (status, body) = list_containers(&app, "limit=1").await;

    assert_eq!(status, 200);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["containers"].as_array().unwrap().len(), 1);
    assert!(body["total"].as_u64().unwrap() >= 2);
}
