//! E2E tests: updating and deleting containers.

use actix_web::test;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::test_helpers::*;

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

/// Updates bump updatedAt and keep createdAt.
#[actix_rt::test]
async fn test_update_changes_updated_at() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let created = create_container(
        &app,
        json!({ "Identifier": unique_identifier("update"), "DisplayName": "before" }),
    )
    .await;
    let id = created["Id"].as_str().unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/test-result-containers/{}", id))
        .set_json(json!({
            "DisplayName": null,
            "Score": { "Security": { "Reached": 1, "Total": 4 } }
        }));
    let (status, updated) = send_json(&app, req).await;

    assert_eq!(status, 200, "Update should succeed: {:?}", updated);
    assert_eq!(updated["DisplayName"], Value::Null);
    assert_eq!(updated["Score"]["Security"]["Percentage"], 25.0);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert!(timestamp(&updated["updatedAt"]) > timestamp(&created["updatedAt"]));
    assert!(timestamp(&updated["createdAt"]) <= timestamp(&updated["updatedAt"]));
}

/// Replacing TestClasses drops the old children.
#[actix_rt::test]
async fn test_update_replaces_test_classes() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let created = create_container(
        &app,
        json!({
            "Identifier": unique_identifier("classes"),
            "TestClasses": [{ "Identifier": "old-a" }, { "Identifier": "old-b" }]
        }),
    )
    .await;
    let id = created["Id"].as_str().unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/test-result-containers/{}", id))
        .set_json(json!({ "TestClasses": [{ "Identifier": "new" }] }));
    let (status, updated) = send_json(&app, req).await;

    assert_eq!(status, 200, "Update should succeed: {:?}", updated);
    assert_eq!(updated["TestClasses"].as_array().unwrap().len(), 1);
    assert_eq!(updated["TestClasses"][0]["Identifier"], "new");
}

/// An empty Identifier is rejected.
#[actix_rt::test]
async fn test_update_rejects_empty_identifier() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let created = create_container(&app, json!({ "Identifier": unique_identifier("empty") })).await;
    let id = created["Id"].as_str().unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/test-result-containers/{}", id))
        .set_json(json!({ "Identifier": "" }));
    let (status, _) = send_json(&app, req).await;

    assert_eq!(status, 400);
}

/// Deleted containers are gone, including from lookups.
#[actix_rt::test]
async fn test_delete_container() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;
    let identifier = unique_identifier("delete");

    let created = create_container(
        &app,
        json!({ "Identifier": identifier, "TestClasses": [{ "Identifier": "child" }] }),
    )
    .await;
    let id = created["Id"].as_str().unwrap();

    let req = test::TestRequest::delete().uri(&format!("/api/v1/test-result-containers/{}", id));
    let (status, _) = send_json(&app, req).await;
    assert_eq!(status, 204);

    let (status, _) = get_container(&app, id).await;
    assert_eq!(status, 404);

    let (_, body) = list_containers(&app, &format!("identifier={}", identifier)).await;
    assert_eq!(body["total"], 0);

    let req = test::TestRequest::delete().uri(&format!("/api/v1/test-result-containers/{}", id));
    let (status, _) = send_json(&app, req).await;
    assert_eq!(status, 404);
}

/// Re-aggregation overwrites counters, test results, index map and score.
#[actix_rt::test]
async fn test_reaggregate_container() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let created = create_container(
        &app,
        json!({
            "Identifier": unique_identifier("reaggregate"),
            "DisplayName": "kept",
            "FailedTests": 7,
            "Score": { "Security": { "Reached": 1, "Total": 1 } }
        }),
    )
    .await;
    let id = created["Id"].as_str().unwrap();
    let passed = uuid::Uuid::now_v7();
    let failed = uuid::Uuid::now_v7();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/test-result-containers/{}/aggregate", id))
        .set_json(json!([
            { "Id": passed, "ClassName": "Handshake", "MethodName": "resumption",
              "Status": "SUCCEEDED", "Interoperability": "MEDIUM" },
            { "Id": failed, "ClassName": "Handshake", "MethodName": "renegotiation",
              "Status": "FAILED", "Interoperability": "LOW" }
        ]));
    let (status, body) = send_json(&app, req).await;

    assert_eq!(status, 200, "Re-aggregation should succeed: {:?}", body);
    assert_eq!(body["DisplayName"], "kept");
    assert_eq!(body["FailedTests"], 1);
    assert_eq!(body["SucceededTests"], 1);
    assert_eq!(body["DisabledTests"], 0);
    assert_eq!(
        body["TestResults"],
        json!([passed.to_string(), failed.to_string()])
    );
    assert_eq!(body["TestResultClassMethodIndexMap"]["Handshake.resumption"], 0);
    assert_eq!(body["Score"]["Security"]["Total"], 0);
    assert_eq!(body["Score"]["Interoperability"]["Reached"], 60);
    assert_eq!(body["Score"]["Interoperability"]["Total"], 80);
    assert_eq!(body["Score"]["Interoperability"]["Percentage"], 75.0);
}

/// Re-aggregating an unknown container is a 404.
#[actix_rt::test]
async fn test_reaggregate_unknown_container() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let req = test::TestRequest::put()
        .uri(&format!(
            "/api/v1/test-result-containers/{}/aggregate",
            uuid::Uuid::now_v7()
        ))
        .set_json(json!([]));
    let (status, _) = send_json(&app, req).await;

    assert_eq!(status, 404);
}
