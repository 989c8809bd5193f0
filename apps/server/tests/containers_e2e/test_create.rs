//! E2E tests: creating containers.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

/// Nested scores are stored with derived percentages and read back unchanged.
#[actix_rt::test]
async fn test_create_and_read_back() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;
    let identifier = unique_identifier("run-42");

    let created = create_container(
        &app,
        json!({
            "Identifier": identifier,
            "ShortIdentifier": "42",
            "DisplayName": "Nightly run",
            "ElapsedTime": 12.5,
            "FailedTests": 1,
            "SucceededTests": 3,
            "DisabledTests": 0,
            "TestResultClassMethodIndexMap": { "Handshake.resumption": 0 },
            "Score": {
                "Security": { "Reached": 5, "Total": 10, "Percentage": 0 },
                "Interoperability": { "Reached": 0, "Total": 0 }
            },
            "TestClasses": [
                { "Identifier": "Handshake", "SucceededTests": 2 },
                { "Identifier": "Alerts", "FailedTests": 1,
                  "TestClasses": [{ "Identifier": "Alerts.fatal" }] }
            ]
        }),
    )
    .await;

    assert_eq!(created["Identifier"], identifier);
    assert_eq!(created["Score"]["Security"]["Percentage"], 50.0);
    assert_eq!(created["Score"]["Interoperability"]["Percentage"], 0.0);
    assert_eq!(created["TestClasses"].as_array().unwrap().len(), 2);
    assert_eq!(created["TestClasses"][0]["Identifier"], "Handshake");
    assert_eq!(created["TestClasses"][1]["TestClasses"][0]["Identifier"], "Alerts.fatal");
    assert!(created["createdAt"].is_string());
    assert!(created["updatedAt"].is_string());

    let id = created["Id"].as_str().unwrap();
    let (status, fetched) = get_container(&app, id).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);
}

/// The misspelled display name key is still accepted.
#[actix_rt::test]
async fn test_create_accepts_legacy_display_name_key() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let created = create_container(
        &app,
        json!({ "Identifier": unique_identifier("legacy"), "DispalyName": "Legacy" }),
    )
    .await;

    assert_eq!(created["DisplayName"], "Legacy");
    assert_eq!(created["FailedTests"], 0);
    assert_eq!(created["TestResults"], json!([]));
}

/// A container without Identifier is rejected.
#[actix_rt::test]
async fn test_create_without_identifier_fails() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/test-result-containers")
        .set_json(json!({ "DisplayName": "No identifier" }));
    let (status, body) = send_json(&app, req).await;

    assert_eq!(status, 400, "Missing Identifier should fail: {:?}", body);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

/// A nested class without Identifier rejects the whole container.
#[actix_rt::test]
async fn test_create_with_invalid_child_stores_nothing() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;
    let identifier = unique_identifier("bad-child");

    let req = test::TestRequest::post()
        .uri("/api/v1/test-result-containers")
        .set_json(json!({
            "Identifier": identifier,
            "TestClasses": [{ "DisplayName": "orphan" }]
        }));
    let (status, _) = send_json(&app, req).await;
    assert_eq!(status, 400);

    let (status, body) = list_containers(&app, &format!("identifier={}", identifier)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 0);
}

/// Aggregation derives counters, index map and scores from summaries.
#[actix_rt::test]
async fn test_create_aggregated_container() {
    let Some(pool) = create_test_pool().await else {
        return;
    };
    let app = create_test_app(&pool).await;
    let first = uuid::Uuid::now_v7();
    let second = uuid::Uuid::now_v7();
    let third = uuid::Uuid::now_v7();

    let req = test::TestRequest::post()
        .uri("/api/v1/test-result-containers/aggregate")
        .set_json(json!({
            "Container": { "Identifier": unique_identifier("aggregated") },
            "Summaries": [
                { "Id": first, "ClassName": "Handshake", "MethodName": "resumption",
                  "Status": "SUCCEEDED", "Security": "HIGH" },
                { "Id": second, "ClassName": "Handshake", "MethodName": "renegotiation",
                  "Status": "FAILED", "Security": "HIGH", "Interoperability": "LOW" },
                { "Id": third, "ClassName": "Alerts", "MethodName": "fatal",
                  "Status": "DISABLED", "Security": "MEDIUM" }
            ]
        }));
    let (status, body) = send_json(&app, req).await;

    assert_eq!(status, 201, "Aggregate create should succeed: {:?}", body);
    assert_eq!(body["SucceededTests"], 1);
    assert_eq!(body["FailedTests"], 1);
    assert_eq!(body["DisabledTests"], 1);
    assert_eq!(
        body["TestResults"],
        json!([first.to_string(), second.to_string(), third.to_string()])
    );
    assert_eq!(body["TestResultClassMethodIndexMap"]["Handshake.renegotiation"], 1);
    assert_eq!(body["Score"]["Security"]["Reached"], 100);
    assert_eq!(body["Score"]["Security"]["Total"], 200);
    assert_eq!(body["Score"]["Security"]["Percentage"], 50.0);
    assert_eq!(body["Score"]["Interoperability"]["Percentage"], 0.0);
}
