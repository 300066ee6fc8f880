//! Integration tests for document import and project export.

mod common;

use std::path::Path;

use axum::http::StatusCode;
use common::{body_json, create_project, post, post_json};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analyze_text_without_analyzer_uses_default_outline() {
    let test = common::build_test_app().await;
    let response = post_json(
        test.app(),
        "/api/v1/imports/analyze",
        json!({"text": "A courier crosses the flooded city at night."}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["used_fallback"], true);
    let outline: Value = serde_json::from_str(json["data"]["outline_json"].as_str().unwrap()).unwrap();
    assert!(outline["shots"].is_array());
}

#[tokio::test]
async fn test_analyze_file_from_disk() {
    let test = common::build_test_app().await;
    let path = test.data.path().join("story.md");
    std::fs::write(&path, "# The Ferry\n\nTwo friends wait for the last ferry.").unwrap();

    let response = post_json(
        test.app(),
        "/api/v1/imports/analyze",
        json!({"path": path.to_string_lossy()}),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["kind"], "markdown");
    assert!(json["data"]["raw_content"].as_str().unwrap().contains("last ferry"));
}

#[tokio::test]
async fn test_analyze_missing_file_reports_failure() {
    let test = common::build_test_app().await;
    let response = post_json(
        test.app(),
        "/api/v1/imports/analyze",
        json!({"path": "/nonexistent/story.txt"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(json["data"]["outline_json"], "");
}

#[tokio::test]
async fn test_analyze_requires_some_input() {
    let test = common::build_test_app().await;
    let response = post_json(test.app(), "/api/v1/imports/analyze", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        test.app(),
        "/api/v1/imports/analyze",
        json!({"paths": ["/nonexistent/a.txt", "/nonexistent/b.md"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_apply_outline_opens_project() {
    let test = common::build_test_app().await;
    let outline = json!({
        "project_name": "Night Ferry",
        "characters": [{"name": "Ada", "description": "ferry pilot"}],
        "scenes": [{"name": "Pier", "description": "fog over black water"}],
        "shots": [
            {"template": "wide", "description": "the ferry arrives", "scene": "Pier"},
            {"template": "closeup", "description": "Ada squints", "characters": ["Ada"], "scene": "Pier"}
        ]
    });

    let response = post_json(
        test.app(),
        "/api/v1/imports/apply",
        json!({"outline_json": outline.to_string()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Night Ferry");
    assert_eq!(json["data"]["aspect_ratio"], "16:9");
    assert_eq!(json["data"]["stats"]["character_count"], 1);
    assert_eq!(json["data"]["stats"]["shot_count"], 2);
}

#[tokio::test]
async fn test_apply_invalid_outline_is_rejected() {
    let test = common::build_test_app().await;
    let response = post_json(
        test.app(),
        "/api/v1/imports/apply",
        json!({"outline_json": "[1, 2, 3]"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_export_json_and_script() {
    let test = common::build_test_app().await;
    let id = create_project(test.app(), "Exported").await;
    post_json(
        test.app(),
        &format!("/api/v1/projects/{id}/shots"),
        json!({"description": "the door creaks open"}),
    )
    .await;

    let response = post(test.app(), &format!("/api/v1/projects/{id}/export/json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["format"], "json");
    let path = json["data"]["path"].as_str().unwrap();
    assert!(path.starts_with(test.state.dirs.exports.to_str().unwrap()));
    let document: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(document["storyboard"].as_array().unwrap().len(), 1);

    let response = post(test.app(), &format!("/api/v1/projects/{id}/export/TXT")).await;
    let json = body_json(response).await;
    let script = std::fs::read_to_string(json["data"]["path"].as_str().unwrap()).unwrap();
    assert!(script.contains("the door creaks open"));
}

#[tokio::test]
async fn test_export_archive_after_generation() {
    let test = common::build_test_app().await;
    let id = create_project(test.app(), "Archived").await;
    post_json(test.app(), &format!("/api/v1/projects/{id}/shots"), json!({})).await;
    post(test.app(), &format!("/api/v1/projects/{id}/generate")).await;

    let response = post(test.app(), &format!("/api/v1/projects/{id}/export/zip")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["entries"], 1);
    assert!(Path::new(json["data"]["path"].as_str().unwrap()).is_file());
}

#[tokio::test]
async fn test_export_unknown_format_is_rejected() {
    let test = common::build_test_app().await;
    let id = create_project(test.app(), "Nope").await;
    let response = post(test.app(), &format!("/api/v1/projects/{id}/export/pdf")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
