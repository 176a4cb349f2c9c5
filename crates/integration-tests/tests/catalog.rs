//! Client and project management.

use axum::http::StatusCode;
use serde_json::json;

use tally_integration_tests::{ADMIN, TestApp};

#[tokio::test]
async fn test_members_read_but_only_admin_writes() {
    let app = TestApp::with_company().await;
    app.add_member("auth|mgr", "mgr@acme.test", "manager").await;
    let project = app.add_project("Website").await;

    let listed = app.get(Some("auth|mgr"), "/projects").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body[0]["id"], project);
    assert_eq!(listed.body[0]["status"], "active");

    let denied = app
        .post(Some("auth|mgr"), "/clients", json!({ "name": "Side gig" }))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_project_dates_must_be_ordered() {
    let app = TestApp::with_company().await;
    let client = app.post(Some(ADMIN), "/clients", json!({ "name": "Initech" })).await;

    let response = app
        .post(
            Some(ADMIN),
            "/projects",
            json!({
                "client_id": client.body["id"],
                "name": "TPS",
                "start_date": "2024-06-01",
                "end_date": "2024-05-01"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_client_must_be_in_company() {
    let app = TestApp::with_company().await;
    let response = app
        .post(Some(ADMIN), "/projects", json!({ "client_id": 999, "name": "Ghost" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_replaces_project() {
    let app = TestApp::with_company().await;
    let project = app.add_project("Website").await;
    let current = app.get(Some(ADMIN), &format!("/projects/{project}")).await;

    let updated = app
        .put(
            Some(ADMIN),
            &format!("/projects/{project}"),
            json!({
                "client_id": current.body["client_id"],
                "name": "Website v2",
                "status": "completed"
            }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Website v2");
    assert_eq!(updated.body["status"], "completed");
}

#[tokio::test]
async fn test_referenced_rows_cannot_be_deleted() {
    let app = TestApp::with_company().await;
    app.add_member("auth|emp", "emp@acme.test", "employee").await;
    let project = app.add_project("Website").await;
    let client_id = app.get(Some(ADMIN), &format!("/projects/{project}")).await.body["client_id"]
        .as_i64()
        .unwrap();

    let client = app.delete(Some(ADMIN), &format!("/clients/{client_id}")).await;
    assert_eq!(client.status, StatusCode::CONFLICT);

    app.post(
        Some("auth|emp"),
        "/time-entries/batch",
        json!({ "rows": [{ "project_id": project.to_string(), "cells": [{ "date": "2024-05-13", "duration": "1:00" }] }] }),
    )
    .await;
    let busy = app.delete(Some(ADMIN), &format!("/projects/{project}")).await;
    assert_eq!(busy.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_unused_project_and_client() {
    let app = TestApp::with_company().await;
    let project = app.add_project("Website").await;
    let client_id = app.get(Some(ADMIN), &format!("/projects/{project}")).await.body["client_id"]
        .as_i64()
        .unwrap();

    assert_eq!(
        app.delete(Some(ADMIN), &format!("/projects/{project}")).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.delete(Some(ADMIN), &format!("/clients/{client_id}")).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.get(Some(ADMIN), &format!("/clients/{client_id}")).await.status,
        StatusCode::NOT_FOUND
    );
}
