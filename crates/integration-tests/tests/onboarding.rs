//! Company bootstrap, identity and member management.

use axum::http::StatusCode;
use serde_json::json;

use tally_integration_tests::{ADMIN, TestApp};

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = TestApp::new();
    let live = app.get(None, "/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get(None, "/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = TestApp::with_company().await;
    for uri in ["/me", "/members", "/time-entries", "/pay-periods/current"] {
        let response = app.get(None, uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.error_code(), "unauthorized");
    }
}

#[tokio::test]
async fn test_blank_identity_is_unauthorized() {
    let app = TestApp::with_company().await;
    let response = app.get(Some("   "), "/me").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unaffiliated_caller_has_no_role() {
    let app = TestApp::with_company().await;

    let me = app.get(Some("auth|stranger"), "/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["subject"], "auth|stranger");
    assert!(me.body["role"].is_null());
    assert!(me.body["member"].is_null());

    let members = app.get(Some("auth|stranger"), "/members").await;
    assert_eq!(members.status, StatusCode::FORBIDDEN);
    let entries = app.get(Some("auth|stranger"), "/time-entries").await;
    assert_eq!(entries.status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Company bootstrap
// =============================================================================

#[tokio::test]
async fn test_founder_becomes_admin() {
    let app = TestApp::with_company().await;

    let me = app.get(Some(ADMIN), "/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["role"], "admin");
    assert_eq!(me.body["company"]["name"], "Acme");
    assert_eq!(me.body["member"]["email"], "ada@acme.test");
}

#[tokio::test]
async fn test_member_cannot_found_second_company() {
    let app = TestApp::with_company().await;
    let response = app
        .post(
            Some(ADMIN),
            "/companies",
            json!({
                "company": { "name": "Second" },
                "admin": { "email": "other@acme.test", "first_name": "Ada" }
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_company_name_is_required() {
    let app = TestApp::new();
    let response = app
        .post(
            Some("auth|founder"),
            "/companies",
            json!({
                "company": { "name": "  " },
                "admin": { "email": "f@new.test", "first_name": "Fay" }
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_admin_updates_company() {
    let app = TestApp::with_company().await;
    app.add_member("auth|mgr", "mgr@acme.test", "manager").await;

    let denied = app
        .patch(Some("auth|mgr"), "/company", json!({ "name": "Renamed" }))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let updated = app
        .patch(Some(ADMIN), "/company", json!({ "contact_phone": "555-0100" }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Acme");
    assert_eq!(updated.body["contact_phone"], "555-0100");
}

// =============================================================================
// Members
// =============================================================================

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let app = TestApp::with_company().await;
    let response = app
        .post(
            Some(ADMIN),
            "/members",
            json!({ "subject": "auth|x", "email": "x@acme.test", "first_name": "X", "role": "owner" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "invalid_role");
}

#[tokio::test]
async fn test_duplicate_member_email_conflicts() {
    let app = TestApp::with_company().await;
    app.add_member("auth|emp", "emp@acme.test", "employee").await;

    let response = app
        .post(
            Some(ADMIN),
            "/members",
            json!({ "subject": "auth|emp2", "email": "emp@acme.test", "first_name": "E", "role": "employee" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_manager_cannot_promote_to_admin() {
    let app = TestApp::with_company().await;
    app.add_member("auth|mgr", "mgr@acme.test", "manager").await;
    let emp = app.add_member("auth|emp", "emp@acme.test", "employee").await;

    let response = app
        .patch(Some("auth|mgr"), &format!("/members/{emp}"), json!({ "role": "admin" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let promoted = app
        .patch(Some("auth|mgr"), &format!("/members/{emp}"), json!({ "role": "manager" }))
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["role"], "manager");
}

#[tokio::test]
async fn test_manager_cannot_edit_admin() {
    let app = TestApp::with_company().await;
    app.add_member("auth|mgr", "mgr@acme.test", "manager").await;
    let me = app.get(Some(ADMIN), "/me").await;
    let admin_id = me.body["member"]["id"].as_i64().unwrap();

    let response = app
        .patch(Some("auth|mgr"), &format!("/members/{admin_id}"), json!({ "first_name": "Eve" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_nobody_changes_own_role() {
    let app = TestApp::with_company().await;
    let me = app.get(Some(ADMIN), "/me").await;
    let admin_id = me.body["member"]["id"].as_i64().unwrap();

    let response = app
        .patch(Some(ADMIN), &format!("/members/{admin_id}"), json!({ "role": "employee" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_employee_sees_only_self() {
    let app = TestApp::with_company().await;
    let emp = app.add_member("auth|emp", "emp@acme.test", "employee").await;
    let other = app.add_member("auth|emp2", "emp2@acme.test", "employee").await;

    assert_eq!(
        app.get(Some("auth|emp"), &format!("/members/{emp}")).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.get(Some("auth|emp"), &format!("/members/{other}")).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.get(Some("auth|emp"), "/members").await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manager_assignment_must_be_a_manager() {
    let app = TestApp::with_company().await;
    let emp = app.add_member("auth|emp", "emp@acme.test", "employee").await;
    let emp2 = app.add_member("auth|emp2", "emp2@acme.test", "employee").await;
    let mgr = app.add_member("auth|mgr", "mgr@acme.test", "manager").await;

    let bad = app
        .patch(Some(ADMIN), &format!("/members/{emp}"), json!({ "manager_id": emp2 }))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let ok = app
        .patch(Some(ADMIN), &format!("/members/{emp}"), json!({ "manager_id": mgr }))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["manager_id"], mgr);
}

#[tokio::test]
async fn test_demoted_manager_releases_reports() {
    let app = TestApp::with_company().await;
    let mgr = app.add_member("auth|mgr", "mgr@acme.test", "manager").await;
    let emp = app.add_member("auth|emp", "emp@acme.test", "employee").await;
    let assigned = app
        .patch(Some(ADMIN), &format!("/members/{emp}"), json!({ "manager_id": mgr }))
        .await;
    assert_eq!(assigned.body["manager_id"], mgr);

    let demoted = app
        .patch(Some(ADMIN), &format!("/members/{mgr}"), json!({ "role": "employee" }))
        .await;
    assert_eq!(demoted.status, StatusCode::OK);
    assert_eq!(demoted.body["role"], "employee");

    let report = app.get(Some(ADMIN), &format!("/members/{emp}")).await;
    assert_eq!(report.status, StatusCode::OK);
    assert!(report.body["manager_id"].is_null());
}

#[tokio::test]
async fn test_admin_removes_member_but_not_self() {
    let app = TestApp::with_company().await;
    let emp = app.add_member("auth|emp", "emp@acme.test", "employee").await;
    let me = app.get(Some(ADMIN), "/me").await;
    let admin_id = me.body["member"]["id"].as_i64().unwrap();

    let own = app.delete(Some(ADMIN), &format!("/members/{admin_id}")).await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);

    let removed = app.delete(Some(ADMIN), &format!("/members/{emp}")).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let gone = app.get(Some(ADMIN), &format!("/members/{emp}")).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_trims_names() {
    let app = TestApp::with_company().await;
    app.add_member("auth|emp", "emp@acme.test", "employee").await;

    let response = app
        .patch(Some("auth|emp"), "/me", json!({ "first_name": "  Bo ", "last_name": " Diddley " }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["first_name"], "Bo");
    assert_eq!(response.body["last_name"], "Diddley");
}
