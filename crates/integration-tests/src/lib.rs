//! Integration test harness for Tally.
//!
//! Each [`TestApp`] is a full router over a fresh
//! [`MemoryStore`](tally_server::db::memory::MemoryStore), a pinned clock
//! and a notifier that records what it was asked to send. Requests go
//! through `tower::ServiceExt::oneshot`, so no socket is opened.
//!
//! ```bash
//! cargo test -p tally-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use tally_server::config::AppSettings;
use tally_server::db::memory::MemoryStore;
use tally_server::services::{EmailError, FixedClock, InvitationMessage, InviteNotifier};
use tally_server::state::AppState;

/// Subject used for the founding admin in [`TestApp::with_company`].
pub const ADMIN: &str = "auth|admin";

/// Notifier that keeps every message and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<InvitationMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<InvitationMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make subsequent deliveries fail.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl InviteNotifier for RecordingNotifier {
    async fn send_invitation(&self, message: &InvitationMessage) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::InvalidAddress(message.recipient.clone()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// Status and JSON body of a response. Empty bodies read as `null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `error` code of an error body.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// A router wired to in-memory collaborators.
pub struct TestApp {
    router: Router,
    pub clock: Arc<FixedClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub settings: AppSettings,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Wednesday 2024-05-15 12:00 UTC.
    pub fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    pub fn new() -> Self {
        let settings = AppSettings::default();
        let clock = Arc::new(FixedClock::new(Self::start_time()));
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            settings.clone(),
            Arc::new(MemoryStore::new()),
            notifier.clone(),
            clock.clone(),
        );

        Self {
            router: tally_server::app(state),
            clock,
            notifier,
            settings,
        }
    }

    /// A fresh app with "Acme" founded by [`ADMIN`].
    pub async fn with_company() -> Self {
        let app = Self::new();
        let response = app
            .post(
                Some(ADMIN),
                "/companies",
                json!({
                    "company": { "name": "Acme" },
                    "admin": { "email": "ada@acme.test", "first_name": "Ada", "last_name": "Admin" }
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        app
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        self.clock.set(Self::start_time() + by);
    }

    pub async fn request(
        &self,
        method: Method,
        subject: Option<&str>,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(subject) = subject {
            builder = builder.header(self.settings.identity_header.clone(), subject);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, subject: Option<&str>, uri: &str) -> TestResponse {
        self.request(Method::GET, subject, uri, None).await
    }

    pub async fn post(&self, subject: Option<&str>, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, subject, uri, Some(body)).await
    }

    pub async fn patch(&self, subject: Option<&str>, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, subject, uri, Some(body)).await
    }

    pub async fn put(&self, subject: Option<&str>, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, subject, uri, Some(body)).await
    }

    pub async fn delete(&self, subject: Option<&str>, uri: &str) -> TestResponse {
        self.request(Method::DELETE, subject, uri, None).await
    }

    /// Add a member directly as [`ADMIN`]; returns the member ID.
    pub async fn add_member(&self, subject: &str, email: &str, role: &str) -> i64 {
        let response = self
            .post(
                Some(ADMIN),
                "/members",
                json!({ "subject": subject, "email": email, "first_name": subject, "role": role }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Create a client and a project under it as [`ADMIN`]; returns the project ID.
    pub async fn add_project(&self, name: &str) -> i64 {
        let client = self
            .post(Some(ADMIN), "/clients", json!({ "name": format!("{name} Client") }))
            .await;
        assert_eq!(client.status, StatusCode::CREATED, "{:?}", client.body);

        let project = self
            .post(
                Some(ADMIN),
                "/projects",
                json!({ "client_id": client.body["id"], "name": name }),
            )
            .await;
        assert_eq!(project.status, StatusCode::CREATED, "{:?}", project.body);
        project.body["id"].as_i64().unwrap()
    }
}

/// Token carried by an accept link.
pub fn token_from_url(url: &str) -> String {
    url.split_once("token=").unwrap().1.to_owned()
}
