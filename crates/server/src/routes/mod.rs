//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Identity
//! GET    /me                              - Caller's subject, membership and company
//! PATCH  /me                              - Update own name
//!
//! # Company
//! POST   /companies                       - Create a company, caller becomes admin
//! GET    /company                         - Caller's company
//! PATCH  /company                         - Update company (admin)
//!
//! # Members
//! GET    /members                         - List members (manager+)
//! POST   /members                         - Add a member directly (admin)
//! GET    /members/{id}                    - Member detail (manager+, or self)
//! PATCH  /members/{id}                    - Update name, role, manager (manager+)
//! DELETE /members/{id}                    - Remove member (admin)
//!
//! # Clients and projects
//! GET    /clients, /projects              - List (any member)
//! POST   /clients, /projects              - Create (admin)
//! GET    /clients/{id}, /projects/{id}    - Detail (any member)
//! PUT    /clients/{id}, /projects/{id}    - Replace (admin)
//! DELETE /clients/{id}, /projects/{id}    - Delete (admin)
//!
//! # Invitations
//! GET    /invites                         - Pending invitations (manager+)
//! POST   /invites                         - Issue invitation (manager+)
//! DELETE /invites/{id}                    - Revoke invitation (manager+)
//! GET    /invites/token/{token}           - Preview (no membership needed)
//! POST   /invites/token/{token}/accept    - Accept and join
//!
//! # Time
//! GET    /time-entries                    - List (employees: own only)
//! POST   /time-entries/batch              - Save a weekly sheet as drafts
//! GET    /time-entries/summary            - Per-project totals for a pay period
//! GET    /time-entries/{id}               - Entry detail
//! POST   /time-entries/{id}/{action}      - submit | approve | reject | reopen
//! GET    /pay-periods/current             - Pay period containing a date
//! ```

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::error::AppError;
use crate::state::AppState;

pub mod clients;
pub mod companies;
pub mod invites;
pub mod me;
pub mod members;
pub mod pay_periods;
pub mod projects;
pub mod time_entries;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::show).patch(me::update))
        .route("/companies", post(companies::create))
        .route("/company", get(companies::show).patch(companies::update))
        .route("/members", get(members::index).post(members::create))
        .route(
            "/members/{id}",
            get(members::show)
                .patch(members::update)
                .delete(members::destroy),
        )
        .route("/clients", get(clients::index).post(clients::create))
        .route(
            "/clients/{id}",
            get(clients::show)
                .put(clients::update)
                .delete(clients::destroy),
        )
        .route("/projects", get(projects::index).post(projects::create))
        .route(
            "/projects/{id}",
            get(projects::show)
                .put(projects::update)
                .delete(projects::destroy),
        )
        .route("/invites", get(invites::index).post(invites::create))
        .route("/invites/{id}", delete(invites::revoke))
        .route("/invites/token/{token}", get(invites::preview))
        .route("/invites/token/{token}/accept", post(invites::accept))
        .route("/time-entries", get(time_entries::index))
        .route("/time-entries/batch", post(time_entries::batch))
        .route("/time-entries/summary", get(time_entries::summary))
        .route("/time-entries/{id}", get(time_entries::show))
        .route("/time-entries/{id}/{action}", post(time_entries::review))
        .route("/pay-periods/current", get(pay_periods::current))
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_owned())
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("name", "  Acme ").unwrap(), "Acme");
        assert!(matches!(
            require_text("name", " \t"),
            Err(AppError::BadRequest(msg)) if msg == "name is required"
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" x ".to_owned())), Some("x".to_owned()));
        assert_eq!(optional_text(Some("   ".to_owned())), None);
        assert_eq!(optional_text(None), None);
    }
}
