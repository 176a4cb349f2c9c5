//! Invitation issuance from the command line.

use std::sync::Arc;

use tally_core::{CompanyId, Email, MemberId, Role};
use tally_server::config::AppSettings;
use tally_server::db::MemberRepository;
use tally_server::services::{LogNotifier, SystemClock, invites};
use tally_server::state::AppState;

use super::{CliError, connect};

/// Issue an invitation as `inviter` and log the accept link.
///
/// Delivery goes through the log notifier; share the link by hand.
pub async fn create(company: i32, inviter: i32, email: &str, role: &str) -> Result<(), CliError> {
    let role: Role = role.parse()?;
    let email = Email::parse(email)?;
    let settings = AppSettings::from_env()?;

    let store = connect().await?;
    let inviter = store
        .get_member(CompanyId::new(company), MemberId::new(inviter))
        .await?
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("no member {inviter} in company {company}"))
        })?;

    let state = AppState::new(
        settings,
        Arc::new(store),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    );
    let issued = invites::issue(&state, &inviter, email, role).await?;

    tracing::info!("Invite created successfully!");
    tracing::info!("  Email: {}", issued.invite.email);
    tracing::info!("  Role: {}", issued.invite.role);
    tracing::info!("  Expires: {}", issued.invite.expires_at);
    tracing::info!("");
    tracing::info!("Share this link with the invitee:");
    tracing::info!("  {}", issued.accept_url);
    Ok(())
}
