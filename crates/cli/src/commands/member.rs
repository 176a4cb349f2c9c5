//! Manual member creation, bypassing invitations.

use tally_core::{CompanyId, MemberId, Role};
use tally_server::db::{CompanyRepository, MemberRepository};

use super::{CliError, ProfileArgs, connect};

/// Add a member to an existing company.
pub async fn create(
    company: i32,
    profile: ProfileArgs,
    role: &str,
    manager: Option<i32>,
) -> Result<(), CliError> {
    let role: Role = role.parse()?;
    let profile = profile.validate()?;
    let company_id = CompanyId::new(company);

    let store = connect().await?;
    if store.get_company(company_id).await?.is_none() {
        return Err(CliError::InvalidArgument(format!("no company with ID {company}")));
    }

    let manager_id = match manager.map(MemberId::new) {
        Some(id) => {
            let manager = store
                .get_member(company_id, id)
                .await?
                .ok_or_else(|| CliError::InvalidArgument(format!("no member {id} in company")))?;
            if manager.role < Role::Manager {
                return Err(CliError::InvalidArgument(format!(
                    "member {id} is an employee and cannot manage others"
                )));
            }
            Some(id)
        }
        None => None,
    };

    let mut new_member = profile.join(company_id, role);
    new_member.manager_id = manager_id;
    let member = store.create_member(new_member).await?;

    tracing::info!(
        "Member created! ID: {}, Email: {}, Role: {}",
        member.id,
        member.email,
        member.role
    );
    Ok(())
}
