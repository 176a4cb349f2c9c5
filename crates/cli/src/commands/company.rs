//! Company bootstrap.

use tally_server::db::CompanyRepository;
use tally_server::models::NewCompany;

use super::{CliError, ProfileArgs, connect};

/// Create a company and make the given identity its admin.
pub async fn create(
    name: &str,
    subject: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), CliError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidArgument("company name is required".to_owned()));
    }
    let founder = ProfileArgs {
        subject: subject.to_owned(),
        email: email.to_owned(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
    }
    .validate()?;

    let store = connect().await?;
    let company = NewCompany {
        name: name.to_owned(),
        ..NewCompany::default()
    };
    let (company, admin) = store.create_company_with_admin(company, founder).await?;

    tracing::info!(
        "Company created! ID: {}, Name: {}, Admin member ID: {} ({})",
        company.id,
        company.name,
        admin.id,
        admin.email
    );
    Ok(())
}
