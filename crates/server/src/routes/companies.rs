//! Company creation and settings.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tally_core::{Email, Role};

use super::{optional_text, require_text};
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Company, CompanyChanges, Member, MemberProfile, NewCompany};
use crate::state::AppState;

/// The founding admin's own details.
#[derive(Debug, Deserialize)]
pub struct FounderRequest {
    pub email: Email,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub company: NewCompany,
    pub admin: FounderRequest,
}

#[derive(Debug, Serialize)]
pub struct CreateCompanyResponse {
    pub company: Company,
    pub member: Member,
}

fn normalize_new(company: NewCompany) -> Result<NewCompany, AppError> {
    Ok(NewCompany {
        name: require_text("name", &company.name)?,
        address: optional_text(company.address),
        contact_name: optional_text(company.contact_name),
        contact_email: company.contact_email,
        contact_phone: optional_text(company.contact_phone),
    })
}

/// Create a company; the caller becomes its first admin.
#[instrument(skip(state, caller, body))]
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CreateCompanyResponse>), AppError> {
    let subject = caller.require_unaffiliated()?;

    let founder = MemberProfile {
        subject: subject.clone(),
        email: body.admin.email,
        first_name: require_text("first_name", &body.admin.first_name)?,
        last_name: body.admin.last_name.trim().to_owned(),
    };
    let (company, member) = state
        .store()
        .create_company_with_admin(normalize_new(body.company)?, founder)
        .await?;

    tracing::info!(company_id = %company.id, member_id = %member.id, "Company created");

    Ok((
        StatusCode::CREATED,
        Json(CreateCompanyResponse { company, member }),
    ))
}

#[instrument(skip(state, caller))]
pub async fn show(State(state): State<AppState>, caller: Caller) -> Result<Json<Company>, AppError> {
    let member = caller.member()?;
    let company = state
        .store()
        .get_company(member.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("company".to_owned()))?;
    Ok(Json(company))
}

#[instrument(skip(state, caller, body))]
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CompanyChanges>,
) -> Result<Json<Company>, AppError> {
    let admin = caller.require(Role::Admin)?;

    let changes = CompanyChanges {
        name: body.name.map(|n| require_text("name", &n)).transpose()?,
        address: optional_text(body.address),
        contact_name: optional_text(body.contact_name),
        contact_email: body.contact_email,
        contact_phone: optional_text(body.contact_phone),
    };

    let company = state
        .store()
        .update_company(admin.company_id, changes)
        .await?;
    tracing::info!(company_id = %company.id, updated_by = %admin.id, "Company updated");
    Ok(Json(company))
}
