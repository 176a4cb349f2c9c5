//! Client (customer) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{ClientId, CompanyId, Email};

/// A company's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: ClientId,
    pub company_id: CompanyId,
    pub name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full set of editable client fields, used for both create and replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientChanges {
    pub name: String,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
