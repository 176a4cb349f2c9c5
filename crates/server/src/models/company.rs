//! Company records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{CompanyId, Email};

/// A tenant company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: Option<String>,
    /// Primary contact person.
    pub contact_name: Option<String>,
    pub contact_email: Option<Email>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<Email>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

/// Partial company update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompanyChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<Email>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

impl CompanyChanges {
    /// Apply the changes to an existing record in place.
    pub fn apply(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(address) = self.address {
            company.address = Some(address);
        }
        if let Some(contact_name) = self.contact_name {
            company.contact_name = Some(contact_name);
        }
        if let Some(contact_email) = self.contact_email {
            company.contact_email = Some(contact_email);
        }
        if let Some(contact_phone) = self.contact_phone {
            company.contact_phone = Some(contact_phone);
        }
    }
}
