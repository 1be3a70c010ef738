//! Employers posting jobs and owners listing properties.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StaybookError, StaybookResult};
use crate::store::{Document, new_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Anything else the admin form sends along.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub property_ids: Vec<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Document for Employer {
    const COLLECTION: &'static str = "employers";
    const KIND: &'static str = "Employer";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Owner {
    const COLLECTION: &'static str = "owners";
    const KIND: &'static str = "Owner";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Contact fields shared by employer and owner submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartyDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub property_ids: Vec<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl PartyDraft {
    fn validate(&self) -> StaybookResult<()> {
        if self.name.trim().is_empty() {
            return Err(StaybookError::Validation("name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(StaybookError::Validation(format!(
                "invalid email '{}'",
                self.email
            )));
        }
        Ok(())
    }

    pub fn into_employer(self) -> StaybookResult<Employer> {
        self.validate()?;
        Ok(Employer {
            id: new_id(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            attributes: self.attributes,
            created_at: Utc::now(),
        })
    }

    pub fn into_owner(self) -> StaybookResult<Owner> {
        self.validate()?;
        Ok(Owner {
            id: new_id(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            property_ids: self.property_ids,
            attributes: self.attributes,
            created_at: Utc::now(),
        })
    }
}
