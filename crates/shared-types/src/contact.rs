//! Address-book contacts that act on documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::UserDetails;

/// Role a contact plays on a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Signer,
    Viewer,
    Approver,
}

impl UserRole {
    /// Signers and approvers must sign before a document completes
    pub fn must_sign(&self) -> bool {
        matches!(self, UserRole::Signer | UserRole::Approver)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Signer => "signer",
            UserRole::Viewer => "viewer",
            UserRole::Approver => "approver",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signer" => Ok(UserRole::Signer),
            "viewer" => Ok(UserRole::Viewer),
            "approver" => Ok(UserRole::Approver),
            other => Err(format!("unknown user role: {}", other)),
        }
    }
}

/// A per-creator address-book entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub user_role: UserRole,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// Snapshot used in audit entries
    pub fn user_details(&self) -> UserDetails {
        UserDetails {
            object_id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            company: self.company.clone(),
        }
    }
}
