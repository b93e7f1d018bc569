//! Audit trail records embedded in each document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of activity recorded against a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    Created,
    Viewed,
    Signed,
    Downloaded,
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::Created => write!(f, "Created"),
            Activity::Viewed => write!(f, "Viewed"),
            Activity::Signed => write!(f, "Signed"),
            Activity::Downloaded => write!(f, "Downloaded"),
        }
    }
}

/// Denormalized snapshot of the person acting on a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub object_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl UserDetails {
    /// `Name <email>` form used in signing reasons and mail headers
    pub fn display_identity(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Pointer to the actor of an audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRef {
    pub object_id: String,
}

/// One event in a document's audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    #[serde(rename = "Activity")]
    pub activity: Activity,
    #[serde(rename = "ipAddress", default)]
    pub ip_address: Option<String>,
    #[serde(rename = "SignedOn", default)]
    pub signed_on: Option<DateTime<Utc>>,
    /// Signature image as a data URL or bare base64 PNG
    #[serde(rename = "Signature", default)]
    pub signature: Option<String>,
    #[serde(rename = "UserDetails")]
    pub user_details: UserDetails,
    #[serde(rename = "UserPtr")]
    pub user_ptr: ActorRef,
}

impl AuditTrailEntry {
    /// Build a "Signed" entry for the given actor
    pub fn signed(
        user: UserDetails,
        ip_address: Option<String>,
        signature: Option<String>,
        signed_on: DateTime<Utc>,
    ) -> Self {
        let user_ptr = ActorRef {
            object_id: user.object_id.clone(),
        };
        Self {
            activity: Activity::Signed,
            ip_address,
            signed_on: Some(signed_on),
            signature,
            user_details: user,
            user_ptr,
        }
    }

    /// Identity this entry is keyed by in the ledger
    pub fn actor_id(&self) -> &str {
        &self.user_ptr.object_id
    }
}
