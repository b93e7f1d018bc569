//! The document entity mutated by the signing workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{AuditTrailEntry, UserDetails};

/// Where a signer is expected to sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    #[serde(default)]
    pub signer_id: Option<String>,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placeholder {
    /// Bottom-left placement on page 1 for a signer without an explicit spot
    pub fn default_for(signer_id: Option<String>) -> Self {
        Self {
            signer_id,
            page: 1,
            x: 50.0,
            y: 50.0,
            width: 150.0,
            height: 50.0,
        }
    }
}

/// Last time a signer opened the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewer {
    pub signer_id: String,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Originating upload URL
    pub url: String,
    #[serde(default)]
    pub organization: Option<String>,
    /// Ordered contact ids
    #[serde(default)]
    pub signers: Vec<String>,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    #[serde(default)]
    pub send_in_order: bool,
    #[serde(default)]
    pub is_self_sign: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signed_url: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub audit_trail: Vec<AuditTrailEntry>,
    #[serde(default)]
    pub viewers: Vec<Viewer>,
    #[serde(default)]
    pub is_declined: bool,
    #[serde(default)]
    pub decline_reason: Option<String>,
    #[serde(default)]
    pub decline_by: Option<UserDetails>,
    pub created_by: UserDetails,
    #[serde(default)]
    pub origin_ip: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every persisted change
    #[serde(default)]
    pub version: i64,
}

impl Document {
    pub fn new(name: String, url: String, created_by: UserDetails) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            note: None,
            url,
            organization: None,
            signers: Vec::new(),
            placeholders: Vec::new(),
            send_in_order: false,
            is_self_sign: false,
            is_completed: false,
            completed_at: None,
            signed_url: None,
            certificate_url: None,
            audit_trail: Vec::new(),
            viewers: Vec::new(),
            is_declined: false,
            decline_reason: None,
            decline_by: None,
            created_by,
            origin_ip: None,
            expiry_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by.object_id == user_id
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.expiry_date.is_some_and(|expiry| expiry <= now)
    }
}
