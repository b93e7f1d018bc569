use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a persisted binary artifact (upload, signed PDF, certificate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub mime_type: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}
