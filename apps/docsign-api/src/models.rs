//! Request and response bodies for DocSign API

use chrono::{DateTime, Utc};
use docsign_core::Recipient;
use serde::{Deserialize, Serialize};
use shared_types::{Contact, Document, Placeholder, UserRole};
use sqlx::FromRow;

/// Lifecycle status derived from a document's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    InProgress,
    Completed,
    Declined,
    Expired,
}

impl DocumentStatus {
    /// Declined wins over completed, and completed over expired
    pub fn of(document: &Document, now: DateTime<Utc>) -> Self {
        if document.is_declined {
            DocumentStatus::Declined
        } else if document.is_completed {
            DocumentStatus::Completed
        } else if document.is_expired(now) {
            DocumentStatus::Expired
        } else if document.signers.is_empty() && !document.is_self_sign {
            DocumentStatus::Draft
        } else {
            DocumentStatus::InProgress
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Draft => write!(f, "draft"),
            DocumentStatus::InProgress => write!(f, "in_progress"),
            DocumentStatus::Completed => write!(f, "completed"),
            DocumentStatus::Declined => write!(f, "declined"),
            DocumentStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Report filter; `All` disables status filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Draft,
    InProgress,
    Completed,
    Declined,
    Expired,
}

impl StatusFilter {
    pub fn matches(&self, status: DocumentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Draft => status == DocumentStatus::Draft,
            StatusFilter::InProgress => status == DocumentStatus::InProgress,
            StatusFilter::Completed => status == DocumentStatus::Completed,
            StatusFilter::Declined => status == DocumentStatus::Declined,
            StatusFilter::Expired => status == DocumentStatus::Expired,
        }
    }
}

// ============================================================
// Contacts
// ============================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default = "default_role", alias = "userRole")]
    pub user_role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Signer
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub contact: Contact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactListResponse {
    pub success: bool,
    pub contacts: Vec<Contact>,
}

/// Contact row as stored in SQLite
#[derive(Debug, Clone, FromRow)]
pub struct DbContact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub user_role: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbContact> for Contact {
    type Error = String;

    fn try_from(row: DbContact) -> Result<Self, Self::Error> {
        Ok(Contact {
            user_role: row.user_role.parse()?,
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

// ============================================================
// Documents
// ============================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AfterSaveRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    /// Contact ids in signing order
    #[serde(default)]
    pub signers: Vec<String>,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    #[serde(default, alias = "sendInOrder")]
    pub send_in_order: bool,
    #[serde(default, alias = "isSelfSign")]
    pub is_self_sign: bool,
    #[serde(default, alias = "expiryDate")]
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub document: Document,
    pub status: DocumentStatus,
}

/// A document with its signer references resolved to contacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDocumentResponse {
    pub success: bool,
    pub document: Document,
    pub signers: Vec<Contact>,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavePdfRequest {
    #[serde(default, alias = "documentId")]
    pub document_id: String,
    /// Base64 PDF, optionally as a data URL
    #[serde(default, alias = "pdfFile")]
    pub pdf_file: String,
    /// Contact id of the signer, or the caller's own id on documents without signers
    #[serde(default, alias = "userId")]
    pub user_id: String,
    /// Signature image as a data URL or bare base64 PNG
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePdfResponse {
    pub success: bool,
    pub document: Document,
    pub completed: bool,
    pub signed_count: usize,
    pub required_count: usize,
    pub signed_url: Option<String>,
    pub certificate_url: Option<String>,
    /// Follow-up steps that failed without failing the save
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForwardRequest {
    #[serde(alias = "documentId")]
    pub document_id: String,
    pub recipients: Vec<Recipient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardResponse {
    pub success: bool,
    pub recipients: usize,
    pub attachments: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclineRequest {
    #[serde(alias = "documentId")]
    pub document_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewRequest {
    #[serde(alias = "documentId")]
    pub document_id: String,
    #[serde(alias = "signerId")]
    pub signer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub success: bool,
    pub first_view: bool,
    pub viewed_at: DateTime<Utc>,
    pub viewers: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

impl ReportRequest {
    /// 1-based page number
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u32 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    pub name: String,
    pub status: DocumentStatus,
    pub signers: usize,
    pub signed: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub signed_url: Option<String>,
    pub certificate_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    pub documents: Vec<ReportEntry>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
