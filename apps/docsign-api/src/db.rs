//! SQLite persistence
//!
//! A document is stored as its JSON body next to the columns the report
//! filters on. The `version` column guards every write: updates only land
//! when the row still carries the version that was read.

use chrono::{DateTime, Utc};
use shared_types::{Contact, Document, FileRecord};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{ApiError, ApiResult};
use crate::models::{DbContact, ReportRequest, StatusFilter};

/// Attempts at a versioned update before giving up with 409
pub const MAX_UPDATE_ATTEMPTS: usize = 3;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            created_by TEXT NOT NULL,
            name TEXT NOT NULL,
            signer_count INTEGER NOT NULL DEFAULT 0,
            is_self_sign INTEGER NOT NULL DEFAULT 0,
            is_completed INTEGER NOT NULL DEFAULT 0,
            is_declined INTEGER NOT NULL DEFAULT 0,
            expiry_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 0,
            body TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(created_by, created_at)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            company TEXT,
            user_role TEXT NOT NULL,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (created_by, email)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            size INTEGER NOT NULL,
            mime_type TEXT NOT NULL,
            owner TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Migrations complete");
    Ok(())
}

// ============================================================
// Documents
// ============================================================

fn encode_body(document: &Document) -> ApiResult<String> {
    serde_json::to_string(document).map_err(|e| ApiError::Internal(e.into()))
}

fn decode_body(body: &str, version: i64) -> ApiResult<Document> {
    let mut document: Document =
        serde_json::from_str(body).map_err(|e| ApiError::Internal(e.into()))?;
    document.version = version;
    Ok(document)
}

pub async fn insert_document(pool: &SqlitePool, document: &Document) -> ApiResult<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, created_by, name, signer_count, is_self_sign, is_completed,
                               is_declined, expiry_date, created_at, updated_at, version, body)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&document.id)
    .bind(&document.created_by.object_id)
    .bind(&document.name)
    .bind(document.signers.len() as i64)
    .bind(document.is_self_sign)
    .bind(document.is_completed)
    .bind(document.is_declined)
    .bind(document.expiry_date)
    .bind(document.created_at)
    .bind(document.updated_at)
    .bind(document.version)
    .bind(encode_body(document)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_document(pool: &SqlitePool, id: &str) -> ApiResult<Option<Document>> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT body, version FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.map(|(body, version)| decode_body(&body, version))
        .transpose()
}

pub async fn get_document(pool: &SqlitePool, id: &str) -> ApiResult<Document> {
    find_document(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Document not found: {}", id)))
}

/// Write `document` if the stored row still has `expected_version`
///
/// Returns false when another writer got there first.
async fn update_if_version(
    pool: &SqlitePool,
    document: &Document,
    expected_version: i64,
) -> ApiResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET name = ?, signer_count = ?, is_self_sign = ?, is_completed = ?, is_declined = ?,
            expiry_date = ?, updated_at = ?, version = ?, body = ?
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(&document.name)
    .bind(document.signers.len() as i64)
    .bind(document.is_self_sign)
    .bind(document.is_completed)
    .bind(document.is_declined)
    .bind(document.expiry_date)
    .bind(document.updated_at)
    .bind(document.version)
    .bind(encode_body(document)?)
    .bind(&document.id)
    .bind(expected_version)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Read-modify-write a document under the version guard
///
/// `apply` runs against a fresh copy on every attempt, so it must derive its
/// changes from the document it is handed. An error from `apply` aborts
/// without writing.
pub async fn modify_document<T, F>(
    pool: &SqlitePool,
    id: &str,
    mut apply: F,
) -> ApiResult<(Document, T)>
where
    F: FnMut(&mut Document) -> ApiResult<T>,
{
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let mut document = get_document(pool, id).await?;
        let expected = document.version;

        let output = apply(&mut document)?;
        document.version = expected + 1;

        if update_if_version(pool, &document, expected).await? {
            return Ok((document, output));
        }
        tracing::warn!(document_id = id, attempt, "Concurrent document update, retrying");
    }

    Err(ApiError::Conflict(format!(
        "Document {} was modified concurrently, please retry",
        id
    )))
}

pub async fn delete_document(pool: &SqlitePool, id: &str) -> ApiResult<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Append the report's status and search conditions
///
/// The conditions mirror `DocumentStatus::of`: declined, then completed,
/// then expired, then draft versus in progress.
fn push_report_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    owner: &str,
    request: &ReportRequest,
    now: DateTime<Utc>,
) {
    builder.push(" WHERE created_by = ");
    builder.push_bind(owner.to_string());

    let open = " AND is_declined = 0 AND is_completed = 0";
    match request.status {
        StatusFilter::All => {}
        StatusFilter::Declined => {
            builder.push(" AND is_declined = 1");
        }
        StatusFilter::Completed => {
            builder.push(" AND is_declined = 0 AND is_completed = 1");
        }
        StatusFilter::Expired => {
            builder.push(open);
            builder.push(" AND expiry_date IS NOT NULL AND expiry_date <= ");
            builder.push_bind(now);
        }
        StatusFilter::Draft | StatusFilter::InProgress => {
            builder.push(open);
            builder.push(" AND (expiry_date IS NULL OR expiry_date > ");
            builder.push_bind(now);
            builder.push(")");
            if request.status == StatusFilter::Draft {
                builder.push(" AND signer_count = 0 AND is_self_sign = 0");
            } else {
                builder.push(" AND (signer_count > 0 OR is_self_sign = 1)");
            }
        }
    }

    if let Some(search) = request.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(" AND name LIKE ");
        builder.push_bind(format!("%{}%", search));
    }
}

/// One page of the caller's documents, newest first, plus the total match count
pub async fn list_documents(
    pool: &SqlitePool,
    owner: &str,
    request: &ReportRequest,
    now: DateTime<Utc>,
) -> ApiResult<(Vec<Document>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM documents");
    push_report_filters(&mut count, owner, request, now);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT body, version FROM documents");
    push_report_filters(&mut select, owner, request, now);
    select.push(" ORDER BY created_at DESC, id LIMIT ");
    select.push_bind(request.limit() as i64);
    select.push(" OFFSET ");
    select.push_bind(request.offset() as i64);

    let rows: Vec<(String, i64)> = select.build_query_as().fetch_all(pool).await?;
    let documents = rows
        .iter()
        .map(|(body, version)| decode_body(body, *version))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok((documents, total))
}

// ============================================================
// Contacts
// ============================================================

fn contact_from_row(row: DbContact) -> ApiResult<Contact> {
    Contact::try_from(row).map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))
}

pub async fn insert_contact(pool: &SqlitePool, contact: &Contact) -> ApiResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO contacts (id, name, email, phone, company, user_role, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&contact.id)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.company)
    .bind(contact.user_role.as_str())
    .bind(&contact.created_by)
    .bind(contact.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(ApiError::Conflict(
            format!("A contact with email {} already exists", contact.email),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_contact(pool: &SqlitePool, id: &str) -> ApiResult<Option<Contact>> {
    let row: Option<DbContact> = sqlx::query_as("SELECT * FROM contacts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(contact_from_row).transpose()
}

pub async fn find_contact_by_email(
    pool: &SqlitePool,
    owner: &str,
    email: &str,
) -> ApiResult<Option<Contact>> {
    let row: Option<DbContact> =
        sqlx::query_as("SELECT * FROM contacts WHERE created_by = ? AND email = ? COLLATE NOCASE")
            .bind(owner)
            .bind(email.trim())
            .fetch_optional(pool)
            .await?;
    row.map(contact_from_row).transpose()
}

pub async fn list_contacts(pool: &SqlitePool, owner: &str) -> ApiResult<Vec<Contact>> {
    let rows: Vec<DbContact> =
        sqlx::query_as("SELECT * FROM contacts WHERE created_by = ? ORDER BY created_at, id")
            .bind(owner)
            .fetch_all(pool)
            .await?;
    rows.into_iter().map(contact_from_row).collect()
}

/// Resolve signer ids to contacts one at a time, keeping their order
pub async fn resolve_contacts(pool: &SqlitePool, ids: &[String]) -> ApiResult<Vec<Contact>> {
    let mut contacts = Vec::with_capacity(ids.len());
    for id in ids {
        let contact = find_contact(pool, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Signer not found: {}", id)))?;
        contacts.push(contact);
    }
    Ok(contacts)
}

// ============================================================
// Files
// ============================================================

pub async fn insert_file(pool: &SqlitePool, file: &FileRecord) -> ApiResult<()> {
    sqlx::query(
        r#"
        INSERT INTO files (id, name, url, size, mime_type, owner, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&file.id)
    .bind(&file.name)
    .bind(&file.url)
    .bind(file.size)
    .bind(&file.mime_type)
    .bind(&file.owner)
    .bind(file.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_files(pool: &SqlitePool, owner: &str) -> ApiResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE owner = ?")
        .bind(owner)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
