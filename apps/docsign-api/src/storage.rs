//! Exported artifact store
//!
//! Signed documents and certificates are written under the exports directory
//! and served back from `/exports/<file>`. Every stored artifact also gets a
//! row in the `files` table.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use shared_types::FileRecord;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiResult;

const PDF_MIME: &str = "application/pdf";

pub struct ExportStore {
    dir: PathBuf,
    base_url: String,
}

/// File name of the signed document artifact
pub fn signed_file_name(document_name: &str, document_id: &str) -> String {
    format!("signed_{}_{}.pdf", safe_stem(document_name), document_id)
}

/// File name of a partially signed upload, one per document version
pub fn progress_file_name(document_name: &str, document_id: &str, version: i64) -> String {
    format!("progress_{}_{}_v{}.pdf", safe_stem(document_name), document_id, version)
}

/// File name of the certificate artifact
pub fn certificate_file_name(document_id: &str) -> String {
    format!("signed_certificate_{}.pdf", document_id)
}

/// Reduce a document name to a file-name-safe stem without the `.pdf` suffix
fn safe_stem(name: &str) -> String {
    let trimmed = name.trim();
    let stem = trimmed
        .strip_suffix(".pdf")
        .or_else(|| trimmed.strip_suffix(".PDF"))
        .unwrap_or(trimmed);
    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "document".to_string()
    } else {
        safe
    }
}

impl ExportStore {
    pub async fn new(dir: impl Into<PathBuf>, base_url: &str) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating exports directory {}", dir.display()))?;
        Ok(Self {
            dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/exports/{}", self.base_url, file_name)
    }

    /// Write a PDF artifact and record it, replacing an earlier file of the same name
    pub async fn save_pdf(
        &self,
        db: &SqlitePool,
        file_name: &str,
        bytes: &[u8],
        owner: &str,
    ) -> ApiResult<FileRecord> {
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            name: file_name.to_string(),
            url: self.url_for(file_name),
            size: bytes.len() as i64,
            mime_type: PDF_MIME.to_string(),
            owner: owner.to_string(),
            created_at: Utc::now(),
        };
        crate::db::insert_file(db, &record).await?;

        tracing::info!(file = file_name, size = bytes.len(), "Stored export");
        Ok(record)
    }

    /// Read back an artifact by the URL handed out for it
    pub async fn read_url(&self, url: &str) -> ApiResult<Vec<u8>> {
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != ".." && *name != ".")
            .ok_or_else(|| anyhow::anyhow!("not an export URL: {}", url))?;
        let path = self.dir.join(file_name);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names() {
        assert_eq!(signed_file_name("Lease.pdf", "d1"), "signed_Lease_d1.pdf");
        assert_eq!(
            signed_file_name("NDA v2 (final)", "d1"),
            "signed_NDA_v2__final__d1.pdf"
        );
        assert_eq!(signed_file_name("../../etc", "d1"), "signed_______etc_d1.pdf");
        assert_eq!(signed_file_name("", "d1"), "signed_document_d1.pdf");
        assert_eq!(certificate_file_name("d1"), "signed_certificate_d1.pdf");
    }

    #[test]
    fn progress_uploads_never_share_the_signed_name() {
        assert_eq!(progress_file_name("Lease.pdf", "d1", 3), "progress_Lease_d1_v3.pdf");
        assert_ne!(progress_file_name("Lease", "d1", 1), progress_file_name("Lease", "d1", 2));
        assert_ne!(progress_file_name("Lease", "d1", 1), signed_file_name("Lease", "d1"));
    }

    #[tokio::test]
    async fn urls_map_back_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExportStore::new(dir.path(), "http://localhost:3001/")
            .await
            .unwrap();
        assert_eq!(store.url_for("a.pdf"), "http://localhost:3001/exports/a.pdf");

        tokio::fs::write(dir.path().join("a.pdf"), b"%PDF").await.unwrap();
        let bytes = store.read_url(&store.url_for("a.pdf")).await.unwrap();
        assert_eq!(bytes, b"%PDF");
        assert!(store.read_url("http://localhost:3001/exports/").await.is_err());
    }
}
