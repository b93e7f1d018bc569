//! Document lifecycle: creation, signing, forwarding, decline, views, reports

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use docsign_core::notify::{
    completion_email, completion_recipients, forward_email, progress_email, should_notify_progress,
};
use docsign_core::{
    apply_decline, apply_signature, apply_view, finalize_pdf, generate_certificate,
    required_signers, signing_reason, Attachment, MailMessage,
};
use shared_types::{AuditTrailEntry, Contact, Document, Placeholder, UserDetails};

use super::contacts::own_contact;
use super::{ensure_participant, require, validate_email};
use crate::auth::{AuthUser, ClientIp};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::state::AppState;
use crate::storage::{certificate_file_name, progress_file_name, signed_file_name};

/// How far into the upload the `%PDF-` header may start
const PDF_HEADER_WINDOW: usize = 1024;

/// Decode a base64 PDF upload, accepting a `data:` URL prefix
fn decode_pdf(encoded: &str) -> ApiResult<Vec<u8>> {
    let payload = match encoded.split_once("base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| ApiError::Validation(format!("Invalid PDF base64: {}", e)))?;

    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    if !window.windows(5).any(|w| w == b"%PDF-") {
        return Err(ApiError::Validation("pdfFile is not a PDF document".into()));
    }
    Ok(bytes)
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(e.into())
}

/// Identity recorded for a signature
///
/// `user_id` names one of the document's signer contacts. The contact's own
/// user or the document creator may sign for it. Viewers never sign. A
/// document without signers is signed by its creator under their own id.
fn resolve_actor(
    user: &AuthUser,
    document: &Document,
    signers: &[Contact],
    user_id: &str,
) -> ApiResult<UserDetails> {
    if let Some(contact) = signers.iter().find(|c| c.id == user_id) {
        if !document.is_owned_by(&user.id) && !user.has_email(&contact.email) {
            return Err(ApiError::Forbidden(
                "You cannot sign on behalf of this signer".into(),
            ));
        }
        if !contact.user_role.must_sign() {
            return Err(ApiError::Forbidden(format!(
                "A {} cannot sign this document",
                contact.user_role.as_str()
            )));
        }
        return Ok(contact.user_details());
    }
    if signers.is_empty() && user_id == user.id && document.is_owned_by(&user.id) {
        return Ok(user.user_details());
    }
    Err(ApiError::NotFound(format!("Signer not found: {}", user_id)))
}

/// Create a document and attach its signers, or the caller for self-signing
pub async fn after_save(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ClientIp(ip): ClientIp,
    Json(req): Json<AfterSaveRequest>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    require(&req.name, "name")?;
    require(&req.url, "url")?;

    let signers = if req.is_self_sign {
        vec![own_contact(&state, &user).await?]
    } else {
        let contacts = db::resolve_contacts(&state.db, &req.signers).await?;
        if let Some(foreign) = contacts.iter().find(|c| c.created_by != user.id) {
            return Err(ApiError::NotFound(format!("Signer not found: {}", foreign.id)));
        }
        contacts
    };

    let mut document = Document::new(req.name.trim().to_string(), req.url, user.user_details());
    document.description = req.description;
    document.note = req.note;
    document.organization = req.organization;
    document.send_in_order = req.send_in_order;
    document.is_self_sign = req.is_self_sign;
    document.expiry_date = req.expiry_date;
    document.origin_ip = ip;
    document.signers = signers.iter().map(|c| c.id.clone()).collect();
    document.placeholders = if req.placeholders.is_empty() {
        signers
            .iter()
            .map(|c| Placeholder::default_for(Some(c.id.clone())))
            .collect()
    } else {
        req.placeholders
    };
    db::insert_document(&state.db, &document).await?;

    tracing::info!(
        document_id = %document.id,
        signers = document.signers.len(),
        self_sign = document.is_self_sign,
        "Created document"
    );
    let status = DocumentStatus::of(&document, Utc::now());
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse {
            success: true,
            document,
            status,
        }),
    ))
}

/// Fetch a document with its signers resolved
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResolvedDocumentResponse>> {
    let document = db::get_document(&state.db, &id).await?;
    let signers = db::resolve_contacts(&state.db, &document.signers).await?;
    ensure_participant(&user, &document, &signers)?;

    let status = DocumentStatus::of(&document, Utc::now());
    Ok(Json(ResolvedDocumentResponse {
        success: true,
        document,
        signers,
        status,
    }))
}

/// Clear the completion flags after finalization failed, so the next save
/// of the same signer completes the document again
async fn reopen(state: &AppState, document_id: &str) {
    let reopened = db::modify_document(&state.db, document_id, |doc| {
        doc.is_completed = false;
        doc.completed_at = None;
        doc.updated_at = Utc::now();
        Ok(())
    })
    .await;
    if let Err(e) = reopened {
        tracing::error!(document_id, error = %e, "Could not reopen document after failed finalization");
    }
}

/// Watermark, flatten and sign the completed PDF, then store it
async fn finalize_and_store(
    state: &AppState,
    document: &Document,
    pdf_bytes: Vec<u8>,
    reason: String,
) -> ApiResult<(String, Vec<u8>)> {
    let identity = state.identity.clone();
    let document_id = document.id.clone();
    let signed = tokio::task::spawn_blocking(move || {
        finalize_pdf(pdf_bytes, &document_id, &reason, identity.as_ref())
    })
    .await
    .map_err(join_error)??;

    let file_name = signed_file_name(&document.name, &document.id);
    let record = state
        .exports
        .save_pdf(&state.db, &file_name, &signed, &document.created_by.object_id)
        .await?;
    Ok((record.url, signed))
}

async fn certify_and_store(state: &AppState, document: &Document) -> ApiResult<(String, Vec<u8>)> {
    let identity = state.identity.clone();
    let logo = state.certificate_logo.clone();
    let completed_at = document.completed_at.unwrap_or_else(Utc::now);
    let snapshot = document.clone();
    let certificate = tokio::task::spawn_blocking(move || {
        let logo = logo.as_deref().map(Vec::as_slice);
        generate_certificate(&snapshot, completed_at, logo, identity.as_ref())
    })
    .await
    .map_err(join_error)??;

    let file_name = certificate_file_name(&document.id);
    let record = state
        .exports
        .save_pdf(&state.db, &file_name, &certificate, &document.created_by.object_id)
        .await?;
    Ok((record.url, certificate))
}

/// Send a follow-up mail, turning a failure into a response warning
async fn send_or_warn(state: &AppState, mail: &MailMessage, what: &str, warnings: &mut Vec<String>) {
    if let Err(e) = state.mailer.send(mail).await {
        tracing::warn!(error = %e, "{} mail failed", what);
        warnings.push(format!("{} mail was not sent: {}", what, e));
    }
}

/// Point the document at freshly stored artifacts
///
/// A progress upload never replaces the signed file of a completed document,
/// since a slower intermediate save can land after the completing one.
fn record_artifacts(
    doc: &mut Document,
    final_save: bool,
    signed_url: &str,
    certificate_url: Option<&str>,
) {
    if final_save || !doc.is_completed {
        doc.signed_url = Some(signed_url.to_string());
    }
    if let Some(url) = certificate_url {
        doc.certificate_url = Some(url.to_string());
    }
    doc.updated_at = Utc::now();
}

/// Submit a signed PDF
///
/// The signature is merged into the audit trail under the version guard.
/// The save that completes the document produces the signed artifact and
/// the certificate and mails everyone; earlier saves store the upload as is
/// and may notify the creator.
pub async fn save_pdf(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ClientIp(ip): ClientIp,
    Json(req): Json<SavePdfRequest>,
) -> ApiResult<Json<SavePdfResponse>> {
    require(&req.document_id, "documentId")?;
    require(&req.pdf_file, "pdfFile")?;
    require(&req.user_id, "userId")?;
    let pdf_bytes = decode_pdf(&req.pdf_file)?;

    let document = db::get_document(&state.db, &req.document_id).await?;
    let contacts = db::resolve_contacts(&state.db, &document.signers).await?;
    let required = required_signers(&contacts);
    let actor = resolve_actor(&user, &document, &contacts, &req.user_id)?;
    let reason = signing_reason(&required, &actor);
    let required_contacts: Vec<Contact> = required.iter().map(|c| (*c).clone()).collect();
    let required_count = required_contacts.len();

    let now = Utc::now();
    let entry = AuditTrailEntry::signed(actor.clone(), ip, req.signature, now);
    let (document, outcome) = db::modify_document(&state.db, &req.document_id, |doc| {
        if doc.is_declined {
            return Err(ApiError::Conflict("Document has been declined".into()));
        }
        if doc.is_completed {
            return Err(ApiError::Conflict("Document is already completed".into()));
        }
        Ok(apply_signature(doc, entry.clone(), required_count, now))
    })
    .await?;

    tracing::info!(
        document_id = %document.id,
        signer = %actor.object_id,
        signed_count = outcome.completion.signed,
        required_count = outcome.completion.required,
        completed = outcome.newly_completed,
        "Recorded signature"
    );

    let mut warnings = Vec::new();
    let mut certificate = None;
    let signed_url;

    if outcome.newly_completed {
        let (url, signed) = match finalize_and_store(&state, &document, pdf_bytes, reason).await {
            Ok(finalized) => finalized,
            Err(e) => {
                reopen(&state, &document.id).await;
                return Err(e);
            }
        };
        signed_url = url;

        match certify_and_store(&state, &document).await {
            Ok(stored) => certificate = Some(stored),
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "Certificate generation failed");
                warnings.push(format!("Certificate was not generated: {}", e));
            }
        }

        let recipients = completion_recipients(&required_contacts, &document.created_by);
        match &certificate {
            Some((_, certificate_bytes)) => {
                let mail = completion_email(
                    &document,
                    recipients,
                    Attachment::pdf(signed_file_name(&document.name, &document.id), signed),
                    Attachment::pdf(
                        certificate_file_name(&document.id),
                        certificate_bytes.clone(),
                    ),
                );
                send_or_warn(&state, &mail, "Completion", &mut warnings).await;
            }
            None => warnings.push("Completion mail was not sent: certificate unavailable".into()),
        }
    } else {
        let file_name = progress_file_name(&document.name, &document.id, document.version);
        let record = state
            .exports
            .save_pdf(&state.db, &file_name, &pdf_bytes, &document.created_by.object_id)
            .await?;
        signed_url = record.url;

        if should_notify_progress(document.placeholders.len(), outcome.completion.signed) {
            let mail = progress_email(&document, &actor, now, outcome.completion.remaining());
            send_or_warn(&state, &mail, "Progress", &mut warnings).await;
        }
    }

    let certificate_url = certificate.map(|(url, _)| url);
    let final_save = outcome.newly_completed;
    let (document, ()) = db::modify_document(&state.db, &document.id, |doc| {
        record_artifacts(doc, final_save, &signed_url, certificate_url.as_deref());
        Ok(())
    })
    .await?;

    Ok(Json(SavePdfResponse {
        success: true,
        completed: document.is_completed,
        signed_count: outcome.completion.signed,
        required_count: outcome.completion.required,
        signed_url: document.signed_url.clone(),
        certificate_url: document.certificate_url.clone(),
        document,
        warnings,
    }))
}

/// Email the signed document, and its certificate when there is one
pub async fn forward_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ForwardRequest>,
) -> ApiResult<Json<ForwardResponse>> {
    require(&req.document_id, "documentId")?;
    if req.recipients.is_empty() {
        return Err(ApiError::Validation("recipients is required".into()));
    }
    for recipient in &req.recipients {
        validate_email(&recipient.email)?;
    }

    let document = db::get_document(&state.db, &req.document_id).await?;
    let signers = db::resolve_contacts(&state.db, &document.signers).await?;
    ensure_participant(&user, &document, &signers)?;

    let signed_url = document
        .signed_url
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Document has no signed file to forward".into()))?;
    let signed = state.exports.read_url(signed_url).await?;

    let certificate = match document.certificate_url.as_deref() {
        Some(url) => match state.exports.read_url(url).await {
            Ok(bytes) => Some(Attachment::pdf(certificate_file_name(&document.id), bytes)),
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "Certificate unreadable, forwarding without it");
                None
            }
        },
        None => None,
    };

    let mail = forward_email(
        &document,
        &user.user_details(),
        req.recipients,
        Attachment::pdf(signed_file_name(&document.name, &document.id), signed),
        certificate,
    );
    state.mailer.send(&mail).await?;

    tracing::info!(
        document_id = %document.id,
        recipients = mail.to.len(),
        attachments = mail.attachments.len(),
        "Forwarded document"
    );
    Ok(Json(ForwardResponse {
        success: true,
        recipients: mail.to.len(),
        attachments: mail.attachments.len(),
    }))
}

/// Mark a document declined with the given reason
pub async fn decline_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<DeclineRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    require(&req.document_id, "documentId")?;
    require(&req.reason, "reason")?;

    let document = db::get_document(&state.db, &req.document_id).await?;
    let signers = db::resolve_contacts(&state.db, &document.signers).await?;
    ensure_participant(&user, &document, &signers)?;

    let by = signers
        .iter()
        .find(|c| user.has_email(&c.email))
        .map(Contact::user_details)
        .unwrap_or_else(|| user.user_details());

    let (document, ()) = db::modify_document(&state.db, &req.document_id, |doc| {
        apply_decline(doc, req.reason.clone(), by.clone(), Utc::now());
        Ok(())
    })
    .await?;

    tracing::info!(document_id = %document.id, by = %by.object_id, "Declined document");
    let status = DocumentStatus::of(&document, Utc::now());
    Ok(Json(DocumentResponse {
        success: true,
        document,
        status,
    }))
}

/// Record that a signer opened the document
pub async fn view_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ClientIp(ip): ClientIp,
    Json(req): Json<ViewRequest>,
) -> ApiResult<Json<ViewResponse>> {
    require(&req.document_id, "documentId")?;
    require(&req.signer_id, "signerId")?;

    let document = db::get_document(&state.db, &req.document_id).await?;
    let signers = db::resolve_contacts(&state.db, &document.signers).await?;
    ensure_participant(&user, &document, &signers)?;

    let viewer = signers
        .iter()
        .find(|c| c.id == req.signer_id)
        .map(Contact::user_details)
        .ok_or_else(|| ApiError::NotFound(format!("Signer not found: {}", req.signer_id)))?;

    let now = Utc::now();
    let (document, first_view) = db::modify_document(&state.db, &req.document_id, |doc| {
        Ok(apply_view(doc, &viewer, ip.clone(), now))
    })
    .await?;

    tracing::debug!(document_id = %document.id, signer = %req.signer_id, first_view, "Recorded view");
    Ok(Json(ViewResponse {
        success: true,
        first_view,
        viewed_at: now,
        viewers: document.viewers.len(),
    }))
}

/// Paginated listing of the caller's documents
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ReportRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let now = Utc::now();
    let (documents, total) = db::list_documents(&state.db, &user.id, &req, now).await?;

    let documents = documents
        .into_iter()
        .map(|doc| ReportEntry {
            status: DocumentStatus::of(&doc, now),
            signers: doc.signers.len(),
            signed: docsign_core::signed_count(&doc.audit_trail),
            id: doc.id,
            name: doc.name,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            signed_url: doc.signed_url,
            certificate_url: doc.certificate_url,
        })
        .collect();

    Ok(Json(ReportResponse {
        success: true,
        documents,
        total,
        page: req.page(),
        limit: req.limit(),
    }))
}

/// Hard-delete a document; only its creator may do this
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let document = db::get_document(&state.db, &id).await?;
    if !document.is_owned_by(&user.id) {
        return Err(ApiError::Forbidden(
            "Only the creator can delete a document".into(),
        ));
    }
    if !db::delete_document(&state.db, &id).await? {
        return Err(ApiError::NotFound(format!("Document not found: {}", id)));
    }

    tracing::info!(document_id = %id, "Deleted document");
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Document {} deleted", id),
    }))
}
