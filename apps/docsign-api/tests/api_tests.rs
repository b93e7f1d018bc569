//! HTTP integration tests for the signing workflow.

mod common;

use axum::http::{Method, StatusCode};
use common::{export_path, test_app, test_app_with};
use pretty_assertions::assert_eq;
use serde_json::json;

// ---------------------------------------------------------------------------
// Health and auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_token() {
    let app = test_app().await;
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn missing_token_is_401_with_details_in_development() {
    let app = test_app().await;
    let (status, body) = app
        .request(Method::GET, "/documents/anything", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "Missing Authorization header");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn exports_require_a_token() {
    let app = test_app().await;
    let (status, _) = app
        .request(Method::GET, "/exports/whatever.pdf", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

async fn create_forwarded(app: &common::TestApp, owner: &common::Caller) -> serde_json::Value {
    let (status, body) = app
        .request_with_headers(
            Method::POST,
            "/documents/after-save",
            Some(owner),
            Some(json!({ "name": "Proxied", "url": "/u/p.pdf" })),
            &[("x-forwarded-for", "203.0.113.9, 10.0.0.1")],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn forwarded_for_is_ignored_by_default() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let body = create_forwarded(&app, &owner).await;
    assert!(body["document"]["origin_ip"].is_null());
}

#[tokio::test]
async fn forwarded_for_is_recorded_behind_a_trusted_proxy() {
    let app = test_app_with(|config| config.trust_proxy = true).await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let body = create_forwarded(&app, &owner).await;
    assert_eq!(body["document"]["origin_ip"], "203.0.113.9");
}

// ---------------------------------------------------------------------------
// Two-signer scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alice_then_bob_completes_with_certificate_and_mail() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let alice = app.caller("u-alice", "Alice", "alice@example.com");
    let bob = app.caller("u-bob", "Bob", "bob@example.com");

    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;
    let bob_id = app.contact(&owner, "Bob", "bob@example.com").await;
    let doc_id = app.document(&owner, "NDA.pdf", &[&alice_id, &bob_id]).await;

    let (status, body) = app.sign(&alice, &doc_id, &alice_id).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["completed"], false);
    assert_eq!(body["document"]["audit_trail"].as_array().unwrap().len(), 1);
    assert!(body["certificate_url"].is_null());
    assert!(body["signed_url"].is_string());
    // Two placeholders and one signature: the creator is not told yet
    assert!(app.state.mailer.sent().await.is_empty());

    let (status, body) = app.sign(&bob, &doc_id, &bob_id).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["completed"], true);
    assert_eq!(body["signed_count"], 2);
    assert_eq!(body["required_count"], 2);
    assert_eq!(body["warnings"], json!([]));
    assert_eq!(body["document"]["audit_trail"].as_array().unwrap().len(), 2);

    let signed_url = body["signed_url"].as_str().unwrap();
    let certificate_url = body["certificate_url"].as_str().unwrap();
    assert!(signed_url.ends_with(&format!("signed_NDA_{}.pdf", doc_id)));
    assert!(certificate_url.ends_with(&format!("signed_certificate_{}.pdf", doc_id)));

    let sent = app.state.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    let emails: Vec<&str> = sent[0].to.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["alice@example.com", "bob@example.com", "owner@example.com"]
    );
    assert_eq!(sent[0].attachments.len(), 2);

    let (status, pdf) = app.get_raw(&export_path(signed_url), &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert!(pdf.starts_with(b"%PDF"));
    assert!(pdf.windows(10).any(|w| w == b"/ByteRange"));

    let (status, certificate) = app.get_raw(&export_path(certificate_url), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert!(certificate.starts_with(b"%PDF"));

    // Raw upload, signed document and certificate
    let files = docsign_api::db::count_files(&app.state.db, "u-owner")
        .await
        .unwrap();
    assert_eq!(files, 3);
}

#[tokio::test]
async fn progress_upload_is_stored_apart_from_the_signed_file() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;
    let bob_id = app.contact(&owner, "Bob", "bob@example.com").await;
    let doc_id = app.document(&owner, "Lease", &[&alice_id, &bob_id]).await;

    let (_, first) = app.sign(&owner, &doc_id, &alice_id).await;
    let progress_url = first["signed_url"].as_str().unwrap().to_string();
    assert!(progress_url.contains("/exports/progress_Lease_"));

    let (_, last) = app.sign(&owner, &doc_id, &bob_id).await;
    let signed_url = last["signed_url"].as_str().unwrap();
    assert_ne!(signed_url, progress_url.as_str());

    // The finalized file replaced nothing, and the upload is still readable
    let (status, progress) = app.get_raw(&export_path(&progress_url), &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!progress.windows(10).any(|w| w == b"/ByteRange"));
    let (_, signed) = app.get_raw(&export_path(signed_url), &owner).await;
    assert!(signed.windows(10).any(|w| w == b"/ByteRange"));
}

#[tokio::test]
async fn viewer_contact_cannot_sign_or_complete() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let val = app.caller("u-val", "Val", "val@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;
    let val_id = app
        .contact_as(&owner, "Val", "val@example.com", "viewer")
        .await;
    let doc_id = app.document(&owner, "Watched", &[&alice_id, &val_id]).await;

    let (status, body) = app.sign(&val, &doc_id, &val_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    let (status, _) = app.sign(&owner, &doc_id, &val_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get(&format!("/documents/{}", doc_id), &owner).await;
    assert_eq!(body["document"]["is_completed"], false);
    assert_eq!(body["document"]["audit_trail"], json!([]));

    // Only the signer counts towards completion
    let (status, body) = app.sign(&owner, &doc_id, &alice_id).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["completed"], true);
    assert_eq!(body["required_count"], 1);
}

#[tokio::test]
async fn completed_document_rejects_further_signatures() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Solo", &[]).await;

    let (status, _) = app.sign(&owner, &doc_id, "u-owner").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.sign(&owner, &doc_id, "u-owner").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Document is already completed");
}

#[tokio::test]
async fn progress_mail_only_while_more_than_one_signature_is_outstanding() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let a = app.contact(&owner, "A", "a@example.com").await;
    let b = app.contact(&owner, "B", "b@example.com").await;
    let c = app.contact(&owner, "C", "c@example.com").await;
    let doc_id = app.document(&owner, "Three", &[&a, &b, &c]).await;

    // The creator may sign for each contact
    app.sign(&owner, &doc_id, &a).await;
    let sent = app.state.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to[0].email, "owner@example.com");
    assert_eq!(sent[0].subject, "A has signed Three");

    // Second-to-last signature: no mail
    app.sign(&owner, &doc_id, &b).await;
    assert_eq!(app.state.mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn concurrent_signers_are_both_recorded() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let alice = app.caller("u-alice", "Alice", "alice@example.com");
    let bob = app.caller("u-bob", "Bob", "bob@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;
    let bob_id = app.contact(&owner, "Bob", "bob@example.com").await;
    let doc_id = app.document(&owner, "Race", &[&alice_id, &bob_id]).await;

    let (first, second) = tokio::join!(
        app.sign(&alice, &doc_id, &alice_id),
        app.sign(&bob, &doc_id, &bob_id)
    );
    assert_eq!(first.0, StatusCode::OK, "{}", first.1);
    assert_eq!(second.0, StatusCode::OK, "{}", second.1);

    let (_, body) = app.get(&format!("/documents/{}", doc_id), &owner).await;
    assert_eq!(body["document"]["is_completed"], true);
    assert_eq!(body["document"]["audit_trail"].as_array().unwrap().len(), 2);
    assert_eq!(body["status"], "completed");
}

// ---------------------------------------------------------------------------
// Self-sign
// ---------------------------------------------------------------------------

#[tokio::test]
async fn self_sign_completes_on_first_save_and_reuses_contact() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");

    let create = json!({ "name": "Mine", "url": "/u/mine.pdf", "isSelfSign": true });
    let (status, first) = app.post("/documents/after-save", &owner, create.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = app.post("/documents/after-save", &owner, create).await;

    let signer = first["document"]["signers"][0].as_str().unwrap().to_string();
    assert_eq!(second["document"]["signers"][0], signer.as_str());
    assert_eq!(first["document"]["placeholders"].as_array().unwrap().len(), 1);

    let doc_id = first["document"]["id"].as_str().unwrap();
    let (status, body) = app.sign(&owner, doc_id, &signer).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["completed"], true);
    assert!(body["certificate_url"].is_string());
}

#[tokio::test]
async fn document_without_required_signers_completes_immediately() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Nobody", &[]).await;

    let (status, body) = app.sign(&owner, &doc_id, &owner.id).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["completed"], true);
    assert_eq!(body["required_count"], 0);

    let sent = app.state.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.len(), 1);
}

// ---------------------------------------------------------------------------
// Views and declines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_views_do_not_grow_viewers() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let alice = app.caller("u-alice", "Alice", "alice@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;
    let doc_id = app.document(&owner, "Viewed", &[&alice_id]).await;

    let view = json!({ "documentId": doc_id, "signerId": alice_id });
    let (status, first) = app.put("/documents/view-document", &alice, view.clone()).await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["first_view"], true);

    let (_, second) = app.put("/documents/view-document", &alice, view).await;
    assert_eq!(second["first_view"], false);
    assert_eq!(second["viewers"], 1);

    let (_, body) = app.get(&format!("/documents/{}", doc_id), &alice).await;
    assert_eq!(body["document"]["viewers"].as_array().unwrap().len(), 1);
    assert_eq!(body["document"]["audit_trail"][0]["Activity"], "Viewed");

    // Signing replaces the view slot
    let (_, signed) = app.sign(&alice, &doc_id, &alice_id).await;
    let trail = signed["document"]["audit_trail"].as_array().unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0]["Activity"], "Signed");
}

#[tokio::test]
async fn unknown_viewer_is_404() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Doc", &[]).await;
    let (status, _) = app
        .put(
            "/documents/view-document",
            &owner,
            json!({ "documentId": doc_id, "signerId": "c-missing" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn decline_stores_reason_and_blocks_signing() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let bob = app.caller("u-bob", "Bob", "bob@example.com");
    let bob_id = app.contact(&owner, "Bob", "bob@example.com").await;
    let doc_id = app.document(&owner, "Quote", &[&bob_id]).await;

    let (status, body) = app
        .put(
            "/documents/decline-document",
            &bob,
            json!({ "documentId": doc_id, "reason": "price disagreement" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["document"]["is_declined"], true);
    assert_eq!(body["document"]["decline_reason"], "price disagreement");
    assert_eq!(body["document"]["decline_by"]["objectId"], bob_id.as_str());
    assert_eq!(body["status"], "declined");

    let (status, _) = app.sign(&bob, &doc_id, &bob_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn completed_documents_can_still_be_declined() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Done", &[]).await;
    app.sign(&owner, &doc_id, &owner.id).await;

    let (status, body) = app
        .put(
            "/documents/decline-document",
            &owner,
            json!({ "documentId": doc_id, "reason": "changed my mind" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["is_completed"], true);
    assert_eq!(body["document"]["is_declined"], true);
}

// ---------------------------------------------------------------------------
// Forwarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forward_without_certificate_sends_signed_copy_only() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;
    let bob_id = app.contact(&owner, "Bob", "bob@example.com").await;
    let doc_id = app.document(&owner, "Partial", &[&alice_id, &bob_id]).await;
    app.sign(&owner, &doc_id, &alice_id).await;

    let (status, body) = app
        .post(
            "/documents/forward-doc",
            &owner,
            json!({
                "documentId": doc_id,
                "recipients": [{ "name": "Dana", "email": "dana@example.com" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["attachments"], 1);

    let sent = app.state.mailer.sent().await;
    let forwarded = sent.last().unwrap();
    assert_eq!(forwarded.to[0].email, "dana@example.com");
    assert_eq!(forwarded.attachments.len(), 1);
}

#[tokio::test]
async fn forward_completed_document_includes_certificate() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Final", &[]).await;
    app.sign(&owner, &doc_id, &owner.id).await;

    let (status, body) = app
        .post(
            "/documents/forward-doc",
            &owner,
            json!({
                "documentId": doc_id,
                "recipients": [{ "name": "Dana", "email": "dana@example.com" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["attachments"], 2);
}

#[tokio::test]
async fn forward_rejects_malformed_recipient_addresses() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Final", &[]).await;
    app.sign(&owner, &doc_id, &owner.id).await;
    let before = app.state.mailer.sent().await.len();

    for email in ["a@@b.com", "dana example.com", "dana@"] {
        let (status, body) = app
            .post(
                "/documents/forward-doc",
                &owner,
                json!({
                    "documentId": doc_id,
                    "recipients": [{ "name": "Dana", "email": email }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", email, body);
    }
    assert_eq!(app.state.mailer.sent().await.len(), before);
}

#[tokio::test]
async fn forward_before_any_signature_is_400() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let doc_id = app.document(&owner, "Empty", &[]).await;
    let (status, body) = app
        .post(
            "/documents/forward-doc",
            &owner,
            json!({
                "documentId": doc_id,
                "recipients": [{ "name": "Dana", "email": "dana@example.com" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Document has no signed file to forward");
}

// ---------------------------------------------------------------------------
// Validation and access
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_pdf_validates_required_fields() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");

    let (status, body) = app
        .post(
            "/documents/save-pdf",
            &owner,
            json!({ "documentId": "d1", "pdfFile": common::pdf_base64() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId is required");

    let (status, _) = app
        .post(
            "/documents/save-pdf",
            &owner,
            json!({ "documentId": "missing", "pdfFile": common::pdf_base64(), "userId": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_signer_on_create_is_404() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let (status, body) = app
        .post(
            "/documents/after-save",
            &owner,
            json!({ "name": "Doc", "url": "/u", "signers": ["c-nope"] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Signer not found: c-nope");
}

#[tokio::test]
async fn strangers_cannot_read_or_delete() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let eve = app.caller("u-eve", "Eve", "eve@example.com");
    let doc_id = app.document(&owner, "Private", &[]).await;
    let uri = format!("/documents/{}", doc_id);

    let (status, _) = app.get(&uri, &eve).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&eve), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_contact_email_is_409() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    app.contact(&owner, "Alice", "alice@example.com").await;
    let (status, _) = app
        .post(
            "/contacts",
            &owner,
            json!({ "name": "Alice Again", "email": "ALICE@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get("/contacts", &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contacts"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_filters_by_status_and_search() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let other = app.caller("u-other", "Other", "other@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;

    app.document(&owner, "Draft lease", &[]).await;
    app.document(&owner, "Pending lease", &[&alice_id]).await;
    let declined = app.document(&owner, "Declined quote", &[&alice_id]).await;
    app.put(
        "/documents/decline-document",
        &owner,
        json!({ "documentId": declined, "reason": "no" }),
    )
    .await;
    let done = app.document(&owner, "Finished quote", &[]).await;
    app.sign(&owner, &done, &owner.id).await;
    app.document(&other, "Someone else's lease", &[]).await;

    let report = |status: &'static str, search: Option<&'static str>| {
        json!({ "status": status, "search": search })
    };

    let (status, body) = app.post("/documents/get-report", &owner, report("all", None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["total"], 4);

    for (filter, expected) in [
        ("draft", "Draft lease"),
        ("in_progress", "Pending lease"),
        ("declined", "Declined quote"),
        ("completed", "Finished quote"),
    ] {
        let (_, body) = app.post("/documents/get-report", &owner, report(filter, None)).await;
        assert_eq!(body["total"], 1, "filter {}", filter);
        assert_eq!(body["documents"][0]["name"], expected);
        assert_eq!(body["documents"][0]["status"], filter);
    }

    let (_, body) = app
        .post("/documents/get-report", &owner, report("all", Some("lease")))
        .await;
    assert_eq!(body["total"], 2);

    let (_, body) = app
        .post("/documents/get-report", &owner, report("expired", None))
        .await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn report_expired_and_pagination() {
    let app = test_app().await;
    let owner = app.caller("u-owner", "Owner", "owner@example.com");
    let alice_id = app.contact(&owner, "Alice", "alice@example.com").await;

    let past = (chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339();
    let (status, _) = app
        .post(
            "/documents/after-save",
            &owner,
            json!({ "name": "Old", "url": "/u", "signers": [alice_id], "expiryDate": past }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    for i in 0..4 {
        app.document(&owner, &format!("Doc {}", i), &[]).await;
    }

    let (_, body) = app
        .post("/documents/get-report", &owner, json!({ "status": "expired" }))
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["documents"][0]["status"], "expired");

    let (_, body) = app
        .post(
            "/documents/get-report",
            &owner,
            json!({ "status": "all", "page": 2, "limit": 2 }),
        )
        .await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["documents"].as_array().unwrap().len(), 2);
}
