//! Final PDF production for a fully signed document

use shared_crypto::SigningIdentity;
use shared_pdf::form::{flatten_form, refresh_field_appearances};
use shared_pdf::stamp::{stamp_text, TextStamp};
use shared_pdf::{PdfDocument, PdfSigner, SignatureRequest};
use shared_types::{Contact, UserDetails};

use crate::error::CoreError;

/// Watermark position, measured from the top-left corner of page 1
const WATERMARK_X: f64 = 10.0;
const WATERMARK_TOP_OFFSET: f64 = 15.0;
const WATERMARK_FONT_SIZE: f64 = 10.0;

pub fn watermark_text(document_id: &str) -> String {
    format!("QuickCash: documentId: {}", document_id)
}

/// Signature reason listing everyone who had to sign
///
/// Falls back to the acting user when the document has no required signers.
pub fn signing_reason(required: &[&Contact], actor: &UserDetails) -> String {
    if required.is_empty() {
        return actor.display_identity();
    }
    required
        .iter()
        .map(|c| format!("{} <{}>", c.name, c.email))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Watermark, flatten and digitally sign a completed document
///
/// Appearances are refreshed before flattening so the frozen page shows the
/// submitted field values.
pub fn finalize_pdf<I: SigningIdentity + ?Sized>(
    pdf_bytes: Vec<u8>,
    document_id: &str,
    reason: &str,
    identity: &I,
) -> Result<Vec<u8>, CoreError> {
    let mut pdf = PdfDocument::from_bytes(pdf_bytes)?;

    let watermark = TextStamp::new(
        watermark_text(document_id),
        WATERMARK_X,
        WATERMARK_TOP_OFFSET,
        WATERMARK_FONT_SIZE,
    );
    stamp_text(&mut pdf, 1, &watermark)?;

    let refreshed = refresh_field_appearances(&mut pdf)?;
    let flattened = flatten_form(&mut pdf)?;

    let request = SignatureRequest::new(reason, identity.signer_name());
    let signed = PdfSigner::new(&mut pdf, identity).sign(&request)?;

    tracing::info!(
        document_id,
        refreshed,
        flattened,
        size = signed.len(),
        "Finalized signed document"
    );
    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_crypto::KeystoreIdentity;
    use shared_pdf::testing::{sample_form_pdf, sample_pdf};
    use shared_types::UserRole;

    fn contact(name: &str, email: &str) -> Contact {
        Contact {
            id: name.to_lowercase(),
            name: name.into(),
            email: email.into(),
            phone: None,
            company: None,
            user_role: UserRole::Signer,
            created_by: "owner".into(),
            created_at: Utc::now(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn reason_lists_required_signers() {
        let alice = contact("Alice", "alice@example.com");
        let bob = contact("Bob", "bob@example.com");
        let actor = alice.user_details();
        assert_eq!(
            signing_reason(&[&alice, &bob], &actor),
            "Alice <alice@example.com>, Bob <bob@example.com>"
        );
    }

    #[test]
    fn reason_falls_back_to_actor() {
        let actor = contact("Solo", "solo@example.com").user_details();
        assert_eq!(signing_reason(&[], &actor), "Solo <solo@example.com>");
    }

    #[test]
    fn finalized_pdf_keeps_pages_and_carries_watermark_and_signature() {
        let identity = KeystoreIdentity::ephemeral("Finalizer").unwrap();
        let signed = finalize_pdf(sample_pdf(3), "doc-42", "Alice <a@x.io>", &identity).unwrap();

        assert!(contains(&signed, b"/ByteRange"));
        assert!(contains(&signed, b"adbe.pkcs7.detached"));

        let reloaded = PdfDocument::from_bytes(signed).unwrap();
        assert_eq!(reloaded.page_count(), 3);
        let page_id = reloaded.page_id(1).unwrap();
        let content = reloaded.doc().get_page_content(page_id).unwrap();
        assert!(contains(&content, b"QuickCash: documentId: doc-42"));
    }

    #[test]
    fn finalized_form_is_flattened() {
        let identity = KeystoreIdentity::ephemeral("Finalizer").unwrap();
        let signed = finalize_pdf(sample_form_pdf(), "doc-7", "reason", &identity).unwrap();

        let reloaded = PdfDocument::from_bytes(signed).unwrap();
        let catalog = reloaded.doc().catalog().unwrap();
        let acroform_id = catalog.get(b"AcroForm").unwrap().as_reference().unwrap();
        let fields = reloaded
            .doc()
            .get_dictionary(acroform_id)
            .unwrap()
            .get(b"Fields")
            .unwrap()
            .as_array()
            .unwrap()
            .len();
        // Only the signature field survives flattening
        assert_eq!(fields, 1);
    }

    #[test]
    fn garbage_input_is_a_pdf_error() {
        let identity = KeystoreIdentity::ephemeral("Finalizer").unwrap();
        let result = finalize_pdf(b"not a pdf".to_vec(), "doc", "reason", &identity);
        assert!(matches!(result, Err(CoreError::Pdf(_))));
    }
}
