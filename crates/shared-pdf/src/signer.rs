//! Detached PKCS#7 signature injection into PDFs
//!
//! The document is saved with a zero-filled hex `/Contents` placeholder and
//! a wide `/ByteRange` placeholder. After saving, the byte range around the
//! placeholder is written, the covered bytes are hashed, and the CMS
//! SignedData is hex-encoded into the reserved space.

use chrono::Utc;
use lopdf::{dictionary, Dictionary, Object, ObjectId, StringFormat};
use sha2::{Digest, Sha256};
use shared_crypto::{cms::build_signed_data, SigningIdentity};

use crate::error::PdfError;
use crate::objects::text_literal;
use crate::parser::PdfDocument;

/// Bytes reserved for the CMS signature
pub const DEFAULT_PLACEHOLDER_SIZE: usize = 16000;

/// Widget flags: Print | Locked
const SIGNATURE_WIDGET_FLAGS: i64 = 4 | 128;

/// Placeholder value wide enough for any offset below 10 GB
const BYTE_RANGE_PLACEHOLDER: i64 = 9_999_999_999;

/// What the signature dictionary should state about the signing
#[derive(Debug, Clone)]
pub struct SignatureRequest {
    pub reason: String,
    pub signer_name: String,
    pub placeholder_size: usize,
}

impl SignatureRequest {
    pub fn new(reason: impl Into<String>, signer_name: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            signer_name: signer_name.into(),
            placeholder_size: DEFAULT_PLACEHOLDER_SIZE,
        }
    }

    pub fn with_placeholder_size(mut self, size: usize) -> Self {
        self.placeholder_size = size;
        self
    }
}

/// Handles PDF digital signature operations
pub struct PdfSigner<'a, I: SigningIdentity + ?Sized> {
    doc: &'a mut PdfDocument,
    identity: &'a I,
}

impl<'a, I: SigningIdentity + ?Sized> PdfSigner<'a, I> {
    pub fn new(doc: &'a mut PdfDocument, identity: &'a I) -> Self {
        Self { doc, identity }
    }

    /// Sign the document and return the signed bytes
    pub fn sign(&mut self, request: &SignatureRequest) -> Result<Vec<u8>, PdfError> {
        let sig_dict_id = self.create_signature_dictionary(request);
        let field_id = self.create_signature_field(sig_dict_id)?;
        self.add_to_acroform(field_id)?;
        self.add_to_page_annots(1, field_id)?;

        let mut pdf = self.doc.save_to_bytes()?;

        let (lt, gt_end) = find_placeholder(&pdf, request.placeholder_size).ok_or_else(|| {
            PdfError::Signature("signature placeholder not found in saved PDF".into())
        })?;
        let byte_range = [0, lt, gt_end, pdf.len() - gt_end];
        write_byte_range(&mut pdf, lt, &byte_range)?;

        // Hash everything except the hex string, delimiters included
        let mut hasher = Sha256::new();
        hasher.update(&pdf[..lt]);
        hasher.update(&pdf[gt_end..]);
        let digest: [u8; 32] = hasher.finalize().into();

        let cms = build_signed_data(self.identity, &digest, Utc::now());
        let sig_hex = hex::encode(&cms);
        let capacity = request.placeholder_size * 2;
        if sig_hex.len() > capacity {
            return Err(PdfError::Signature(format!(
                "signature too large: {} bytes (max {})",
                cms.len(),
                request.placeholder_size
            )));
        }
        pdf[lt + 1..lt + 1 + sig_hex.len()].copy_from_slice(sig_hex.as_bytes());

        tracing::info!(
            signer = %self.identity.signer_name(),
            size = pdf.len(),
            cms_len = cms.len(),
            "Signed PDF"
        );
        Ok(pdf)
    }

    fn create_signature_dictionary(&mut self, request: &SignatureRequest) -> ObjectId {
        let now = Utc::now().format("D:%Y%m%d%H%M%S+00'00'").to_string();

        let sig_dict = dictionary! {
            "Type" => "Sig",
            "Filter" => "Adobe.PPKLite",
            "SubFilter" => "adbe.pkcs7.detached",
            "ByteRange" => vec![
                0.into(),
                BYTE_RANGE_PLACEHOLDER.into(),
                BYTE_RANGE_PLACEHOLDER.into(),
                BYTE_RANGE_PLACEHOLDER.into(),
            ],
            "Contents" => Object::String(vec![0; request.placeholder_size], StringFormat::Hexadecimal),
            "Reason" => text_literal(&request.reason),
            "Name" => text_literal(&request.signer_name),
            "M" => Object::string_literal(now),
        };

        self.doc.doc_mut().add_object(sig_dict)
    }

    /// Invisible signature widget on the first page
    fn create_signature_field(&mut self, sig_dict_id: ObjectId) -> Result<ObjectId, PdfError> {
        let page_id = self.doc.page_id(1).ok_or(PdfError::PageNotFound(1))?;
        let existing = self.signature_field_count();

        let field = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Sig",
            "Rect" => vec![0.into(), 0.into(), 0.into(), 0.into()],
            "V" => sig_dict_id,
            "T" => Object::string_literal(format!("Signature{}", existing + 1)),
            "F" => SIGNATURE_WIDGET_FLAGS,
            "P" => page_id,
        };
        Ok(self.doc.doc_mut().add_object(field))
    }

    fn signature_field_count(&self) -> usize {
        self.doc
            .doc()
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| matches!(d.get(b"FT"), Ok(Object::Name(n)) if n == b"Sig"))
            .count()
    }

    /// Add the signature field to the AcroForm, creating it when absent
    fn add_to_acroform(&mut self, field_id: ObjectId) -> Result<(), PdfError> {
        let doc = self.doc.doc_mut();
        let existing = doc.catalog()?.get(b"AcroForm").ok().cloned();

        let acroform_id = match existing {
            Some(Object::Reference(id)) => id,
            Some(Object::Dictionary(dict)) => {
                // Promote a direct AcroForm so it can be edited in place
                let id = doc.add_object(dict);
                doc.catalog_mut()?.set("AcroForm", id);
                id
            }
            _ => {
                let id = doc.add_object(dictionary! { "Fields" => Vec::<Object>::new() });
                doc.catalog_mut()?.set("AcroForm", id);
                id
            }
        };

        let mut fields = match doc.get_dictionary(acroform_id)?.get(b"Fields") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => doc
                .get_object(*id)?
                .as_array()
                .map_err(|_| PdfError::Structure("AcroForm Fields is not an array".into()))?
                .clone(),
            _ => Vec::new(),
        };
        fields.push(Object::Reference(field_id));

        let acroform: &mut Dictionary = doc.get_dictionary_mut(acroform_id)?;
        acroform.set("Fields", Object::Array(fields));
        // SignaturesExist | AppendOnly
        acroform.set("SigFlags", 3);
        Ok(())
    }

    /// Add the signature widget to the page's Annots array
    fn add_to_page_annots(&mut self, page_num: u32, field_id: ObjectId) -> Result<(), PdfError> {
        let page_id = self
            .doc
            .page_id(page_num)
            .ok_or(PdfError::PageNotFound(page_num))?;
        let doc = self.doc.doc_mut();

        let annots_ref = match doc.get_dictionary(page_id)?.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };

        if let Some(annots_id) = annots_ref {
            if let Ok(Object::Array(items)) = doc.get_object_mut(annots_id) {
                items.push(Object::Reference(field_id));
                return Ok(());
            }
        }

        let page = doc.get_dictionary_mut(page_id)?;
        let mut annots = match page.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        annots.push(Object::Reference(field_id));
        page.set("Annots", Object::Array(annots));
        Ok(())
    }
}

/// Locate the zero-filled hex placeholder, returning the offsets of `<` and
/// one past `>`
///
/// Scans backwards from the end because the signature dictionary is the
/// newest object and sits near the end of the file.
fn find_placeholder(pdf: &[u8], placeholder_size: usize) -> Option<(usize, usize)> {
    let hex_len = placeholder_size * 2;
    if pdf.len() < hex_len + 2 {
        return None;
    }

    (hex_len + 1..pdf.len()).rev().find_map(|gt| {
        if pdf[gt] != b'>' || pdf[gt - hex_len - 1] != b'<' {
            return None;
        }
        let body = &pdf[gt - hex_len..gt];
        body.iter()
            .all(|&b| b == b'0')
            .then_some((gt - hex_len - 1, gt + 1))
    })
}

/// Overwrite the `/ByteRange` placeholder preceding the Contents string
fn write_byte_range(pdf: &mut [u8], before: usize, range: &[usize; 4]) -> Result<(), PdfError> {
    let marker = b"/ByteRange";
    let start = pdf[..before]
        .windows(marker.len())
        .rposition(|w| w == marker)
        .ok_or_else(|| PdfError::Signature("ByteRange marker not found".into()))?;

    let open = start
        + pdf[start..before]
            .iter()
            .position(|&b| b == b'[')
            .ok_or_else(|| PdfError::Signature("ByteRange array not found".into()))?;
    let close = open
        + pdf[open..before]
            .iter()
            .position(|&b| b == b']')
            .ok_or_else(|| PdfError::Signature("ByteRange array not closed".into()))?;

    let text = format!("{} {} {} {}", range[0], range[1], range[2], range[3]);
    let slot = &mut pdf[open + 1..close];
    if text.len() > slot.len() {
        return Err(PdfError::Signature("ByteRange does not fit placeholder".into()));
    }
    slot[..text.len()].copy_from_slice(text.as_bytes());
    slot[text.len()..].fill(b' ');
    Ok(())
}
