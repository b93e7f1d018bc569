//! Certificate of Completion rendering
//!
//! A US Letter summary of a completed document: bordered header with an
//! optional logo, document metadata, then one block per signature with the
//! signer's identity, timestamps, IP address and signature image. Signer
//! blocks paginate, three on the first page and five on each continuation
//! page. The rendered certificate is signed like the document itself.

use std::ops::Range;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use lopdf::{dictionary, Dictionary, Document as LoDocument, Object, ObjectId, Stream};
use shared_crypto::SigningIdentity;
use shared_pdf::font::UNICODE_FONT_RESOURCE;
use shared_pdf::image::{draw_image_ops, embed_png, PdfImage};
use shared_pdf::objects::{escape_literal, is_pdf_safe};
use shared_pdf::stamp::{text_width, StandardFont};
use shared_pdf::{EmbeddedFont, PdfDocument, PdfSigner, SignatureRequest};
use shared_types::{AuditTrailEntry, Document};

use crate::audit::signed_entries;
use crate::error::CoreError;
use crate::viewers::viewed_at;

pub const FIRST_PAGE_BLOCKS: usize = 3;
pub const CONTINUATION_BLOCKS: usize = 5;

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN: f64 = 50.0;
const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

const BLOCK_HEIGHT: f64 = 125.0;
const FIRST_PAGE_BLOCKS_TOP: f64 = 485.0;
const CONTINUATION_BLOCKS_TOP: f64 = 680.0;

const SIGNATURE_BOX_X: f64 = 390.0;
const SIGNATURE_BOX_WIDTH: f64 = 160.0;
const SIGNATURE_BOX_HEIGHT: f64 = 70.0;

const ACCENT: (f64, f64, f64) = (0.11, 0.23, 0.45);

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Split `signer_count` blocks into per-page ranges
pub fn page_plan(signer_count: usize) -> Vec<Range<usize>> {
    let first = signer_count.min(FIRST_PAGE_BLOCKS);
    let mut pages = vec![0..first];
    let mut start = first;
    while start < signer_count {
        let end = (start + CONTINUATION_BLOCKS).min(signer_count);
        pages.push(start..end);
        start = end;
    }
    pages
}

/// Decode a signature captured as a data URL or bare base64 PNG
pub fn decode_signature_image(value: &str) -> Result<Vec<u8>, CoreError> {
    let payload = match value.find("base64,") {
        Some(index) => &value[index + "base64,".len()..],
        None => value,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| CoreError::SignatureImage(e.to_string()))
}

/// Chooses between Helvetica and the embedded Unicode font per string
///
/// Text Helvetica can encode stays in Helvetica. Anything else is drawn with
/// the bundled TrueType font, loaded on first need and embedded once per
/// certificate. Characters that font lacks fall back to `?` in Helvetica.
#[derive(Default)]
struct Typesetter {
    unicode: Option<EmbeddedFont>,
    load_attempted: bool,
}

impl Typesetter {
    fn unicode_for(&mut self, text: &str) -> Option<&mut EmbeddedFont> {
        if is_pdf_safe(text) {
            return None;
        }
        if !self.load_attempted {
            self.load_attempted = true;
            self.unicode = EmbeddedFont::bundled();
            if self.unicode.is_none() {
                tracing::warn!("No bundled Unicode font, non-Latin text is replaced");
            }
        }
        self.unicode.as_mut().filter(|font| font.covers(text))
    }

    fn width(&mut self, text: &str, font: StandardFont, size: f64) -> f64 {
        match self.unicode_for(text) {
            Some(unicode) => unicode.width(text, size),
            None => text_width(text, size, font),
        }
    }

    /// The Unicode font, when some text was drawn with it
    fn embedded(&self) -> Option<&EmbeddedFont> {
        self.unicode.as_ref().filter(|font| font.is_used())
    }
}

/// Shorten `text` with an ellipsis until it fits `max_width`
fn fit_text(
    typesetter: &mut Typesetter,
    text: &str,
    font: StandardFont,
    size: f64,
    max_width: f64,
) -> String {
    if typesetter.width(text, font, size) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if typesetter.width(&candidate, font, size) <= max_width {
            return candidate;
        }
    }
    "...".to_string()
}

/// Drawing operators and image resources for one page
struct PageCanvas<'a> {
    content: Vec<u8>,
    images: Vec<(String, ObjectId)>,
    typesetter: &'a mut Typesetter,
}

impl<'a> PageCanvas<'a> {
    fn new(typesetter: &'a mut Typesetter) -> Self {
        Self {
            content: Vec::new(),
            images: Vec::new(),
            typesetter,
        }
    }

    fn ops(&mut self, ops: &str) {
        self.content.extend_from_slice(ops.as_bytes());
    }

    fn text(&mut self, font: StandardFont, size: f64, x: f64, y: f64, text: &str) {
        let glyphs = self
            .typesetter
            .unicode_for(text)
            .map(|unicode| unicode.encode(text));
        match glyphs {
            Some(hex) => {
                self.ops(&format!(
                    "BT\n/{} {:.1} Tf\n{:.2} {:.2} Td\n<",
                    UNICODE_FONT_RESOURCE, size, x, y
                ));
                self.content.extend(hex);
                self.ops("> Tj\nET\n");
            }
            None => {
                self.ops(&format!(
                    "BT\n/{} {:.1} Tf\n{:.2} {:.2} Td\n(",
                    font.resource_name(),
                    size,
                    x,
                    y
                ));
                self.content.extend(escape_literal(text));
                self.ops(") Tj\nET\n");
            }
        }
    }

    fn fit(&mut self, text: &str, font: StandardFont, size: f64, max_width: f64) -> String {
        fit_text(self.typesetter, text, font, size, max_width)
    }

    fn text_centered(&mut self, font: StandardFont, size: f64, y: f64, text: &str) {
        let x = (PAGE_WIDTH - self.typesetter.width(text, font, size)) / 2.0;
        self.text(font, size, x.max(MARGIN), y, text);
    }

    fn gray(&mut self, level: f64) {
        self.ops(&format!("{:.2} g\n", level));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, line_width: f64) {
        let (r, g, b) = ACCENT;
        self.ops(&format!(
            "q\n{:.2} {:.2} {:.2} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re S\nQ\n",
            r, g, b, line_width, x, y, w, h
        ));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, gray: f64) {
        self.ops(&format!(
            "q\n{:.2} g\n{:.2} {:.2} {:.2} {:.2} re f\nQ\n",
            gray, x, y, w, h
        ));
    }

    fn rule(&mut self, y: f64) {
        let (r, g, b) = ACCENT;
        self.ops(&format!(
            "q\n{:.2} {:.2} {:.2} RG\n0.75 w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
            r,
            g,
            b,
            MARGIN,
            y,
            PAGE_WIDTH - MARGIN,
            y
        ));
    }

    fn image(&mut self, image: &PdfImage, x: f64, y: f64, w: f64, h: f64) {
        let name = format!("Im{}", self.images.len() + 1);
        self.ops(&draw_image_ops(&name, x, y, w, h));
        self.images.push((name, image.object_id));
    }
}

fn draw_border(canvas: &mut PageCanvas) {
    canvas.stroke_rect(20.0, 20.0, PAGE_WIDTH - 40.0, PAGE_HEIGHT - 40.0, 2.5);
    canvas.stroke_rect(27.0, 27.0, PAGE_WIDTH - 54.0, PAGE_HEIGHT - 54.0, 0.75);
}

fn draw_footer(canvas: &mut PageCanvas, document_id: &str, page: usize, total: usize) {
    canvas.gray(0.45);
    canvas.text_centered(
        StandardFont::Helvetica,
        8.0,
        38.0,
        &format!(
            "Certificate for document {} - Page {} of {}",
            document_id, page, total
        ),
    );
    canvas.gray(0.0);
}

fn draw_header(canvas: &mut PageCanvas, logo: Option<&PdfImage>) {
    if let Some(logo) = logo {
        let (w, h) = logo.fit_within(120.0, 40.0);
        canvas.image(logo, MARGIN, PAGE_HEIGHT - 45.0 - h, w, h);
    }
    canvas.text_centered(
        StandardFont::HelveticaBold,
        22.0,
        PAGE_HEIGHT - 95.0,
        "Certificate of Completion",
    );
    canvas.gray(0.4);
    canvas.text_centered(
        StandardFont::HelveticaOblique,
        10.0,
        PAGE_HEIGHT - 110.0,
        "Digitally signed record of document execution",
    );
    canvas.gray(0.0);
    canvas.rule(PAGE_HEIGHT - 120.0);
}

fn draw_metadata(
    canvas: &mut PageCanvas,
    document: &Document,
    completed_at: DateTime<Utc>,
    signer_count: usize,
) {
    let rows = [
        ("Document ID", document.id.clone()),
        ("Document Name", document.name.clone()),
        (
            "Organization",
            document.organization.clone().unwrap_or_else(|| "-".into()),
        ),
        ("Created On", format_date(Some(document.created_at))),
        ("Completed On", format_date(Some(completed_at))),
        ("Signers", signer_count.to_string()),
        ("Originator", document.created_by.display_identity()),
        (
            "Originator IP",
            document.origin_ip.clone().unwrap_or_else(|| "-".into()),
        ),
    ];

    let mut y = 655.0;
    for (label, value) in rows {
        canvas.text(StandardFont::HelveticaBold, 10.0, MARGIN, y, label);
        let value = canvas.fit(&value, StandardFont::Helvetica, 10.0, CONTENT_WIDTH - 130.0);
        canvas.text(StandardFont::Helvetica, 10.0, MARGIN + 130.0, y, &value);
        y -= 17.0;
    }

    canvas.text(
        StandardFont::HelveticaBold,
        13.0,
        MARGIN,
        FIRST_PAGE_BLOCKS_TOP + 20.0,
        "Signer Activity",
    );
    canvas.rule(FIRST_PAGE_BLOCKS_TOP + 13.0);
}

fn draw_signer_block(
    canvas: &mut PageCanvas,
    top: f64,
    entry: &AuditTrailEntry,
    viewed: Option<DateTime<Utc>>,
    signature: Option<&PdfImage>,
) {
    let user = &entry.user_details;
    canvas.fill_rect(MARGIN, top - 115.0, CONTENT_WIDTH, 110.0, 0.96);
    canvas.gray(0.0);

    let text_width_max = SIGNATURE_BOX_X - MARGIN - 20.0;
    let name = canvas.fit(&user.name, StandardFont::HelveticaBold, 12.0, text_width_max);
    canvas.text(StandardFont::HelveticaBold, 12.0, MARGIN + 10.0, top - 20.0, &name);

    let rows = [
        format!("Email: {}", user.email),
        format!("Viewed on: {}", format_date(viewed)),
        format!("Signed on: {}", format_date(entry.signed_on)),
        format!(
            "IP address: {}",
            entry.ip_address.as_deref().unwrap_or("-")
        ),
        format!("Signer ID: {}", user.object_id),
    ];
    let mut y = top - 38.0;
    for row in rows {
        let row = canvas.fit(&row, StandardFont::Helvetica, 9.5, text_width_max);
        canvas.text(StandardFont::Helvetica, 9.5, MARGIN + 10.0, y, &row);
        y -= 15.0;
    }

    let box_y = top - 100.0;
    canvas.gray(0.4);
    canvas.text(StandardFont::Helvetica, 8.0, SIGNATURE_BOX_X, top - 24.0, "Signature");
    canvas.gray(0.0);
    canvas.stroke_rect(
        SIGNATURE_BOX_X,
        box_y,
        SIGNATURE_BOX_WIDTH,
        SIGNATURE_BOX_HEIGHT,
        0.5,
    );

    match signature {
        Some(image) => {
            let (w, h) = image.fit_within(SIGNATURE_BOX_WIDTH - 10.0, SIGNATURE_BOX_HEIGHT - 10.0);
            let x = SIGNATURE_BOX_X + (SIGNATURE_BOX_WIDTH - w) / 2.0;
            let y = box_y + (SIGNATURE_BOX_HEIGHT - h) / 2.0;
            canvas.image(image, x, y, w, h);
        }
        None => {
            canvas.gray(0.5);
            canvas.text(
                StandardFont::HelveticaOblique,
                9.0,
                SIGNATURE_BOX_X + 30.0,
                box_y + SIGNATURE_BOX_HEIGHT / 2.0 - 3.0,
                "Signature unavailable",
            );
            canvas.gray(0.0);
        }
    }
}

/// Embed a signer's image, tolerating missing or undecodable data
fn embed_signature(doc: &mut LoDocument, entry: &AuditTrailEntry) -> Option<PdfImage> {
    let value = entry.signature.as_deref()?;
    let embedded = decode_signature_image(value)
        .and_then(|bytes| embed_png(doc, &bytes).map_err(CoreError::from));
    match embedded {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(signer = %entry.actor_id(), error = %e, "Skipping signature image");
            None
        }
    }
}

/// Render the unsigned certificate for `document`
pub fn render_certificate(
    document: &Document,
    completed_at: DateTime<Utc>,
    logo: Option<&[u8]>,
) -> Result<Vec<u8>, CoreError> {
    let mut doc = LoDocument::with_version("1.7");
    let pages_id = doc.new_object_id();
    // Filled in once the pages show which fonts they used
    let fonts_id = doc.new_object_id();
    let mut typesetter = Typesetter::default();

    let logo = logo.and_then(|bytes| match embed_png(&mut doc, bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping certificate logo");
            None
        }
    });

    let entries: Vec<&AuditTrailEntry> = signed_entries(&document.audit_trail).collect();
    let signatures: Vec<Option<PdfImage>> = entries
        .iter()
        .map(|entry| embed_signature(&mut doc, entry))
        .collect();

    let plan = page_plan(entries.len());
    let total = plan.len();
    let mut page_ids = Vec::with_capacity(total);

    for (page_index, range) in plan.into_iter().enumerate() {
        let mut canvas = PageCanvas::new(&mut typesetter);
        draw_border(&mut canvas);

        let blocks_top = if page_index == 0 {
            draw_header(&mut canvas, logo.as_ref());
            draw_metadata(&mut canvas, document, completed_at, entries.len());
            FIRST_PAGE_BLOCKS_TOP
        } else {
            canvas.text_centered(
                StandardFont::HelveticaBold,
                16.0,
                PAGE_HEIGHT - 70.0,
                "Certificate of Completion (continued)",
            );
            canvas.rule(PAGE_HEIGHT - 85.0);
            CONTINUATION_BLOCKS_TOP
        };

        for (slot, index) in range.enumerate() {
            let entry = entries[index];
            let top = blocks_top - slot as f64 * BLOCK_HEIGHT;
            let viewed = viewed_at(&document.viewers, entry.actor_id());
            draw_signer_block(&mut canvas, top, entry, viewed, signatures[index].as_ref());
        }

        draw_footer(&mut canvas, &document.id, page_index + 1, total);

        let mut xobjects = Dictionary::new();
        for (name, id) in &canvas.images {
            xobjects.set(name.as_str(), *id);
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), canvas.content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => fonts_id,
                "XObject" => xobjects,
            },
        });
        page_ids.push(page_id);
    }

    let mut fonts = Dictionary::new();
    for font in [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
    ] {
        let id = font.add_to(&mut doc);
        fonts.set(font.resource_name(), id);
    }
    if let Some(unicode) = typesetter.embedded() {
        let id = unicode.add_to(&mut doc)?;
        fonts.set(UNICODE_FONT_RESOURCE, id);
    }
    doc.objects.insert(fonts_id, Object::Dictionary(fonts));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => total as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Certificate of Completion"),
        "Subject" => Object::string_literal(document.id.as_str()),
    });
    doc.trailer.set("Info", info_id);

    let mut pdf = PdfDocument::from_document(doc);
    Ok(pdf.save_to_bytes()?)
}

/// Render and digitally sign the certificate
pub fn generate_certificate<I: SigningIdentity + ?Sized>(
    document: &Document,
    completed_at: DateTime<Utc>,
    logo: Option<&[u8]>,
    identity: &I,
) -> Result<Vec<u8>, CoreError> {
    let rendered = render_certificate(document, completed_at, logo)?;
    let mut pdf = PdfDocument::from_bytes(rendered)?;

    let reason = format!("Certificate of Completion for document {}", document.id);
    let request = SignatureRequest::new(reason, identity.signer_name());
    let signed = PdfSigner::new(&mut pdf, identity).sign(&request)?;

    tracing::info!(
        document_id = %document.id,
        pages = pdf.page_count(),
        size = signed.len(),
        "Generated completion certificate"
    );
    Ok(signed)
}
