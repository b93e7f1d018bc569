//! Text stamping with the standard Helvetica fonts

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId};

use crate::error::PdfError;
use crate::objects::{add_page_resource, append_page_content, text_literal};
use crate::parser::PdfDocument;

/// Standard 14 fonts available without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl StandardFont {
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    /// Resource name used when the font is registered on a page
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "QcHelv",
            StandardFont::HelveticaBold => "QcHelvB",
            StandardFont::HelveticaOblique => "QcHelvO",
        }
    }

    /// Add a WinAnsi font dictionary for this face to the document
    pub fn add_to(self, doc: &mut Document) -> ObjectId {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        })
    }
}

/// Approximate advance width of `text` in points
///
/// Uses coarse Helvetica glyph classes; good enough for centering and
/// fitting text into fixed boxes.
pub fn text_width(text: &str, font_size: f64, font: StandardFont) -> f64 {
    let em: f64 = text
        .chars()
        .map(|c| match c {
            ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.278,
            'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '/' | '-' => 0.333,
            'm' | 'M' | 'W' => 0.833,
            'w' => 0.722,
            '@' => 1.015,
            'A'..='Z' => 0.667,
            '0'..='9' => 0.556,
            _ => 0.53,
        })
        .sum();
    let weight = if font == StandardFont::HelveticaBold {
        1.06
    } else {
        1.0
    };
    em * font_size * weight
}

/// A single line of text placed relative to the top of a page
#[derive(Debug, Clone)]
pub struct TextStamp {
    pub text: String,
    pub x: f64,
    /// Distance from the top edge of the page to the baseline
    pub top_offset: f64,
    pub font_size: f64,
}

impl TextStamp {
    pub fn new(text: impl Into<String>, x: f64, top_offset: f64, font_size: f64) -> Self {
        Self {
            text: text.into(),
            x,
            top_offset,
            font_size,
        }
    }
}

/// Draw `stamp` on `page` (1-indexed) above the existing content
pub fn stamp_text(pdf: &mut PdfDocument, page: u32, stamp: &TextStamp) -> Result<(), PdfError> {
    let page_id = pdf.page_id(page).ok_or(PdfError::PageNotFound(page))?;
    let [_, y0, _, height] = pdf.page_dimensions(page)?;
    let baseline = y0 + height - stamp.top_offset;

    let font = StandardFont::Helvetica;
    let doc = pdf.doc_mut();
    let font_id = font.add_to(doc);
    add_page_resource(
        doc,
        page_id,
        "Font",
        font.resource_name(),
        Object::Reference(font_id),
    )?;

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font.resource_name().as_bytes().to_vec()),
                    Object::Real(stamp.font_size as f32),
                ],
            ),
            Operation::new("g", vec![Object::Real(0.0)]),
            Operation::new(
                "Td",
                vec![Object::Real(stamp.x as f32), Object::Real(baseline as f32)],
            ),
            Operation::new("Tj", vec![text_literal(&stamp.text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let bytes = content
        .encode()
        .map_err(|e| PdfError::Structure(format!("content encoding failed: {}", e)))?;
    append_page_content(doc, page_id, bytes)?;

    tracing::debug!(page, text = %stamp.text, "Stamped text");
    Ok(())
}
