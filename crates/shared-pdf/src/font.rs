//! Embedded TrueType fonts
//!
//! The standard Helvetica faces only reach Latin-1. Text beyond that is
//! shown through a Type0 font with Identity-H encoding: every glyph is a
//! two-byte glyph id into the embedded font program, and a ToUnicode map
//! keeps the text searchable and copyable.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{name_id, Face};

use crate::error::PdfError;
use crate::image::deflate;

/// Resource name of the embedded font on certificate pages
pub const UNICODE_FONT_RESOURCE: &str = "QcUni";

const FALLBACK_BASE_FONT: &str = "EmbeddedUnicode";

/// Entries per `beginbfchar` block; readers reject larger blocks
const BFCHAR_BLOCK: usize = 100;

/// A TrueType font program and the glyphs drawn with it so far
pub struct EmbeddedFont {
    data: Cow<'static, [u8]>,
    base_font: String,
    units_per_em: f64,
    /// Glyph id to the character it was drawn for and its advance
    used: BTreeMap<u16, (char, u16)>,
}

impl std::fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("base_font", &self.base_font)
            .field("size", &self.data.len())
            .field("used_glyphs", &self.used.len())
            .finish()
    }
}

impl EmbeddedFont {
    /// Load a font with TrueType outlines
    pub fn from_bytes(data: impl Into<Cow<'static, [u8]>>) -> Result<Self, PdfError> {
        let data = data.into();
        let (base_font, units_per_em) = {
            let face = Face::parse(&data, 0).map_err(|e| PdfError::Font(e.to_string()))?;
            if face.tables().glyf.is_none() {
                return Err(PdfError::Font(
                    "only fonts with TrueType outlines can be embedded".into(),
                ));
            }
            (postscript_name(&face), f64::from(face.units_per_em()))
        };
        Ok(Self {
            data,
            base_font,
            units_per_em,
            used: BTreeMap::new(),
        })
    }

    /// The upright regular font bundled with the binary
    ///
    /// Proportional faces are preferred over monospaced ones.
    pub fn bundled() -> Option<Self> {
        let candidates: Vec<&'static [u8]> = typst_assets::fonts()
            .filter(|data| {
                Face::parse(data, 0).is_ok_and(|face| {
                    face.tables().glyf.is_some() && !face.is_bold() && !face.is_italic()
                })
            })
            .collect();
        let proportional = candidates.iter().copied().find(|data| {
            Face::parse(data, 0).is_ok_and(|face| !face.is_monospaced())
        });
        let data = proportional.or_else(|| candidates.first().copied())?;
        Self::from_bytes(data).ok()
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    /// Whether every character of `text` has a glyph
    pub fn covers(&self, text: &str) -> bool {
        match self.face() {
            Some(face) => text.chars().all(|c| face.glyph_index(c).is_some()),
            None => false,
        }
    }

    /// Advance width of `text` in points
    pub fn width(&self, text: &str, font_size: f64) -> f64 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let units: f64 = text
            .chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|gid| face.glyph_hor_advance(gid))
            .map(f64::from)
            .sum();
        units * font_size / self.units_per_em
    }

    /// Hex string body for a `Tj` operand, recording the glyphs it uses
    ///
    /// Characters without a glyph map to glyph 0, which draws `.notdef`.
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        let Some(face) = Face::parse(&self.data, 0).ok() else {
            return Vec::new();
        };
        let mut hex = String::with_capacity(text.len() * 4);
        for c in text.chars() {
            match face.glyph_index(c) {
                Some(gid) => {
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                    self.used.entry(gid.0).or_insert((c, advance));
                    let _ = write!(hex, "{:04X}", gid.0);
                }
                None => hex.push_str("0000"),
            }
        }
        hex.into_bytes()
    }

    /// Whether any text has been encoded with this font
    pub fn is_used(&self) -> bool {
        !self.used.is_empty()
    }

    fn scaled(&self, units: impl Into<f64>) -> i64 {
        (units.into() * 1000.0 / self.units_per_em).round() as i64
    }

    /// Write the Type0 font and its descendants, returning the Type0 object
    pub fn add_to(&self, doc: &mut Document) -> Result<ObjectId, PdfError> {
        let face = self
            .face()
            .ok_or_else(|| PdfError::Font("font program no longer parses".into()))?;

        let compressed = deflate(&self.data).map_err(|e| PdfError::Font(e.to_string()))?;
        let mut font_file = Stream::new(
            dictionary! {
                "Length1" => self.data.len() as i64,
                "Filter" => "FlateDecode",
            },
            compressed,
        );
        font_file.allows_compression = false;
        let font_file_id = doc.add_object(font_file);

        let bbox = face.global_bounding_box();
        let mut flags = 32; // Nonsymbolic
        if face.is_monospaced() {
            flags |= 1;
        }
        let cap_height = face.capital_height().unwrap_or(face.ascender());
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.base_font.as_bytes().to_vec()),
            "Flags" => flags,
            "FontBBox" => vec![
                self.scaled(bbox.x_min).into(),
                self.scaled(bbox.y_min).into(),
                self.scaled(bbox.x_max).into(),
                self.scaled(bbox.y_max).into(),
            ],
            "ItalicAngle" => face.italic_angle().unwrap_or(0.0),
            "Ascent" => self.scaled(face.ascender()),
            "Descent" => self.scaled(face.descender()),
            "CapHeight" => self.scaled(cap_height),
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let widths: Vec<Object> = self
            .used
            .iter()
            .flat_map(|(&gid, &(_, advance))| {
                [
                    Object::Integer(i64::from(gid)),
                    Object::Array(vec![Object::Integer(self.scaled(advance))]),
                ]
            })
            .collect();
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(self.base_font.as_bytes().to_vec()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, self.to_unicode_cmap()));

        Ok(doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(self.base_font.as_bytes().to_vec()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        }))
    }

    fn to_unicode_cmap(&self) -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let entries: Vec<(u16, char)> = self.used.iter().map(|(&gid, &(c, _))| (gid, c)).collect();
        for block in entries.chunks(BFCHAR_BLOCK) {
            let _ = writeln!(cmap, "{} beginbfchar", block.len());
            for (gid, c) in block {
                let mut units = [0u16; 2];
                let utf16: String = c
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|unit| format!("{:04X}", unit))
                    .collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        cmap.into_bytes()
    }
}

fn postscript_name(face: &Face<'_>) -> String {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|name| name.to_string())
        .map(|name| name.chars().filter(|c| c.is_ascii_graphic()).collect::<String>())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE_FONT.to_string())
}
