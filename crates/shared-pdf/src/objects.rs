//! Low-level helpers over the lopdf object graph

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfError;

/// Guard against reference cycles in malformed files
const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow references until a direct object is reached
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Result<&'a Object, PdfError> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id)?,
            _ => return Ok(obj),
        }
    }
    Err(PdfError::Structure("reference chain too deep".into()))
}

/// Resolve `obj` and require a dictionary
pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Dictionary, PdfError> {
    resolve(doc, obj)?
        .as_dict()
        .map_err(|_| PdfError::Structure("expected a dictionary".into()))
}

/// Numeric value of an Integer or Real
pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Read a rectangle as normalized `[llx, lly, urx, ury]`
pub fn rect_of(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let arr = resolve(doc, obj).ok()?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut v = [0.0; 4];
    for (slot, item) in v.iter_mut().zip(arr) {
        *slot = number(resolve(doc, item).ok()?)?;
    }
    Some([
        v[0].min(v[2]),
        v[1].min(v[3]),
        v[0].max(v[2]),
        v[1].max(v[3]),
    ])
}

/// The effective Resources of a page, inherited from the page tree when absent
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, PdfError> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc.get_dictionary(id)?;
        if let Ok(resources) = dict.get(b"Resources") {
            return Ok(resolve_dict(doc, resources)?.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(Dictionary::new())
}

/// Register `target` as `/category/name` in the page's own Resources
///
/// The inherited resources are copied onto the page first so the page keeps
/// every resource it could already see.
pub fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: Object,
) -> Result<(), PdfError> {
    let mut resources = page_resources(doc, page_id)?;

    let mut entries = match resources.get(category.as_bytes()) {
        Ok(obj) => resolve_dict(doc, obj)?.clone(),
        Err(_) => Dictionary::new(),
    };
    entries.set(name, target);
    resources.set(category, Object::Dictionary(entries));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Append drawing operators to a page
///
/// The existing content is wrapped in `q ... Q` so a graphics state left
/// dirty by the original producer cannot leak into the appended layer.
pub fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfError> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            // An indirect array of content streams
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    };

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    let added_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let mut contents = Vec::with_capacity(existing.len() + 3);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));
    contents.push(Object::Reference(added_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

fn win_ansi_char(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
}

/// Whether a WinAnsi-encoded standard font can show all of `text`
pub fn is_pdf_safe(text: &str) -> bool {
    text.chars().all(win_ansi_char)
}

/// Restrict text to what a WinAnsi-encoded standard font can show
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| if win_ansi_char(c) { c } else { '?' })
        .collect()
}

/// Literal string object holding `text` in single-byte encoding
pub fn text_literal(text: &str) -> Object {
    let bytes: Vec<u8> = pdf_safe(text).chars().map(|c| c as u32 as u8).collect();
    Object::String(bytes, lopdf::StringFormat::Literal)
}

/// Escaped body of a literal string, without the surrounding parentheses
pub fn escape_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in pdf_safe(text).chars() {
        let b = c as u32 as u8;
        if matches!(b, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise single-byte)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Decode a PDF name, which may be UTF-8
pub fn name_str(obj: &Object) -> Option<String> {
    obj.as_name()
        .ok()
        .map(|name| String::from_utf8_lossy(name).into_owned())
}
