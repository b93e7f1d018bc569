//! AcroForm appearance refresh and flattening
//!
//! Flattening draws each widget's normal appearance into the page content
//! and removes the interactive form, so filled values can no longer be
//! edited after signing. Appearances are refreshed first so the flattened
//! output shows the current field values.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfError;
use crate::objects::{
    add_page_resource, append_page_content, decode_text_string, name_str, rect_of, resolve,
    resolve_dict, text_literal,
};
use crate::parser::PdfDocument;
use crate::stamp::StandardFont;

/// Annotation flag bit for hidden annotations
const FLAG_HIDDEN: i64 = 1 << 1;

/// Font size used when the default appearance asks for auto sizing
const AUTO_FONT_MAX: f64 = 12.0;

/// Terminal field with the attributes it inherits from its ancestors
#[derive(Debug)]
struct FieldNode {
    id: ObjectId,
    field_type: Option<Vec<u8>>,
    value: Option<Object>,
    default_appearance: Option<String>,
}

/// Walk the field tree below the AcroForm and collect terminal fields
fn collect_fields(doc: &Document) -> Result<Vec<FieldNode>, PdfError> {
    let catalog = doc.catalog()?;
    let Ok(acroform) = catalog.get(b"AcroForm") else {
        return Ok(Vec::new());
    };
    let acroform = resolve_dict(doc, acroform)?;
    let roots = match acroform.get(b"Fields") {
        Ok(fields) => resolve(doc, fields)?
            .as_array()
            .map_err(|_| PdfError::Structure("AcroForm Fields is not an array".into()))?
            .clone(),
        Err(_) => Vec::new(),
    };

    let mut out = Vec::new();
    let mut stack: Vec<(Object, Option<Vec<u8>>, Option<Object>, Option<String>)> = roots
        .into_iter()
        .rev()
        .map(|field| (field, None, None, None))
        .collect();

    while let Some((field, ft, v, da)) = stack.pop() {
        let Object::Reference(id) = field else {
            continue;
        };
        let dict = doc.get_dictionary(id)?;

        let ft = dict
            .get(b"FT")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| n.to_vec())
            .or(ft);
        let v = dict.get(b"V").ok().cloned().or(v);
        let da = dict
            .get(b"DA")
            .ok()
            .and_then(|o| o.as_str().ok())
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .or(da);

        let kids = dict
            .get(b"Kids")
            .ok()
            .and_then(|k| resolve(doc, k).ok())
            .and_then(|k| k.as_array().ok());

        match kids {
            Some(kids) if !kids.is_empty() => {
                for kid in kids.iter().rev() {
                    stack.push((kid.clone(), ft.clone(), v.clone(), da.clone()));
                }
            }
            _ => out.push(FieldNode {
                id,
                field_type: ft,
                value: v,
                default_appearance: da,
            }),
        }
    }

    Ok(out)
}

/// Font size requested by a default appearance string such as `/Helv 0 Tf 0 g`
fn font_size_from_da(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let tf = tokens.iter().position(|t| *t == "Tf")?;
    tokens.get(tf.checked_sub(1)?)?.parse().ok()
}

fn field_text(doc: &Document, value: &Object) -> Option<String> {
    match resolve(doc, value).ok()? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|i| field_text(doc, i)).collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}

/// Regenerate appearance streams from field values
///
/// Text and choice fields get a fresh single-line appearance. Buttons get
/// their appearance state synced to the value. Returns the number of
/// widgets updated.
pub fn refresh_field_appearances(pdf: &mut PdfDocument) -> Result<usize, PdfError> {
    let fields = collect_fields(pdf.doc())?;
    let doc = pdf.doc_mut();
    let mut font_id = None;
    let mut updated = 0;

    for field in fields {
        let Some(value) = field.value.as_ref() else {
            continue;
        };
        match field.field_type.as_deref() {
            Some(b"Tx") | Some(b"Ch") => {
                let Some(text) = field_text(doc, value) else {
                    continue;
                };
                let Some(rect) = doc
                    .get_dictionary(field.id)?
                    .get(b"Rect")
                    .ok()
                    .and_then(|r| rect_of(doc, r))
                else {
                    continue;
                };

                let font = *font_id.get_or_insert_with(|| StandardFont::Helvetica.add_to(doc));
                let size = field
                    .default_appearance
                    .as_deref()
                    .and_then(font_size_from_da)
                    .unwrap_or(0.0);
                let stream = text_appearance(&text, rect, size, font)?;
                let stream_id = doc.add_object(stream);

                doc.get_dictionary_mut(field.id)?
                    .set("AP", dictionary! { "N" => stream_id });
                updated += 1;
            }
            Some(b"Btn") => {
                let state = name_str(value).unwrap_or_else(|| "Off".to_string());
                let has_state = doc
                    .get_dictionary(field.id)?
                    .get(b"AP")
                    .ok()
                    .and_then(|ap| resolve_dict(doc, ap).ok())
                    .and_then(|ap| ap.get(b"N").ok())
                    .and_then(|n| resolve_dict(doc, n).ok())
                    .map(|n| n.has(state.as_bytes()))
                    .unwrap_or(false);
                let state = if has_state { state } else { "Off".to_string() };

                doc.get_dictionary_mut(field.id)?
                    .set("AS", Object::Name(state.into_bytes()));
                updated += 1;
            }
            _ => {}
        }
    }

    let acroform_ref = doc
        .catalog()?
        .get(b"AcroForm")
        .ok()
        .and_then(|o| o.as_reference().ok());
    match acroform_ref {
        Some(id) => {
            if let Ok(acroform) = doc.get_dictionary_mut(id) {
                acroform.remove(b"NeedAppearances");
            }
        }
        None => {
            if let Ok(Object::Dictionary(acroform)) = doc.catalog_mut()?.get_mut(b"AcroForm") {
                acroform.remove(b"NeedAppearances");
            }
        }
    }

    tracing::debug!(updated, "Refreshed form field appearances");
    Ok(updated)
}

fn text_appearance(
    text: &str,
    rect: [f64; 4],
    font_size: f64,
    font_id: ObjectId,
) -> Result<Stream, PdfError> {
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];
    let size = if font_size > 0.0 {
        font_size
    } else {
        (height * 0.7).clamp(4.0, AUTO_FONT_MAX)
    };
    let baseline = ((height - size) / 2.0).max(1.0) + size * 0.22;
    let font = StandardFont::Helvetica.resource_name();

    let content = Content {
        operations: vec![
            Operation::new("BMC", vec![Object::Name(b"Tx".to_vec())]),
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size as f32)],
            ),
            Operation::new("g", vec![0.into()]),
            Operation::new("Td", vec![2.into(), Object::Real(baseline as f32)]),
            Operation::new("Tj", vec![text_literal(text)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("EMC", vec![]),
        ],
    };
    let bytes = content
        .encode()
        .map_err(|e| PdfError::Structure(format!("content encoding failed: {}", e)))?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
            "Resources" => dictionary! {
                "Font" => dictionary! { font => font_id },
            },
        },
        bytes,
    ))
}

/// The normal appearance stream of a widget, honoring its appearance state
fn normal_appearance(doc: &Document, widget: &Dictionary) -> Option<ObjectId> {
    let ap = resolve_dict(doc, widget.get(b"AP").ok()?).ok()?;
    match ap.get(b"N").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(*id),
            Object::Dictionary(states) => pick_state(widget, states),
            _ => None,
        },
        Object::Dictionary(states) => pick_state(widget, states),
        _ => None,
    }
}

fn pick_state(widget: &Dictionary, states: &Dictionary) -> Option<ObjectId> {
    let state = widget.get(b"AS").ok()?.as_name().ok()?;
    states.get(state).ok()?.as_reference().ok()
}

/// Draw every widget appearance into its page and remove the form
///
/// Hidden widgets are dropped without drawing. Returns the number of
/// appearances drawn.
pub fn flatten_form(pdf: &mut PdfDocument) -> Result<usize, PdfError> {
    let pages: Vec<ObjectId> = pdf.doc().get_pages().into_values().collect();
    let doc = pdf.doc_mut();
    let mut drawn = 0;

    for page_id in pages {
        let annots = match doc.get_dictionary(page_id)?.get(b"Annots") {
            Ok(obj) => match resolve(doc, obj)?.as_array() {
                Ok(items) => items.clone(),
                Err(_) => continue,
            },
            Err(_) => continue,
        };

        let mut kept = Vec::with_capacity(annots.len());
        let mut content = Vec::new();

        for annot in annots {
            let Ok(dict) = resolve_dict(doc, &annot) else {
                continue;
            };
            let is_widget = dict
                .get(b"Subtype")
                .ok()
                .and_then(|s| s.as_name().ok())
                .map(|s| s == b"Widget")
                .unwrap_or(false);
            if !is_widget {
                kept.push(annot);
                continue;
            }

            let flags = dict.get(b"F").ok().and_then(|f| f.as_i64().ok()).unwrap_or(0);
            if flags & FLAG_HIDDEN != 0 {
                continue;
            }
            let Some(rect) = dict.get(b"Rect").ok().and_then(|r| rect_of(doc, r)) else {
                continue;
            };
            let Some(stream_id) = normal_appearance(doc, dict) else {
                continue;
            };

            let bbox = doc
                .get_object(stream_id)
                .ok()
                .and_then(|o| o.as_stream().ok())
                .and_then(|s| s.dict.get(b"BBox").ok())
                .and_then(|b| rect_of(doc, b))
                .unwrap_or([0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]]);

            if let Ok(Object::Stream(stream)) = doc.get_object_mut(stream_id) {
                stream.dict.set("Type", "XObject");
                stream.dict.set("Subtype", "Form");
            }

            let name = format!("QcFlat{}_{}", stream_id.0, stream_id.1);
            add_page_resource(
                doc,
                page_id,
                "XObject",
                &name,
                Object::Reference(stream_id),
            )?;

            let bbox_w = (bbox[2] - bbox[0]).max(f64::EPSILON);
            let bbox_h = (bbox[3] - bbox[1]).max(f64::EPSILON);
            let sx = (rect[2] - rect[0]) / bbox_w;
            let sy = (rect[3] - rect[1]) / bbox_h;
            let tx = rect[0] - bbox[0] * sx;
            let ty = rect[1] - bbox[1] * sy;
            content.extend_from_slice(
                format!(
                    "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/{} Do\nQ\n",
                    sx, sy, tx, ty, name
                )
                .as_bytes(),
            );
            drawn += 1;
        }

        if !content.is_empty() {
            append_page_content(doc, page_id, content)?;
        }
        let page = doc.get_dictionary_mut(page_id)?;
        if kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", Object::Array(kept));
        }
    }

    doc.catalog_mut()?.remove(b"AcroForm");
    tracing::debug!(drawn, "Flattened form fields");
    Ok(drawn)
}
