//! Small PDFs built in memory for unit tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

fn base_document(pages: u32) -> (Document, ObjectId, Vec<ObjectId>) {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut page_ids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", n))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    (doc, catalog_id, page_ids)
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("sample saves");
    out
}

/// A plain document with `pages` pages of text
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    save(base_document(pages).0)
}

/// One page with a filled text field (no appearance) and a checked checkbox
pub fn sample_form_pdf() -> Vec<u8> {
    let (mut doc, catalog_id, page_ids) = base_document(1);
    let page_id = page_ids[0];

    let on_stream = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        b"0 0 1 rg 0 0 12 12 re f".to_vec(),
    ));
    let off_stream = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        Vec::new(),
    ));

    let text_field = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("full_name"),
        "V" => Object::string_literal("Alice Example"),
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
        "Rect" => vec![100.into(), 500.into(), 300.into(), 520.into()],
        "P" => page_id,
    });
    let checkbox = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Yes",
        "Rect" => vec![100.into(), 450.into(), 112.into(), 462.into()],
        "AP" => dictionary! {
            "N" => dictionary! { "Yes" => on_stream, "Off" => off_stream },
        },
        "P" => page_id,
    });

    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![text_field.into(), checkbox.into()],
        "NeedAppearances" => true,
    });
    doc.get_dictionary_mut(catalog_id)
        .expect("catalog")
        .set("AcroForm", acroform);
    doc.get_dictionary_mut(page_id)
        .expect("page")
        .set("Annots", vec![Object::Reference(text_field), Object::Reference(checkbox)]);

    save(doc)
}

/// An opaque 4x4 RGBA PNG with a transparent corner
pub fn sample_png() -> Vec<u8> {
    let mut pixels = Vec::new();
    for i in 0..16u8 {
        let alpha = if i == 0 { 0 } else { 255 };
        pixels.extend([i * 10, 0, 255 - i * 10, alpha]);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, 4, 4);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("png header");
        writer.write_image_data(&pixels).expect("png data");
    }
    out
}
