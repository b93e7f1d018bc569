//! PNG images as PDF image XObjects

use std::io::{Cursor, Write};

use flate2::{write::ZlibEncoder, Compression};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfError;

/// An image XObject added to a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfImage {
    pub object_id: ObjectId,
    pub width: u32,
    pub height: u32,
}

impl PdfImage {
    /// Scale to fit inside `max_w` x `max_h`, keeping the aspect ratio
    pub fn fit_within(&self, max_w: f64, max_h: f64) -> (f64, f64) {
        if self.width == 0 || self.height == 0 {
            return (0.0, 0.0);
        }
        let scale = (max_w / self.width as f64).min(max_h / self.height as f64);
        (self.width as f64 * scale, self.height as f64 * scale)
    }
}

pub(crate) fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    pixels: &[u8],
    smask: Option<ObjectId>,
) -> Result<Stream, PdfError> {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if let Some(id) = smask {
        dict.set("SMask", id);
    }
    let pixels = deflate(pixels).map_err(|e| PdfError::Image(e.to_string()))?;
    let mut stream = Stream::new(dict, pixels);
    // Already deflated, never compress twice
    stream.allows_compression = false;
    Ok(stream)
}

/// Decode a PNG and add it to `doc` as an image XObject
///
/// Palette and low bit depth images are expanded to 8-bit channels. An
/// alpha channel becomes a soft mask when any pixel is not fully opaque.
pub fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<PdfImage, PdfError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfError::Image(format!("invalid PNG: {}", e)))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| PdfError::Image(format!("invalid PNG data: {}", e)))?;
    let data = &buf[..frame.buffer_size()];

    let (channels, color_space, has_alpha) = match frame.color_type {
        png::ColorType::Grayscale => (1, "DeviceGray", false),
        png::ColorType::GrayscaleAlpha => (2, "DeviceGray", true),
        png::ColorType::Rgb => (3, "DeviceRGB", false),
        png::ColorType::Rgba => (4, "DeviceRGB", true),
        png::ColorType::Indexed => {
            return Err(PdfError::Image("palette was not expanded".into()));
        }
    };

    let (color, alpha): (Vec<u8>, Vec<u8>) = if has_alpha {
        let color_channels = channels - 1;
        let mut color = Vec::with_capacity(data.len() / channels * color_channels);
        let mut alpha = Vec::with_capacity(data.len() / channels);
        for pixel in data.chunks_exact(channels) {
            color.extend_from_slice(&pixel[..color_channels]);
            alpha.push(pixel[color_channels]);
        }
        (color, alpha)
    } else {
        (data.to_vec(), Vec::new())
    };

    let smask = if alpha.iter().any(|&a| a != u8::MAX) {
        let mask = image_stream(frame.width, frame.height, "DeviceGray", &alpha, None)?;
        Some(doc.add_object(mask))
    } else {
        None
    };

    let image = image_stream(frame.width, frame.height, color_space, &color, smask)?;
    let object_id = doc.add_object(image);

    Ok(PdfImage {
        object_id,
        width: frame.width,
        height: frame.height,
    })
}

/// Operators drawing an image registered as `/name` at `x, y` with size `w x h`
pub fn draw_image_ops(name: &str, x: f64, y: f64, w: f64, h: f64) -> String {
    format!(
        "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{} Do\nQ\n",
        w, h, x, y, name
    )
}
