//! Shared PDF handling utilities
//!
//! This crate provides the lopdf-based building blocks of the signing
//! pipeline: loading, text stamping, form appearance refresh and
//! flattening, PNG embedding, detached signature injection, and embedded
//! TrueType fonts for text outside the standard fonts' Latin-1 range.

pub mod error;
pub mod font;
pub mod form;
pub mod image;
pub mod objects;
pub mod parser;
pub mod signer;
pub mod stamp;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::PdfError;
pub use font::EmbeddedFont;
pub use parser::PdfDocument;
pub use signer::{PdfSigner, SignatureRequest, DEFAULT_PLACEHOLDER_SIZE};
