use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    Parse(String),

    #[error("Malformed PDF structure: {0}")]
    Structure(String),

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Structure(e.to_string())
    }
}
