use shared_pdf::PdfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Invalid signature image: {0}")]
    SignatureImage(String),
}
