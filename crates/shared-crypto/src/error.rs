use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Keystore error: {0}")]
    Keystore(String),

    #[error("Invalid keystore password")]
    BadPassword,

    #[error("Keystore holds no {0}")]
    MissingEntry(&'static str),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("Certificate does not match private key")]
    KeyMismatch,
}
