//! Shared cryptography utilities
//!
//! This crate provides the signing identity used to certify PDFs:
//! PKCS#12 keystore loading (P-256 and RSA keys), self-signed development
//! certificates,
//! and CMS SignedData construction for detached PDF signatures.

pub mod cert;
pub mod cms;
mod der;
pub mod error;
pub mod keys;

pub use error::CryptoError;
pub use keys::{sha256, KeyAlgorithm, KeystoreIdentity, SigningIdentity};
