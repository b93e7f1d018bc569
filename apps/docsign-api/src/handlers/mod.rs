//! HTTP handlers for DocSign API

pub mod contacts;
pub mod documents;

use shared_types::{Contact, Document};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Reject empty required fields with a 400 naming the field
fn require(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Parse an address the way the mailer will, and require a dotted domain
fn validate_email(email: &str) -> ApiResult<()> {
    let email = email.trim();
    match email.parse::<lettre::Address>() {
        Ok(address) if address.domain().contains('.') => Ok(()),
        _ => Err(ApiError::Validation(format!("Invalid email address: {}", email))),
    }
}

/// The creator, or a signer whose email matches the caller's
fn ensure_participant(user: &AuthUser, document: &Document, signers: &[Contact]) -> ApiResult<()> {
    if document.is_owned_by(&user.id) || signers.iter().any(|c| user.has_email(&c.email)) {
        return Ok(());
    }
    Err(ApiError::Forbidden(
        "You do not have access to this document".into(),
    ))
}
