//! Document signing workflow
//!
//! This crate holds the signing workflow independent of transport and
//! storage: the audit trail ledger, viewer tracking, signer filtering and
//! completion detection, final PDF production, the Certificate of
//! Completion, and notification composition.

pub mod audit;
pub mod certificate;
pub mod error;
pub mod finalize;
pub mod notify;
pub mod signers;
pub mod viewers;
pub mod workflow;

pub use audit::{merge_entry, signed_count, MergeOutcome};
pub use certificate::{generate_certificate, render_certificate};
pub use error::CoreError;
pub use finalize::{finalize_pdf, signing_reason};
pub use notify::{Attachment, MailMessage, Recipient};
pub use signers::{required_signers, Completion};
pub use workflow::{apply_decline, apply_signature, apply_view, SignatureOutcome};
