//! Data model shared by the signing workflow and the API server.

pub mod audit;
pub mod contact;
pub mod document;
pub mod file;

pub use audit::{Activity, ActorRef, AuditTrailEntry, UserDetails};
pub use contact::{Contact, UserRole};
pub use document::{Document, Placeholder, Viewer};
pub use file::FileRecord;
