//! Document state transitions driven by the API

use chrono::{DateTime, Utc};
use shared_types::{Activity, ActorRef, AuditTrailEntry, Document, UserDetails};

use crate::audit::{merge_entry, MergeOutcome};
use crate::signers::Completion;
use crate::viewers::record_view;

/// Result of recording one signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub merge: MergeOutcome,
    pub completion: Completion,
    /// True only for the save that flipped the document to completed
    pub newly_completed: bool,
}

/// Merge a signature into the trail and update the completion state
///
/// Must run inside a single versioned update so concurrent signers see each
/// other's entries.
pub fn apply_signature(
    document: &mut Document,
    entry: AuditTrailEntry,
    required_count: usize,
    now: DateTime<Utc>,
) -> SignatureOutcome {
    let was_completed = document.is_completed;
    let merge = merge_entry(&mut document.audit_trail, entry);
    let completion = Completion::evaluate(required_count, &document.audit_trail);

    if completion.is_complete() && !was_completed {
        document.is_completed = true;
        document.completed_at = Some(now);
    }
    document.updated_at = now;

    SignatureOutcome {
        merge,
        completion,
        newly_completed: document.is_completed && !was_completed,
    }
}

/// Record a view by `viewer`
///
/// The first view also opens a `Viewed` slot in the audit trail, which the
/// viewer's signature later replaces. An actor that already has a slot keeps
/// it untouched so a view never downgrades a signature.
pub fn apply_view(
    document: &mut Document,
    viewer: &UserDetails,
    ip_address: Option<String>,
    now: DateTime<Utc>,
) -> bool {
    document.updated_at = now;
    let has_slot = document
        .audit_trail
        .iter()
        .any(|e| e.actor_id() == viewer.object_id && e.activity != Activity::Created);
    if !has_slot {
        document.audit_trail.push(AuditTrailEntry {
            activity: Activity::Viewed,
            ip_address,
            signed_on: None,
            signature: None,
            user_details: viewer.clone(),
            user_ptr: ActorRef {
                object_id: viewer.object_id.clone(),
            },
        });
    }
    record_view(&mut document.viewers, &viewer.object_id, now)
}

/// Mark the document declined
///
/// Completed documents may still be declined; the reason is stored verbatim.
pub fn apply_decline(
    document: &mut Document,
    reason: String,
    by: UserDetails,
    now: DateTime<Utc>,
) {
    document.is_declined = true;
    document.decline_reason = Some(reason);
    document.decline_by = Some(by);
    document.updated_at = now;
}
