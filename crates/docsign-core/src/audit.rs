//! Audit trail ledger
//!
//! The trail is keyed by actor: a new entry replaces the actor's existing
//! non-`Created` entry in place, so a signer's `Viewed` record turns into
//! their `Signed` record instead of growing the list.

use shared_types::{Activity, AuditTrailEntry};

/// What happened to the trail when an entry was merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The entry at this index was overwritten
    Replaced(usize),
    Appended,
}

/// Merge `entry` into `trail`, last write wins per actor
pub fn merge_entry(trail: &mut Vec<AuditTrailEntry>, entry: AuditTrailEntry) -> MergeOutcome {
    let existing = trail
        .iter()
        .position(|e| e.actor_id() == entry.actor_id() && e.activity != Activity::Created);

    match existing {
        Some(index) => {
            trail[index] = entry;
            MergeOutcome::Replaced(index)
        }
        None => {
            trail.push(entry);
            MergeOutcome::Appended
        }
    }
}

/// Number of `Signed` entries in the trail
pub fn signed_count(trail: &[AuditTrailEntry]) -> usize {
    trail
        .iter()
        .filter(|e| e.activity == Activity::Signed)
        .count()
}

/// Signed entries in trail order
pub fn signed_entries(trail: &[AuditTrailEntry]) -> impl Iterator<Item = &AuditTrailEntry> {
    trail.iter().filter(|e| e.activity == Activity::Signed)
}
