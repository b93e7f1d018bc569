//! Viewer tracking, one record per signer

use chrono::{DateTime, Utc};
use shared_types::Viewer;

/// Upsert the view timestamp for `signer_id`
///
/// Returns true when the signer was seen for the first time.
pub fn record_view(viewers: &mut Vec<Viewer>, signer_id: &str, now: DateTime<Utc>) -> bool {
    match viewers.iter_mut().find(|v| v.signer_id == signer_id) {
        Some(viewer) => {
            viewer.viewed_at = now;
            false
        }
        None => {
            viewers.push(Viewer {
                signer_id: signer_id.to_string(),
                viewed_at: now,
            });
            true
        }
    }
}

/// When `signer_id` last viewed the document
pub fn viewed_at(viewers: &[Viewer], signer_id: &str) -> Option<DateTime<Utc>> {
    viewers
        .iter()
        .find(|v| v.signer_id == signer_id)
        .map(|v| v.viewed_at)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the list holds exactly one record per distinct signer
        #[test]
        fn one_record_per_signer(ids in prop::collection::vec("[a-d]", 0..32)) {
            let mut viewers = Vec::new();
            let now = Utc::now();
            for id in &ids {
                record_view(&mut viewers, id, now);
            }
            let distinct: std::collections::HashSet<&String> = ids.iter().collect();
            prop_assert_eq!(viewers.len(), distinct.len());
        }
    }
}
