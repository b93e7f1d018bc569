//! Signer resolution filter and completion detection

use shared_types::{AuditTrailEntry, Contact};

use crate::audit::signed_count;

/// Contacts whose role requires a signature, in document order
pub fn required_signers(contacts: &[Contact]) -> Vec<&Contact> {
    contacts.iter().filter(|c| c.user_role.must_sign()).collect()
}

/// Signed versus required counts for a document
///
/// Completion compares raw counts. A signer who signs twice is merged into
/// one entry by the ledger, so the count only overshoots when entries are
/// written outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub required: usize,
    pub signed: usize,
}

impl Completion {
    pub fn evaluate(required: usize, trail: &[AuditTrailEntry]) -> Self {
        Self {
            required,
            signed: signed_count(trail),
        }
    }

    /// Zero required signers (self-sign) completes on the first save
    pub fn is_complete(&self) -> bool {
        self.required == 0 || self.signed == self.required
    }

    pub fn remaining(&self) -> usize {
        self.required.saturating_sub(self.signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_types::{UserDetails, UserRole};

    fn contact(id: &str, role: UserRole) -> Contact {
        Contact {
            id: id.into(),
            name: id.into(),
            email: format!("{}@example.com", id),
            phone: None,
            company: None,
            user_role: role,
            created_by: "owner".into(),
            created_at: Utc::now(),
        }
    }

    fn signed(id: &str) -> AuditTrailEntry {
        AuditTrailEntry::signed(
            UserDetails {
                object_id: id.into(),
                name: id.into(),
                email: format!("{}@example.com", id),
                phone: None,
                company: None,
            },
            None,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn viewers_do_not_count_toward_completion() {
        let contacts = vec![
            contact("a", UserRole::Signer),
            contact("b", UserRole::Viewer),
            contact("c", UserRole::Approver),
        ];
        let ids: Vec<&str> = required_signers(&contacts)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn zero_required_is_trivially_complete() {
        assert!(Completion::evaluate(0, &[]).is_complete());
    }

    #[test]
    fn two_signer_progression() {
        let mut trail = Vec::new();
        assert!(!Completion::evaluate(2, &trail).is_complete());

        trail.push(signed("alice"));
        let after_alice = Completion::evaluate(2, &trail);
        assert!(!after_alice.is_complete());
        assert_eq!(after_alice.remaining(), 1);

        trail.push(signed("bob"));
        assert!(Completion::evaluate(2, &trail).is_complete());
    }

    #[test]
    fn overshoot_is_not_complete() {
        let trail = vec![signed("a"), signed("b"), signed("c")];
        let completion = Completion::evaluate(2, &trail);
        assert!(!completion.is_complete());
        assert_eq!(completion.remaining(), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use shared_types::UserDetails;

    proptest! {
        /// Property: with N > 0 required, completion holds exactly at N signed entries
        #[test]
        fn complete_iff_counts_match(required in 1usize..8, signed in 0usize..10) {
            let trail: Vec<AuditTrailEntry> = (0..signed)
                .map(|i| {
                    AuditTrailEntry::signed(
                        UserDetails {
                            object_id: format!("s{}", i),
                            name: format!("Signer {}", i),
                            email: format!("s{}@example.com", i),
                            phone: None,
                            company: None,
                        },
                        None,
                        None,
                        Utc::now(),
                    )
                })
                .collect();
            let completion = Completion::evaluate(required, &trail);
            prop_assert_eq!(completion.is_complete(), signed == required);
        }
    }
}
