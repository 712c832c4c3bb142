//! Permission checks for scheduler operations

use crate::error::{Error, Result};
use crate::models::{Identity, Outage, SubmitterId};

/// Actions that can be performed against the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolAction {
    // Selection
    OverrideSelection,

    // Outages
    RequestOwnOutage,
    ImposeOutage,
    DeleteOwnOutage,
    DeleteAnyOutage,

    // Pool
    ViewHidden,
    RemoveSubmission,
}

/// Permission matrix for member/admin identities
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if an identity may perform an action
    pub fn can_perform(identity: &Identity, action: PoolAction) -> bool {
        match action {
            // Members manage their own outages
            PoolAction::RequestOwnOutage => true,
            PoolAction::DeleteOwnOutage => true,

            // Admin only
            PoolAction::OverrideSelection => identity.is_admin,
            PoolAction::ImposeOutage => identity.is_admin,
            PoolAction::DeleteAnyOutage => identity.is_admin,
            PoolAction::ViewHidden => identity.is_admin,
            PoolAction::RemoveSubmission => identity.is_admin,
        }
    }

    /// Fail with `Forbidden` unless the action is allowed
    pub fn require(identity: &Identity, action: PoolAction) -> Result<()> {
        if Self::can_perform(identity, action) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "{} may not perform {:?}",
                identity.user_id, action
            )))
        }
    }

    /// Check if an identity may create an outage for `submitter_id`
    pub fn can_create_outage(identity: &Identity, submitter_id: &SubmitterId, imposed: bool) -> bool {
        if imposed {
            return Self::can_perform(identity, PoolAction::ImposeOutage);
        }

        // Self-requests only ever come from the submitter
        identity.is(submitter_id) && Self::can_perform(identity, PoolAction::RequestOwnOutage)
    }

    /// Check if an identity may delete an existing outage
    pub fn can_delete_outage(identity: &Identity, outage: &Outage) -> bool {
        if Self::can_perform(identity, PoolAction::DeleteAnyOutage) {
            return true;
        }

        !outage.imposed_by_admin
            && identity.is(&outage.submitter_id)
            && Self::can_perform(identity, PoolAction::DeleteOwnOutage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOutage;
    use chrono::NaiveDate;

    fn outage(owner: &str, imposed: bool) -> Outage {
        let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Outage::from_request(
            NewOutage {
                submitter_id: owner.into(),
                start_date: d,
                end_date: d,
                reason: "away".into(),
                imposed_by_admin: imposed,
            },
            owner.into(),
        )
    }

    #[test]
    fn test_admin_permissions() {
        let admin = Identity::admin("root");
        assert!(PermissionMatrix::can_perform(&admin, PoolAction::OverrideSelection));
        assert!(PermissionMatrix::can_perform(&admin, PoolAction::ViewHidden));
        assert!(PermissionMatrix::can_delete_outage(&admin, &outage("b", true)));
    }

    #[test]
    fn test_member_permissions() {
        let member = Identity::member("b");
        assert!(!PermissionMatrix::can_perform(&member, PoolAction::OverrideSelection));
        assert!(PermissionMatrix::require(&member, PoolAction::RemoveSubmission).is_err());
        assert!(PermissionMatrix::can_delete_outage(&member, &outage("b", false)));
        assert!(!PermissionMatrix::can_delete_outage(&member, &outage("b", true)));
        assert!(!PermissionMatrix::can_delete_outage(&member, &outage("c", false)));
    }

    #[test]
    fn test_outage_creation_rights() {
        let member = Identity::member("b");
        assert!(PermissionMatrix::can_create_outage(&member, &"b".into(), false));
        assert!(!PermissionMatrix::can_create_outage(&member, &"c".into(), false));
        assert!(!PermissionMatrix::can_create_outage(&member, &"b".into(), true));

        // An admin asking on someone's behalf must impose it
        let admin = Identity::admin("root");
        assert!(!PermissionMatrix::can_create_outage(&admin, &"b".into(), false));
        assert!(PermissionMatrix::can_create_outage(&admin, &"b".into(), true));
    }
}
