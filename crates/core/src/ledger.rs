//! Outage ledger rules
//!
//! Outages are time-windowed exclusions per submitter. Members request their
//! own ahead of time; admins impose them on anyone for any dates. Records are
//! never edited, only created and deleted.

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::boundary::{ensure_supported, shift_days};
use crate::config::OutageConfig;
use crate::error::{Error, Result};
use crate::models::{AuditAction, AuditEntry, Identity, NewOutage, Outage, OutageId, SubmitterId};
use crate::permissions::PermissionMatrix;
use crate::storage::{Database, OutageRepository};

pub struct OutageLedger {
    rules: OutageConfig,
}

impl OutageLedger {
    pub fn new(rules: OutageConfig) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &OutageConfig {
        &self.rules
    }

    /// Check a request against the rules and the submitter's existing windows
    pub fn validate(
        &self,
        request: &NewOutage,
        requester: &Identity,
        today: NaiveDate,
        existing: &[Outage],
    ) -> Result<()> {
        if !PermissionMatrix::can_create_outage(requester, &request.submitter_id, request.imposed_by_admin)
        {
            return Err(Error::Forbidden(if request.imposed_by_admin {
                "Only admins can impose outages".into()
            } else {
                "You can only request outages for yourself".into()
            }));
        }

        if request.reason.trim().is_empty() {
            return Err(Error::Validation(
                "Please provide a reason for the outage".into(),
            ));
        }

        ensure_supported(request.start_date)?;
        ensure_supported(request.end_date)?;

        if request.start_date > request.end_date {
            return Err(Error::Validation(
                "Outage start date must be on or before its end date".into(),
            ));
        }

        if !request.imposed_by_admin {
            let earliest = shift_days(today, i64::from(self.rules.lead_days));
            if request.start_date < earliest {
                return Err(Error::Validation(format!(
                    "Outages must be requested at least {} days in advance (earliest start is {})",
                    self.rules.lead_days, earliest
                )));
            }

            if request.len_days() > i64::from(self.rules.max_days) {
                return Err(Error::Validation(format!(
                    "Outages can be at most {} days long",
                    self.rules.max_days
                )));
            }
        }

        if let Some(clash) = existing
            .iter()
            .filter(|o| o.submitter_id == request.submitter_id)
            .find(|o| o.overlaps(request.start_date, request.end_date))
        {
            return Err(Error::Validation(format!(
                "Outage overlaps an existing outage from {} to {}",
                clash.start_date, clash.end_date
            )));
        }

        Ok(())
    }

    /// Validate and persist a new outage
    #[instrument(skip(self, db, request), fields(submitter_id = %request.submitter_id, requester = %requester.user_id))]
    pub fn create_outage(
        &self,
        db: &Database,
        request: NewOutage,
        requester: &Identity,
        today: NaiveDate,
    ) -> Result<Outage> {
        let existing = db.list_outages_for(&request.submitter_id)?;
        if let Err(err) = self.validate(&request, requester, today, &existing) {
            warn!(error = %err, "Outage request rejected");
            return Err(err);
        }

        let outage = Outage::from_request(request, requester.user_id.clone());
        db.create_outage(&outage)?;

        info!(
            outage_id = %outage.id,
            start = %outage.start_date,
            end = %outage.end_date,
            imposed_by_admin = outage.imposed_by_admin,
            "Outage created"
        );
        Ok(outage)
    }

    /// Outages ordered by start date; every submitter's when `submitter_id` is `None`
    pub fn list_outages(
        &self,
        db: &Database,
        submitter_id: Option<&SubmitterId>,
    ) -> Result<Vec<Outage>> {
        match submitter_id {
            Some(id) => db.list_outages_for(id),
            None => db.list_all_outages(),
        }
    }

    pub fn is_excluded(&self, db: &Database, submitter_id: &SubmitterId, date: NaiveDate) -> Result<bool> {
        Ok(self.active_outage(db, submitter_id, date)?.is_some())
    }

    /// The outage covering `date` for this submitter, if any
    pub fn active_outage(
        &self,
        db: &Database,
        submitter_id: &SubmitterId,
        date: NaiveDate,
    ) -> Result<Option<Outage>> {
        Ok(db
            .list_outages_covering(date)?
            .into_iter()
            .find(|o| &o.submitter_id == submitter_id))
    }

    /// Delete an outage. Returns the removed record.
    ///
    /// Deleting an admin-imposed outage is written to the audit log.
    #[instrument(skip(self, db), fields(requester = %requester.user_id))]
    pub fn delete_outage(
        &self,
        db: &Database,
        outage_id: OutageId,
        requester: &Identity,
        crid: Uuid,
    ) -> Result<Outage> {
        let outage = db
            .find_outage(outage_id)?
            .ok_or_else(|| Error::NotFound(format!("outage {outage_id}")))?;

        if !PermissionMatrix::can_delete_outage(requester, &outage) {
            warn!(%crid, submitter_id = %outage.submitter_id, "Outage deletion forbidden");
            return Err(Error::Forbidden(
                "You can only delete your own outages".into(),
            ));
        }

        let audit = outage.imposed_by_admin.then(|| {
            AuditEntry::new(
                requester.user_id.clone(),
                AuditAction::DeleteOutage,
                outage_id.to_string(),
                Some(format!(
                    "{} {}..{}: {}",
                    outage.submitter_id, outage.start_date, outage.end_date, outage.reason
                )),
                crid,
            )
        });

        if !db.delete_outage_audited(outage_id, audit.as_ref())? {
            return Err(Error::NotFound(format!("outage {outage_id}")));
        }

        info!(%outage_id, %crid, audited = audit.is_some(), "Outage deleted");
        Ok(outage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn ledger() -> OutageLedger {
        OutageLedger::new(OutageConfig::default())
    }

    fn request(who: &str, start: NaiveDate, end: NaiveDate, admin: bool) -> NewOutage {
        NewOutage {
            submitter_id: who.into(),
            start_date: start,
            end_date: end,
            reason: "vacation".into(),
            imposed_by_admin: admin,
        }
    }

    #[test]
    fn test_lead_time_enforced() {
        let db = Database::open_in_memory().unwrap();
        let b = Identity::member("b");
        let today = d(1);

        let tomorrow = ledger().create_outage(&db, request("b", d(2), d(2), false), &b, today);
        assert!(matches!(tomorrow, Err(Error::Validation(_))));

        let in_three = ledger().create_outage(&db, request("b", d(4), d(5), false), &b, today);
        assert!(in_three.is_ok());
    }

    #[test]
    fn test_admin_outage_ignores_lead_time() {
        let db = Database::open_in_memory().unwrap();
        let admin = Identity::admin("root");
        let outage = ledger()
            .create_outage(&db, request("b", d(1), d(1), true), &admin, d(1))
            .unwrap();
        assert_eq!(outage.created_by.as_str(), "root");
        assert!(ledger().is_excluded(&db, &"b".into(), d(1)).unwrap());
    }

    #[test]
    fn test_overlap_rejected() {
        let db = Database::open_in_memory().unwrap();
        let b = Identity::member("b");
        ledger()
            .create_outage(&db, request("b", d(10), d(15), false), &b, d(1))
            .unwrap();

        let err = ledger()
            .create_outage(&db, request("b", d(15), d(20), false), &b, d(1))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("overlaps")));

        // Other submitters are unaffected
        let c = Identity::member("c");
        assert!(ledger()
            .create_outage(&db, request("c", d(10), d(15), false), &c, d(1))
            .is_ok());
    }

    #[test]
    fn test_reversed_and_empty_reason_rejected() {
        let db = Database::open_in_memory().unwrap();
        let b = Identity::member("b");
        assert!(matches!(
            ledger().create_outage(&db, request("b", d(9), d(8), false), &b, d(1)),
            Err(Error::Validation(_))
        ));

        let mut blank = request("b", d(8), d(9), false);
        blank.reason = "  ".into();
        assert!(matches!(
            ledger().create_outage(&db, blank, &b, d(1)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_self_request_length_capped() {
        let db = Database::open_in_memory().unwrap();
        let b = Identity::member("b");
        let start = d(10);
        let end = start + Duration::days(90);
        assert!(matches!(
            ledger().create_outage(&db, request("b", start, end, false), &b, d(1)),
            Err(Error::Validation(_))
        ));
        let end = start + Duration::days(89);
        assert!(ledger()
            .create_outage(&db, request("b", start, end, false), &b, d(1))
            .is_ok());
    }

    #[test]
    fn test_dates_outside_calendar_range_rejected() {
        let db = Database::open_in_memory().unwrap();
        let admin = Identity::admin("admin");
        assert!(matches!(
            ledger().create_outage(&db, request("b", d(10), NaiveDate::MAX, true), &admin, d(1)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            ledger().create_outage(&db, request("b", NaiveDate::MIN, d(10), true), &admin, d(1)),
            Err(Error::Validation(_))
        ));

        let b = Identity::member("b");
        assert!(matches!(
            ledger().create_outage(&db, request("b", d(10), d(11), false), &b, NaiveDate::MAX),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_requests_for_others_forbidden() {
        let db = Database::open_in_memory().unwrap();
        let a = Identity::member("a");
        assert!(matches!(
            ledger().create_outage(&db, request("b", d(10), d(11), false), &a, d(1)),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            ledger().create_outage(&db, request("a", d(10), d(11), true), &a, d(1)),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_list_ordered_by_start() {
        let db = Database::open_in_memory().unwrap();
        let b = Identity::member("b");
        ledger()
            .create_outage(&db, request("b", d(20), d(21), false), &b, d(1))
            .unwrap();
        ledger()
            .create_outage(&db, request("b", d(10), d(11), false), &b, d(1))
            .unwrap();

        let outages = ledger().list_outages(&db, Some(&"b".into())).unwrap();
        assert_eq!(outages[0].start_date, d(10));
        assert_eq!(outages[1].start_date, d(20));
        assert_eq!(ledger().list_outages(&db, None).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_permissions_and_audit() {
        let db = Database::open_in_memory().unwrap();
        let b = Identity::member("b");
        let admin = Identity::admin("root");

        let own = ledger()
            .create_outage(&db, request("b", d(10), d(11), false), &b, d(1))
            .unwrap();
        let imposed = ledger()
            .create_outage(&db, request("b", d(20), d(21), true), &admin, d(1))
            .unwrap();

        // Members cannot lift an admin block
        assert!(matches!(
            ledger().delete_outage(&db, imposed.id, &b, Uuid::new_v4()),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            ledger().delete_outage(&db, own.id, &Identity::member("c"), Uuid::new_v4()),
            Err(Error::Forbidden(_))
        ));

        ledger().delete_outage(&db, own.id, &b, Uuid::new_v4()).unwrap();
        assert!(db.audit().list_recent(10).unwrap().is_empty());

        let crid = Uuid::new_v4();
        ledger().delete_outage(&db, imposed.id, &admin, crid).unwrap();
        let entries = db.audit().find_by_correlation(crid).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::DeleteOutage);

        assert!(matches!(
            ledger().delete_outage(&db, imposed.id, &admin, Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
    }
}
