//! Outage model - a time-windowed exclusion for a submitter

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SubmitterId;

/// Identifier for an outage record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutageId(pub Uuid);

impl OutageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OutageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OutageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to create an outage, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOutage {
    pub submitter_id: SubmitterId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub imposed_by_admin: bool,
}

impl NewOutage {
    /// Number of days requested, inclusive of both ends
    pub fn len_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// A persisted outage. Dates are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outage {
    pub id: OutageId,
    pub submitter_id: SubmitterId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub imposed_by_admin: bool,
    pub created_by: SubmitterId,
    pub created_at: DateTime<Utc>,
}

impl Outage {
    pub fn from_request(request: NewOutage, created_by: SubmitterId) -> Self {
        Self {
            id: OutageId::new(),
            submitter_id: request.submitter_id,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            imposed_by_admin: request.imposed_by_admin,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Does this window include `date`?
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Does this window intersect `[start, end]`?
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn outage(start: NaiveDate, end: NaiveDate) -> Outage {
        Outage::from_request(
            NewOutage {
                submitter_id: "b".into(),
                start_date: start,
                end_date: end,
                reason: "vacation".into(),
                imposed_by_admin: false,
            },
            "b".into(),
        )
    }

    #[test]
    fn test_covers_is_inclusive() {
        let o = outage(d(2025, 6, 1), d(2025, 6, 3));
        assert!(o.covers(d(2025, 6, 1)));
        assert!(o.covers(d(2025, 6, 3)));
        assert!(!o.covers(d(2025, 5, 31)));
        assert!(!o.covers(d(2025, 6, 4)));
    }

    #[test]
    fn test_overlap_touching_edges() {
        let o = outage(d(2025, 6, 1), d(2025, 6, 3));
        assert!(o.overlaps(d(2025, 6, 3), d(2025, 6, 10)));
        assert!(o.overlaps(d(2025, 5, 1), d(2025, 6, 1)));
        assert!(!o.overlaps(d(2025, 6, 4), d(2025, 6, 10)));
    }

    #[test]
    fn test_request_length_is_inclusive() {
        let request = NewOutage {
            submitter_id: "b".into(),
            start_date: d(2025, 6, 1),
            end_date: d(2025, 6, 3),
            reason: "vacation".into(),
            imposed_by_admin: false,
        };
        assert_eq!(request.len_days(), 3);
    }
}
