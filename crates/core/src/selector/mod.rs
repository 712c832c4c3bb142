//! Daily selector
//!
//! `Scheduler` is the service face of the crate: it owns the database handle,
//! the evaluator, the outage ledger and the seed source, and serialises every
//! write to a date's selection through a per-date lock. "Today" is always a
//! parameter; nothing here reads the clock.

mod cache;
mod locks;

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::boundary::{ensure_supported, shift_days};
use crate::config::Config;
use crate::eligibility::{pick_representative, Eligibility, EligibilityEvaluator};
use crate::error::{Error, Result};
use crate::ledger::OutageLedger;
use crate::models::{
    AlbumId, AuditAction, AuditEntry, DailySelection, Identity, NewOutage, Outage, OutageId,
    Submission, SubmitterId,
};
use crate::permissions::{PermissionMatrix, PoolAction};
use crate::seed::{SecretSeed, SeedSource};
use crate::storage::{Database, PoolRepository, SelectionRepository};

pub use cache::ChanceCache;
pub use locks::DateLocks;

use locks::lock;

pub struct Scheduler {
    db: Arc<Mutex<Database>>,
    evaluator: EligibilityEvaluator,
    ledger: OutageLedger,
    seed: Box<dyn SeedSource>,
    locks: DateLocks,
    chances: ChanceCache,
}

impl Scheduler {
    pub fn new(db: Arc<Mutex<Database>>, config: &Config, seed: Box<dyn SeedSource>) -> Self {
        Self {
            db,
            evaluator: EligibilityEvaluator::from_config(config),
            ledger: OutageLedger::new(config.outages),
            seed,
            locks: DateLocks::new(),
            chances: ChanceCache::new(),
        }
    }

    /// Build with the production seed: configured secret, else the persisted one
    pub fn from_config(db: Arc<Mutex<Database>>, config: &Config) -> Result<Self> {
        let seed = {
            let guard = lock(&db);
            SecretSeed::load_or_generate(&guard, config.secret.as_deref())?
        };
        Ok(Self::new(db, config, Box::new(seed)))
    }

    pub fn database(&self) -> &Arc<Mutex<Database>> {
        &self.db
    }

    // ---- Pool store ----

    /// Add a submission; a duplicate album id is rejected
    #[instrument(skip(self, submission), fields(album_id = %submission.id))]
    pub fn add_submission(&self, submission: Submission) -> Result<Submission> {
        let db = lock(&self.db);
        if db.find_submission(&submission.id)?.is_some() {
            return Err(Error::Validation(format!(
                "Album {} is already in the pool",
                submission.id
            )));
        }
        db.create_submission(&submission)?;
        drop(db);

        self.chances.clear();
        info!(submitter_id = %submission.submitter_id, hidden = submission.hidden, "Submission added");
        Ok(submission)
    }

    /// Submit an album on the requester's behalf. Only admins may add hidden entries.
    pub fn submit_album(&self, requester: &Identity, album_id: AlbumId, hidden: bool) -> Result<Submission> {
        if hidden {
            PermissionMatrix::require(requester, PoolAction::ViewHidden)?;
        }
        self.add_submission(Submission::new(album_id, requester.user_id.clone(), hidden))
    }

    pub fn get_submission(&self, id: &AlbumId) -> Result<Option<Submission>> {
        lock(&self.db).find_submission(id)
    }

    /// Submissions by submission date; hidden ones only for admins
    pub fn list_submissions(&self, requester: &Identity, include_hidden: bool) -> Result<Vec<Submission>> {
        if include_hidden {
            PermissionMatrix::require(requester, PoolAction::ViewHidden)?;
        }
        lock(&self.db).list_submissions(include_hidden)
    }

    pub fn list_submissions_for(&self, submitter_id: &SubmitterId) -> Result<Vec<Submission>> {
        lock(&self.db).list_submissions_for(submitter_id)
    }

    /// Admin removal. Albums that have ever been picked stay for history.
    #[instrument(skip(self), fields(requester = %requester.user_id))]
    pub fn remove_submission(&self, id: &AlbumId, requester: &Identity, crid: Uuid) -> Result<()> {
        PermissionMatrix::require(requester, PoolAction::RemoveSubmission)?;

        let db = lock(&self.db);
        let submission = db
            .find_submission(id)?
            .ok_or_else(|| Error::NotFound(format!("submission {id}")))?;

        if db.count_selections_for(id)? > 0 {
            return Err(Error::Validation(format!(
                "Album {id} has been Album of the Day and cannot be removed"
            )));
        }

        let audit = AuditEntry::new(
            requester.user_id.clone(),
            AuditAction::RemoveSubmission,
            id.to_string(),
            Some(format!("submitted by {}", submission.submitter_id)),
            crid,
        );
        if !db.delete_submission_audited(id, &audit)? {
            return Err(Error::NotFound(format!("submission {id}")));
        }
        drop(db);

        self.chances.clear();
        info!(%crid, "Submission removed");
        Ok(())
    }

    // ---- Outage ledger ----

    /// Validate and persist an outage, then drop cached odds for its dates
    pub fn create_outage(&self, request: NewOutage, requester: &Identity, today: NaiveDate) -> Result<Outage> {
        let outage = {
            let db = lock(&self.db);
            self.ledger.create_outage(&db, request, requester, today)?
        };
        self.invalidate_after_outage(&outage);
        Ok(outage)
    }

    pub fn list_outages(&self, submitter_id: Option<&SubmitterId>) -> Result<Vec<Outage>> {
        self.ledger.list_outages(&lock(&self.db), submitter_id)
    }

    pub fn is_excluded(&self, submitter_id: &SubmitterId, date: NaiveDate) -> Result<bool> {
        self.ledger.is_excluded(&lock(&self.db), submitter_id, date)
    }

    pub fn active_outage(&self, submitter_id: &SubmitterId, date: NaiveDate) -> Result<Option<Outage>> {
        self.ledger.active_outage(&lock(&self.db), submitter_id, date)
    }

    pub fn delete_outage(&self, outage_id: OutageId, requester: &Identity, crid: Uuid) -> Result<Outage> {
        let outage = {
            let db = lock(&self.db);
            self.ledger.delete_outage(&db, outage_id, requester, crid)?
        };
        self.invalidate_after_outage(&outage);
        Ok(outage)
    }

    fn invalidate_after_outage(&self, outage: &Outage) {
        self.chances.invalidate_range(outage.start_date, outage.end_date);
    }

    // ---- Evaluator ----

    /// Eligibility for `date`, failing with `NoEligibleSubmissions` when empty
    pub fn compute_eligibility(&self, date: NaiveDate) -> Result<Eligibility> {
        ensure_supported(date)?;
        self.evaluator.compute_eligibility(&lock(&self.db), date)
    }

    /// Eligible/blocked breakdown for admin tooltips. Never fails on an empty pool.
    pub fn eligibility(&self, requester: &Identity, date: NaiveDate) -> Result<Arc<Eligibility>> {
        PermissionMatrix::require(requester, PoolAction::ViewHidden)?;
        self.cached_eligibility(date)
    }

    fn cached_eligibility(&self, date: NaiveDate) -> Result<Arc<Eligibility>> {
        ensure_supported(date)?;
        if let Some(hit) = self.chances.get(date) {
            return Ok(hit);
        }
        // Read before the snapshot so a write committed in between is noticed
        let generation = self.chances.generation();
        let snapshot = lock(&self.db).snapshot(date, self.evaluator.lookback_days())?;
        Ok(self
            .chances
            .insert(self.evaluator.evaluate(date, &snapshot), generation))
    }

    // ---- Selector ----

    /// The stored selection for `date`, if the draw has happened
    pub fn get_selection(&self, date: NaiveDate) -> Result<Option<DailySelection>> {
        ensure_supported(date)?;
        lock(&self.db).find_selection(date)
    }

    /// Return the date's selection, drawing and persisting it on first call
    #[instrument(skip(self))]
    pub fn get_or_create_selection(&self, date: NaiveDate) -> Result<DailySelection> {
        ensure_supported(date)?;
        let (stale_from, stale_to) = self.selection_reach(date);

        let date_lock = self.locks.for_date(date);
        let _date_guard = lock(&date_lock);
        let db = lock(&self.db);

        if let Some(existing) = db.find_selection(date)? {
            return Ok(existing);
        }

        let eligibility = match self.evaluator.compute_eligibility(&db, date) {
            Ok(e) => e,
            Err(err @ Error::NoEligibleSubmissions { .. }) => {
                error!(%date, "No eligible submissions, date left unselected");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let drawn = self.draw(date, &eligibility)?;
        let stored = db.record_drawn_selection(&drawn)?;
        drop(db);

        self.chances.invalidate_range(stale_from, stale_to);
        if stored.submission_id == drawn.submission_id {
            info!(
                album_id = %stored.submission_id,
                submitter_id = %stored.submitter_id,
                chance = eligibility.chance_for(&stored.submitter_id),
                "Album of the Day selected"
            );
        }
        Ok(stored)
    }

    /// Weighted submitter draw, then the representative pick, from one seeded RNG
    fn draw(&self, date: NaiveDate, eligibility: &Eligibility) -> Result<DailySelection> {
        let (submitters, weights): (Vec<&SubmitterId>, Vec<f64>) = eligibility
            .submitter_weights
            .iter()
            .map(|(id, w)| (id, *w))
            .unzip();
        let index =
            WeightedIndex::new(&weights).map_err(|_| Error::NoEligibleSubmissions { date })?;

        let mut rng = self.seed.rng_for(date);
        let submitter_id = submitters[index.sample(&mut rng)];

        let candidates = eligibility.candidates_for(submitter_id);
        let submission = pick_representative(&candidates, Some(&mut rng))
            .ok_or(Error::NoEligibleSubmissions { date })?;

        Ok(DailySelection::drawn(
            date,
            submission.id.clone(),
            submission.submitter_id.clone(),
        ))
    }

    /// Admin replacement of a date's selection, audited under `crid`
    #[instrument(skip(self, admin_message), fields(requester = %requester.user_id))]
    pub fn override_selection(
        &self,
        date: NaiveDate,
        submission_id: &AlbumId,
        admin_message: Option<String>,
        requester: &Identity,
        crid: Uuid,
    ) -> Result<DailySelection> {
        if let Err(err) = PermissionMatrix::require(requester, PoolAction::OverrideSelection) {
            warn!(%crid, "Non-admin override rejected");
            return Err(err);
        }
        ensure_supported(date)?;
        let (stale_from, stale_to) = self.selection_reach(date);

        let date_lock = self.locks.for_date(date);
        let _date_guard = lock(&date_lock);
        let db = lock(&self.db);

        let submission = db
            .find_submission(submission_id)?
            .ok_or_else(|| Error::NotFound(format!("submission {submission_id}")))?;
        let previous = db.find_selection(date)?;

        let admin_message = admin_message.filter(|m| !m.trim().is_empty());
        let selection = DailySelection::manual(
            date,
            submission.id.clone(),
            submission.submitter_id.clone(),
            admin_message.clone(),
        );

        let detail = format!(
            "{} -> {}{}",
            previous
                .as_ref()
                .map(|p| p.submission_id.to_string())
                .unwrap_or_else(|| "none".into()),
            submission.id,
            admin_message.map(|m| format!(": {m}")).unwrap_or_default(),
        );
        let audit = AuditEntry::new(
            requester.user_id.clone(),
            AuditAction::OverrideSelection,
            date.to_string(),
            Some(detail),
            crid,
        );

        db.replace_selection(&selection, &audit)?;
        drop(db);

        self.chances.invalidate_range(stale_from, stale_to);
        info!(%date, %crid, album_id = %selection.submission_id, "Selection overridden");
        Ok(selection)
    }

    /// Normalised chance in `[0, 1]`; 0.0 when blocked, absent, or nobody is eligible
    pub fn selection_chance(&self, submitter_id: &SubmitterId, as_of: NaiveDate) -> Result<f64> {
        Ok(self.cached_eligibility(as_of)?.chance_for(submitter_id))
    }

    /// Selections in `[from, to]`, ascending
    pub fn selection_history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailySelection>> {
        ensure_supported(from)?;
        ensure_supported(to)?;
        if from > to {
            return Err(Error::Validation(
                "History range start must be on or before its end".into(),
            ));
        }
        lock(&self.db).list_selections(from, to)
    }

    /// Dates whose figures a selection on `date` changes: that date and every
    /// later date whose policies or recency window can see it
    fn selection_reach(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let reach = i64::from(self.evaluator.lookback_days());
        (date, shift_days(date, reach))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::FixedSeed;
    use crate::SelectionState;
    use std::thread;
    use tempfile::tempdir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn scheduler_with(db: Database, seed: u64) -> Scheduler {
        Scheduler::new(
            Arc::new(Mutex::new(db)),
            &Config::default(),
            Box::new(FixedSeed(seed)),
        )
    }

    fn scheduler() -> Scheduler {
        let s = scheduler_with(Database::open_in_memory().unwrap(), 7);
        for who in ["a", "b", "c"] {
            s.add_submission(Submission::new(
                format!("{who}1").as_str().into(),
                who.into(),
                false,
            ))
            .unwrap();
        }
        s
    }

    fn admin() -> Identity {
        Identity::admin("root")
    }

    #[test]
    fn test_pick_from_three_submitters() {
        let s = scheduler();
        let pick = s.get_or_create_selection(d(1)).unwrap();
        assert!(["a1", "b1", "c1"].contains(&pick.submission_id.as_str()));
        assert!(!pick.manually_selected);

        let submission = s.get_submission(&pick.submission_id).unwrap().unwrap();
        assert_eq!(submission.times_selected, 1);
        assert_eq!(submission.last_selected_date, Some(d(1)));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let s = scheduler();
        let first = s.get_or_create_selection(d(1)).unwrap();
        let second = s.get_or_create_selection(d(1)).unwrap();
        assert_eq!(first.submission_id, second.submission_id);

        let submission = s.get_submission(&first.submission_id).unwrap().unwrap();
        assert_eq!(submission.times_selected, 1);
    }

    #[test]
    fn test_concurrent_callers_agree() {
        let s = Arc::new(scheduler());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                thread::spawn(move || s.get_or_create_selection(d(1)).unwrap())
            })
            .collect();

        let picks: Vec<DailySelection> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(picks.iter().all(|p| p.submission_id == picks[0].submission_id));
        assert_eq!(s.selection_history(d(1), d(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_second_process_reads_first_pick() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aotd.db");
        let first = scheduler_with(Database::open(&path).unwrap(), 1);
        for who in ["a", "b", "c"] {
            first
                .add_submission(Submission::new(
                    format!("{who}1").as_str().into(),
                    who.into(),
                    false,
                ))
                .unwrap();
        }
        let second = scheduler_with(Database::open(&path).unwrap(), 99);

        let a = first.get_or_create_selection(d(1)).unwrap();
        let b = second.get_or_create_selection(d(1)).unwrap();
        assert_eq!(a.submission_id, b.submission_id);
    }

    #[test]
    fn test_same_seed_same_draw() {
        let a = scheduler().get_or_create_selection(d(1)).unwrap();
        let b = scheduler().get_or_create_selection(d(1)).unwrap();
        assert_eq!(a.submission_id, b.submission_id);
    }

    #[test]
    fn test_empty_pool_leaves_date_unselected() {
        let s = scheduler_with(Database::open_in_memory().unwrap(), 1);
        let err = s.get_or_create_selection(d(1)).unwrap_err();
        assert!(matches!(err, Error::NoEligibleSubmissions { .. }));
        assert!(s.get_selection(d(1)).unwrap().is_none());
    }

    #[test]
    fn test_outage_submitter_never_drawn() {
        let s = scheduler();
        s.create_outage(
            NewOutage {
                submitter_id: "b".into(),
                start_date: d(1),
                end_date: d(30),
                reason: "moving".into(),
                imposed_by_admin: true,
            },
            &admin(),
            d(1),
        )
        .unwrap();

        for day in 1..=10 {
            let pick = s.get_or_create_selection(d(day)).unwrap();
            assert_ne!(pick.submitter_id.as_str(), "b");
        }
    }

    #[test]
    fn test_override_precedence() {
        let s = scheduler();
        let crid = Uuid::new_v4();
        let replaced = s
            .override_selection(
                d(1),
                &"c1".into(),
                Some("B's pick was a duplicate".into()),
                &admin(),
                crid,
            )
            .unwrap();
        assert!(replaced.manually_selected);
        assert_eq!(replaced.admin_message.as_deref(), Some("B's pick was a duplicate"));

        let read = s.get_or_create_selection(d(1)).unwrap();
        assert_eq!(read.submission_id.as_str(), "c1");
        assert!(read.manually_selected);
        assert_eq!(read.state(), SelectionState::Overridden);

        let audit = lock(s.database()).audit().find_by_correlation(crid).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].subject, "2025-06-01");
    }

    #[test]
    fn test_override_after_draw_moves_bookkeeping() {
        let s = scheduler();
        let drawn = s.get_or_create_selection(d(1)).unwrap();
        let target: AlbumId = ["a1", "b1", "c1"]
            .into_iter()
            .find(|id| *id != drawn.submission_id.as_str())
            .unwrap()
            .into();

        s.override_selection(d(1), &target, None, &admin(), Uuid::new_v4())
            .unwrap();

        let old = s.get_submission(&drawn.submission_id).unwrap().unwrap();
        assert_eq!(old.last_selected_date, None);
        let new = s.get_submission(&target).unwrap().unwrap();
        assert_eq!(new.last_selected_date, Some(d(1)));
        assert_eq!(new.times_selected, 1);
    }

    #[test]
    fn test_override_requires_admin_and_known_album() {
        let s = scheduler();
        assert!(matches!(
            s.override_selection(d(1), &"a1".into(), None, &Identity::member("a"), Uuid::new_v4()),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            s.override_selection(d(1), &"nope".into(), None, &admin(), Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
        assert!(s.get_selection(d(1)).unwrap().is_none());
    }

    #[test]
    fn test_chance_reflects_outages_and_cache_invalidation() {
        let s = scheduler();
        let before = s.selection_chance(&"a".into(), d(10)).unwrap();
        assert!((before - 1.0 / 3.0).abs() < 1e-9);

        s.create_outage(
            NewOutage {
                submitter_id: "b".into(),
                start_date: d(10),
                end_date: d(12),
                reason: "travel".into(),
                imposed_by_admin: false,
            },
            &Identity::member("b"),
            d(1),
        )
        .unwrap();

        assert!((s.selection_chance(&"a".into(), d(10)).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(s.selection_chance(&"b".into(), d(11)).unwrap(), 0.0);
        assert_eq!(s.selection_chance(&"nobody".into(), d(11)).unwrap(), 0.0);
    }

    #[test]
    fn test_chance_after_pick_excludes_winner() {
        let s = scheduler();
        s.selection_chance(&"a".into(), d(1)).unwrap();
        let pick = s.get_or_create_selection(d(1)).unwrap();

        assert_eq!(s.selection_chance(&pick.submitter_id, d(1)).unwrap(), 0.0);
        let others: f64 = ["a", "b", "c"]
            .iter()
            .map(|who| s.selection_chance(&(*who).into(), d(1)).unwrap())
            .sum();
        assert!((others - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_chance_is_zero_for_empty_pool() {
        let s = scheduler_with(Database::open_in_memory().unwrap(), 1);
        assert_eq!(s.selection_chance(&"a".into(), d(1)).unwrap(), 0.0);
    }

    #[test]
    fn test_remove_submission_rules() {
        let s = scheduler();
        let pick = s.get_or_create_selection(d(1)).unwrap();

        assert!(matches!(
            s.remove_submission(&pick.submission_id, &Identity::member("a"), Uuid::new_v4()),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            s.remove_submission(&pick.submission_id, &admin(), Uuid::new_v4()),
            Err(Error::Validation(_))
        ));

        s.add_submission(Submission::new("x1".into(), "x".into(), false))
            .unwrap();
        s.remove_submission(&"x1".into(), &admin(), Uuid::new_v4())
            .unwrap();
        assert!(s.get_submission(&"x1".into()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_and_hidden_submissions() {
        let s = scheduler();
        assert!(matches!(
            s.add_submission(Submission::new("a1".into(), "z".into(), false)),
            Err(Error::Validation(_))
        ));

        let member = Identity::member("m");
        assert!(matches!(
            s.submit_album(&member, "m1".into(), true),
            Err(Error::Forbidden(_))
        ));
        s.submit_album(&admin(), "h1".into(), true).unwrap();

        assert_eq!(s.list_submissions(&member, false).unwrap().len(), 3);
        assert!(s.list_submissions(&member, true).is_err());
        assert_eq!(s.list_submissions(&admin(), true).unwrap().len(), 4);
    }

    #[test]
    fn test_history_range() {
        let s = scheduler();
        for day in 1..=3 {
            s.get_or_create_selection(d(day)).unwrap();
        }
        let history = s.selection_history(d(2), d(3)).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].date < history[1].date);
        assert!(s.selection_history(d(3), d(1)).is_err());
    }

    #[test]
    fn test_dates_past_calendar_edges_rejected() {
        let s = scheduler();
        assert!(matches!(
            s.selection_chance(&"a".into(), NaiveDate::MIN),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            s.get_or_create_selection(NaiveDate::MAX),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            s.override_selection(NaiveDate::MAX, &"a1".into(), None, &admin(), Uuid::new_v4()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(s.get_selection(NaiveDate::MAX), Err(Error::Validation(_))));
        assert!(s.selection_history(NaiveDate::MIN, d(1)).is_err());

        // Nothing was written and the album's bookkeeping is untouched
        let far = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        assert!(s.selection_history(d(1), far).unwrap().is_empty());
        let a1 = s.get_submission(&"a1".into()).unwrap().unwrap();
        assert_eq!(a1.times_selected, 0);
    }

    #[test]
    fn test_first_and_last_supported_days_work() {
        let s = scheduler();
        let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();

        assert!((s.selection_chance(&"a".into(), first).unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!(s.get_or_create_selection(first).is_ok());
        assert!(s.get_or_create_selection(last).is_ok());
        s.override_selection(last, &"a1".into(), None, &admin(), Uuid::new_v4())
            .unwrap();
        assert_eq!(s.get_selection(last).unwrap().unwrap().submission_id.as_str(), "a1");
        assert_eq!(s.selection_chance(&"a".into(), last).unwrap(), 0.0);
    }

    #[test]
    fn test_chance_cache_stays_bounded() {
        let s = scheduler();
        let start = d(1);
        for offset in 0..5000 {
            let date = crate::boundary::shift_days(start, offset);
            s.selection_chance(&"a".into(), date).unwrap();
        }
        assert!(s.chances.len() <= s.chances.capacity());
    }

    #[test]
    fn test_outage_written_during_reads_is_seen() {
        let s = Arc::new(scheduler());
        let target = d(20);
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&s);
                thread::spawn(move || {
                    for _ in 0..200 {
                        s.selection_chance(&"b".into(), target).unwrap();
                    }
                })
            })
            .collect();

        for day in [18, 19, 20] {
            s.create_outage(
                NewOutage {
                    submitter_id: "b".into(),
                    start_date: d(day),
                    end_date: d(day),
                    reason: "maintenance".into(),
                    imposed_by_admin: true,
                },
                &admin(),
                d(1),
            )
            .unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(s.selection_chance(&"b".into(), target).unwrap(), 0.0);
        assert!((s.selection_chance(&"a".into(), target).unwrap() - 0.5).abs() < 1e-9);
    }
}
