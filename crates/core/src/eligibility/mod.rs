//! Eligibility evaluation
//!
//! Turns one pool snapshot into the set of submitters that can win a date and
//! the probability each one has. Fairness is per submitter: every unblocked
//! submitter starts at weight 1.0 however many albums they have pooled, recent
//! winners are dampened, and the result is normalised to sum to 1.0.

mod policy;
mod representative;
mod weights;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{Config, RecencyConfig};
use crate::error::{Error, Result};
use crate::models::{AlbumId, Submission, SubmitterId};
use crate::storage::{Database, PoolSnapshot};

pub use policy::{
    build_policies, first_block, BlockPolicy, BlockReason, BlockType, ConsecutiveCapPolicy,
    OutagePolicy, PolicyKind, SelectedTodayPolicy,
};
pub use representative::{pick_representative, representative_candidates};
pub use weights::{days_since_last_pick, normalize, RecencyDecay};

/// Result of evaluating one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eligibility {
    pub date: NaiveDate,
    /// Representative candidates of every unblocked submitter
    pub eligible: Vec<Submission>,
    /// Normalised weight per unblocked submitter
    pub submitter_weights: BTreeMap<SubmitterId, f64>,
    /// Submitter weight split evenly over that submitter's candidates
    pub submission_weights: BTreeMap<AlbumId, f64>,
    /// First block reason per blocked submitter
    pub blocked: BTreeMap<SubmitterId, BlockReason>,
}

impl Eligibility {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            eligible: Vec::new(),
            submitter_weights: BTreeMap::new(),
            submission_weights: BTreeMap::new(),
            blocked: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.submitter_weights.is_empty()
    }

    /// Normalised chance for a submitter; 0.0 if blocked or absent
    pub fn chance_for(&self, submitter_id: &SubmitterId) -> f64 {
        self.submitter_weights
            .get(submitter_id)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_eligible(&self, submitter_id: &SubmitterId) -> bool {
        self.submitter_weights.contains_key(submitter_id)
    }

    pub fn blocked_reason(&self, submitter_id: &SubmitterId) -> Option<&BlockReason> {
        self.blocked.get(submitter_id)
    }

    /// A submitter's candidates, oldest submission first
    pub fn candidates_for(&self, submitter_id: &SubmitterId) -> Vec<&Submission> {
        self.eligible
            .iter()
            .filter(|s| &s.submitter_id == submitter_id)
            .collect()
    }
}

/// Evaluates eligibility with a fixed policy list and recency rule
pub struct EligibilityEvaluator {
    policies: Vec<Box<dyn BlockPolicy>>,
    recency: RecencyConfig,
}

impl EligibilityEvaluator {
    pub fn new(policies: Vec<Box<dyn BlockPolicy>>, recency: RecencyConfig) -> Self {
        Self { policies, recency }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(build_policies(&config.policy), config.recency)
    }

    /// Days of selection history a snapshot must carry
    pub fn lookback_days(&self) -> u32 {
        self.policies
            .iter()
            .map(|p| p.lookback_days())
            .max()
            .unwrap_or(0)
            .max(self.recency.window_days)
    }

    /// Evaluate a snapshot. An empty result is not an error here.
    pub fn evaluate(&self, date: NaiveDate, snapshot: &PoolSnapshot) -> Eligibility {
        let mut by_submitter: BTreeMap<&SubmitterId, Vec<&Submission>> = BTreeMap::new();
        for submission in &snapshot.submissions {
            by_submitter
                .entry(&submission.submitter_id)
                .or_default()
                .push(submission);
        }

        let mut eligibility = Eligibility::new(date);
        let mut candidate_counts: BTreeMap<SubmitterId, usize> = BTreeMap::new();

        for (submitter_id, submissions) in by_submitter {
            if let Some(reason) = first_block(&self.policies, submitter_id, date, snapshot) {
                debug!(%submitter_id, block_type = ?reason.block_type, "Submitter blocked");
                eligibility.blocked.insert(submitter_id.clone(), reason);
                continue;
            }

            let candidates = representative_candidates(&submissions);
            if candidates.is_empty() {
                continue;
            }

            let weight = days_since_last_pick(submitter_id, date, &snapshot.recent_selections)
                .map(|days| self.recency.decay.multiplier(days, self.recency.window_days))
                .unwrap_or(1.0);

            eligibility
                .submitter_weights
                .insert(submitter_id.clone(), weight);
            candidate_counts.insert(submitter_id.clone(), candidates.len());
            eligibility
                .eligible
                .extend(candidates.into_iter().cloned());
        }

        normalize(&mut eligibility.submitter_weights);

        for submission in &eligibility.eligible {
            let share = eligibility.chance_for(&submission.submitter_id);
            let count = candidate_counts
                .get(&submission.submitter_id)
                .copied()
                .unwrap_or(1);
            eligibility
                .submission_weights
                .insert(submission.id.clone(), share / count as f64);
        }

        eligibility
    }

    /// Read a snapshot and evaluate it, failing when nobody is eligible
    #[instrument(skip(self, db))]
    pub fn compute_eligibility(&self, db: &Database, date: NaiveDate) -> Result<Eligibility> {
        let snapshot = db.snapshot(date, self.lookback_days())?;
        let eligibility = self.evaluate(date, &snapshot);
        if eligibility.is_empty() {
            return Err(Error::NoEligibleSubmissions { date });
        }
        Ok(eligibility)
    }
}
