//! Block policies
//!
//! A policy looks at one submitter on one date and either lets them through or
//! returns the reason they are blocked. Policies run in configured order and the
//! first block wins.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::models::SubmitterId;
use crate::storage::PoolSnapshot;

/// Policy names accepted in `policy.order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Outage,
    ConsecutiveCap,
    SelectedToday,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Outage => "outage",
            PolicyKind::ConsecutiveCap => "consecutive_cap",
            PolicyKind::SelectedToday => "selected_today",
        }
    }
}

/// Why a submitter cannot be picked, as shown in admin tooltips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Outage,
    AdminOutage,
    ConsecutiveCap,
    SelectedToday,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReason {
    pub block_type: BlockType,
    /// Last day of the blocking outage
    pub outage_end: Option<NaiveDate>,
    pub admin_outage: bool,
}

impl BlockReason {
    pub fn of(block_type: BlockType) -> Self {
        Self {
            block_type,
            outage_end: None,
            admin_outage: false,
        }
    }
}

/// A predicate that may block a submitter on a date
pub trait BlockPolicy: Send + Sync {
    fn kind(&self) -> PolicyKind;

    /// How many days of selection history this policy reads
    fn lookback_days(&self) -> u32 {
        0
    }

    fn check(
        &self,
        submitter_id: &SubmitterId,
        date: NaiveDate,
        snapshot: &PoolSnapshot,
    ) -> Option<BlockReason>;
}

/// Blocks a submitter covered by an outage on the date
pub struct OutagePolicy;

impl BlockPolicy for OutagePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Outage
    }

    fn check(
        &self,
        submitter_id: &SubmitterId,
        date: NaiveDate,
        snapshot: &PoolSnapshot,
    ) -> Option<BlockReason> {
        let outage = snapshot
            .outages
            .iter()
            .find(|o| &o.submitter_id == submitter_id && o.covers(date))?;

        Some(BlockReason {
            block_type: if outage.imposed_by_admin {
                BlockType::AdminOutage
            } else {
                BlockType::Outage
            },
            outage_end: Some(outage.end_date),
            admin_outage: outage.imposed_by_admin,
        })
    }
}

/// Blocks a submitter who won each of the previous `max_consecutive` days
pub struct ConsecutiveCapPolicy {
    pub max_consecutive: u32,
}

impl BlockPolicy for ConsecutiveCapPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ConsecutiveCap
    }

    fn lookback_days(&self) -> u32 {
        self.max_consecutive
    }

    fn check(
        &self,
        submitter_id: &SubmitterId,
        date: NaiveDate,
        snapshot: &PoolSnapshot,
    ) -> Option<BlockReason> {
        if self.max_consecutive == 0 {
            return None;
        }

        let streak = (1..=i64::from(self.max_consecutive)).all(|back| {
            date.checked_sub_signed(Duration::days(back))
                .and_then(|earlier| snapshot.selection_on(earlier))
                .is_some_and(|s| &s.submitter_id == submitter_id)
        });

        streak.then(|| BlockReason::of(BlockType::ConsecutiveCap))
    }
}

/// Blocks the submitter who already holds the date's selection
pub struct SelectedTodayPolicy;

impl BlockPolicy for SelectedTodayPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::SelectedToday
    }

    fn check(
        &self,
        submitter_id: &SubmitterId,
        date: NaiveDate,
        snapshot: &PoolSnapshot,
    ) -> Option<BlockReason> {
        snapshot
            .selection_on(date)
            .filter(|s| &s.submitter_id == submitter_id)
            .map(|_| BlockReason::of(BlockType::SelectedToday))
    }
}

/// Build the configured policy list in order
pub fn build_policies(config: &PolicyConfig) -> Vec<Box<dyn BlockPolicy>> {
    config
        .order
        .iter()
        .map(|kind| -> Box<dyn BlockPolicy> {
            match kind {
                PolicyKind::Outage => Box::new(OutagePolicy),
                PolicyKind::ConsecutiveCap => Box::new(ConsecutiveCapPolicy {
                    max_consecutive: config.max_consecutive_picks,
                }),
                PolicyKind::SelectedToday => Box::new(SelectedTodayPolicy),
            }
        })
        .collect()
}

/// Run policies in order, returning the first block
pub fn first_block(
    policies: &[Box<dyn BlockPolicy>],
    submitter_id: &SubmitterId,
    date: NaiveDate,
    snapshot: &PoolSnapshot,
) -> Option<BlockReason> {
    policies
        .iter()
        .find_map(|p| p.check(submitter_id, date, snapshot))
}
