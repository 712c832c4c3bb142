//! Recency dampening and weight normalisation

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailySelection, SubmitterId};

/// How a recent winner's weight is reduced inside the recency window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecencyDecay {
    /// Flat x0.5
    #[default]
    Halve,
    /// Flat multiplier, 0 < value <= 1
    Factor { value: f64 },
    /// `floor` the day after a pick, rising linearly to 1.0 across the window
    Linear { floor: f64 },
}

impl RecencyDecay {
    /// Weight multiplier for a submitter last picked `days_since` days ago.
    ///
    /// Outside `1..=window_days` the multiplier is 1.0.
    pub fn multiplier(&self, days_since: i64, window_days: u32) -> f64 {
        let window = i64::from(window_days);
        if days_since < 1 || days_since > window {
            return 1.0;
        }

        match *self {
            RecencyDecay::Halve => 0.5,
            RecencyDecay::Factor { value } => value,
            RecencyDecay::Linear { floor } => {
                let progress = (days_since - 1) as f64 / window as f64;
                floor + (1.0 - floor) * progress
            }
        }
    }
}

/// Days between `date` and the submitter's most recent earlier pick
pub fn days_since_last_pick(
    submitter_id: &SubmitterId,
    date: NaiveDate,
    history: &[DailySelection],
) -> Option<i64> {
    history
        .iter()
        .filter(|s| &s.submitter_id == submitter_id && s.date < date)
        .map(|s| (date - s.date).num_days())
        .min()
}

/// Scale weights in place so they sum to 1.0. Leaves an all-zero map alone.
pub fn normalize<K: Ord>(weights: &mut BTreeMap<K, f64>) {
    let total: f64 = weights.values().sum();
    if total <= 0.0 {
        return;
    }
    for w in weights.values_mut() {
        *w /= total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_halve_inside_window_only() {
        let decay = RecencyDecay::Halve;
        assert_eq!(decay.multiplier(1, 14), 0.5);
        assert_eq!(decay.multiplier(14, 14), 0.5);
        assert_eq!(decay.multiplier(15, 14), 1.0);
        assert_eq!(decay.multiplier(0, 14), 1.0);
    }

    #[test]
    fn test_linear_climbs_from_floor() {
        let decay = RecencyDecay::Linear { floor: 0.2 };
        assert!((decay.multiplier(1, 10) - 0.2).abs() < 1e-9);
        let mid = decay.multiplier(6, 10);
        assert!(mid > 0.2 && mid < 1.0);
        assert!(decay.multiplier(10, 10) < 1.0);
        assert_eq!(decay.multiplier(11, 10), 1.0);
    }

    #[test]
    fn test_days_since_uses_latest_earlier_pick() {
        let history = vec![
            DailySelection::drawn(d(1), "a1".into(), "a".into()),
            DailySelection::drawn(d(4), "a2".into(), "a".into()),
            DailySelection::drawn(d(6), "a1".into(), "a".into()),
        ];
        assert_eq!(days_since_last_pick(&"a".into(), d(6), &history), Some(2));
        assert_eq!(days_since_last_pick(&"b".into(), d(6), &history), None);
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let mut weights = BTreeMap::from([("a", 1.0), ("b", 0.5), ("c", 1.0)]);
        normalize(&mut weights);
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((weights["b"] - 0.2).abs() < 1e-9);
    }
}
