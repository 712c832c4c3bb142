//! Per-date mutual exclusion

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

/// Hands out one lock per calendar date.
///
/// Every write to a date's selection holds that date's lock, so a draw and an
/// override for the same date never interleave inside this process.
#[derive(Default)]
pub struct DateLocks {
    locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `date`. Entries nobody holds are dropped on the way.
    pub fn for_date(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = lock(&self.locks);
        locks.retain(|d, l| *d == date || Arc::strong_count(l) > 1);
        locks.entry(date).or_default().clone()
    }

    /// Dates with a live lock handle
    pub fn len(&self) -> usize {
        lock(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_same_date_same_lock() {
        let locks = DateLocks::new();
        let a = locks.for_date(d(1));
        let b = locks.for_date(d(1));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &locks.for_date(d(2))));
    }

    #[test]
    fn test_unheld_locks_are_pruned() {
        let locks = DateLocks::new();
        drop(locks.for_date(d(1)));
        drop(locks.for_date(d(2)));
        let _held = locks.for_date(d(3));
        assert_eq!(locks.len(), 1);
    }
}
