//! Cached eligibility per date, backing the odds popover
//!
//! The cache holds at most `capacity` dates and evicts the least recently used
//! one. Every invalidation bumps a generation counter; a result computed from a
//! snapshot taken before the bump is handed back to its caller but not stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::trace;

use super::locks::lock;
use crate::eligibility::Eligibility;

/// Dates kept by default
pub const DEFAULT_CAPACITY: usize = 64;

struct Cached {
    eligibility: Arc<Eligibility>,
    last_used: u64,
}

#[derive(Default)]
struct Entries {
    by_date: HashMap<NaiveDate, Cached>,
    generation: u64,
    clock: u64,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

pub struct ChanceCache {
    entries: Mutex<Entries>,
    capacity: usize,
}

impl Default for ChanceCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ChanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<Arc<Eligibility>> {
        let mut entries = lock(&self.entries);
        let now = entries.tick();
        let cached = entries.by_date.get_mut(&date)?;
        cached.last_used = now;
        Some(cached.eligibility.clone())
    }

    /// Current generation. Read it before taking the snapshot a result is built from.
    pub fn generation(&self) -> u64 {
        lock(&self.entries).generation
    }

    /// Store a result built from a snapshot read at `generation`.
    ///
    /// Results from an older generation are returned but not cached.
    pub fn insert(&self, eligibility: Eligibility, generation: u64) -> Arc<Eligibility> {
        let entry = Arc::new(eligibility);
        let mut entries = lock(&self.entries);

        if entries.generation != generation {
            trace!(date = %entry.date, "Skipping stale chance figures");
            return entry;
        }

        if !entries.by_date.contains_key(&entry.date) {
            while entries.by_date.len() >= self.capacity {
                let oldest = entries
                    .by_date
                    .iter()
                    .min_by_key(|(_, cached)| cached.last_used)
                    .map(|(date, _)| *date);
                match oldest {
                    Some(date) => {
                        entries.by_date.remove(&date);
                    }
                    None => break,
                }
            }
        }

        let now = entries.tick();
        entries.by_date.insert(
            entry.date,
            Cached {
                eligibility: entry.clone(),
                last_used: now,
            },
        );
        entry
    }

    /// Drop cached figures for dates in `[from, to]`
    pub fn invalidate_range(&self, from: NaiveDate, to: NaiveDate) {
        let mut entries = lock(&self.entries);
        let before = entries.by_date.len();
        entries.by_date.retain(|date, _| *date < from || *date > to);
        entries.generation += 1;
        trace!(%from, %to, dropped = before - entries.by_date.len(), "Invalidated chance cache");
    }

    pub fn clear(&self) {
        let mut entries = lock(&self.entries);
        entries.by_date.clear();
        entries.generation += 1;
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
