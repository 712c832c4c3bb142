//! AOtD Core Library
//!
//! Models, SQLite storage, outage ledger, eligibility evaluation and the daily
//! selector for the Album of the Day scheduler.

pub mod boundary;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod ledger;
pub mod models;
pub mod permissions;
pub mod seed;
pub mod selector;
pub mod storage;

pub use config::Config;
pub use eligibility::{BlockReason, BlockType, Eligibility, EligibilityEvaluator, RecencyDecay};
pub use error::{Error, Result};
pub use ledger::OutageLedger;
pub use models::*;
pub use permissions::*;
pub use seed::{FixedSeed, SecretSeed, SeedSource};
pub use selector::Scheduler;
pub use storage::{Database, OutageRepository, PoolRepository, SelectionRepository};
