//! Application state management

use std::sync::{Arc, Mutex};

use aotd_core::boundary::today_in;
use aotd_core::{Config, Database, Result, Scheduler, SeedSource};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of the current instant
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Main application state
pub struct AppState {
    pub scheduler: Scheduler,
    pub config: Config,
    timezone: Tz,
    clock: Clock,
}

impl AppState {
    /// Open the configured database and build the scheduler
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.database_path()?;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let timezone = config.parse_timezone()?;
        let db = Arc::new(Mutex::new(Database::open(&db_path)?));
        let scheduler = Scheduler::from_config(db, &config)?;

        tracing::info!(path = %db_path.display(), %timezone, "Opened pool database");

        Ok(Self {
            scheduler,
            config,
            timezone,
            clock: Arc::new(Utc::now),
        })
    }

    /// Build around an already open database and an explicit seed
    pub fn with_parts(db: Database, config: Config, seed: Box<dyn SeedSource>) -> Result<Self> {
        let timezone = config.parse_timezone()?;
        let scheduler = Scheduler::new(Arc::new(Mutex::new(db)), &config, seed);
        Ok(Self {
            scheduler,
            config,
            timezone,
            clock: Arc::new(Utc::now),
        })
    }

    /// Replace the wall clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The current calendar date in the reference timezone
    pub fn today(&self) -> NaiveDate {
        today_in(self.timezone, self.now())
    }
}
