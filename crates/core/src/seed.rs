//! Draw seeding
//!
//! Production seeds mix the date with a server-side secret so tomorrow's draw
//! cannot be computed in advance. Tests inject a fixed seed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Result;
use crate::storage::{format_date, Database, SEED_SECRET_KEY};

/// Supplies the RNG seed for a date's draw
pub trait SeedSource: Send + Sync {
    fn seed_for(&self, date: NaiveDate) -> u64;

    fn rng_for(&self, date: NaiveDate) -> StdRng {
        StdRng::seed_from_u64(self.seed_for(date))
    }
}

/// `sha256(secret || date)`, first eight bytes big-endian
pub struct SecretSeed {
    secret: String,
}

impl SecretSeed {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Use the configured secret, else the one persisted in the database,
    /// generating and storing a fresh one on first run
    pub fn load_or_generate(db: &Database, configured: Option<&str>) -> Result<Self> {
        if let Some(secret) = configured {
            return Ok(Self::new(secret));
        }

        let mut generated = false;
        let secret = db.settings().get_or_insert_with(SEED_SECRET_KEY, || {
            generated = true;
            generate_secret()
        })?;
        if generated {
            info!("Generated new draw seed secret");
        }
        Ok(Self::new(secret))
    }
}

impl SeedSource for SecretSeed {
    fn seed_for(&self, date: NaiveDate) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(format_date(date).as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes)
    }
}

/// Same seed for every date
pub struct FixedSeed(pub u64);

impl SeedSource for FixedSeed {
    fn seed_for(&self, _date: NaiveDate) -> u64 {
        self.0
    }
}

/// 32 random bytes, URL-safe base64
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
