//! Local best score
//!
//! Persisted as a plain decimal string under one key. Anything unreadable
//! counts as no score yet.

use crate::consts::HIGH_SCORE_KEY;
use crate::platform::{KeyValueStore, StorageError};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HighScore {
    pub best: f32,
}

impl HighScore {
    /// Parse a stored value; missing, garbage, negative or non-finite -> 0
    pub fn parse(raw: Option<&str>) -> f32 {
        raw.and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }

    /// Load from the store, logging and falling back to 0 on failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let best = match store.get(HIGH_SCORE_KEY) {
            Ok(raw) => Self::parse(raw.as_deref()),
            Err(e) => {
                log::warn!("Could not read high score: {}", e);
                0.0
            }
        };
        log::info!("Loaded high score {}", best);
        Self { best }
    }

    /// Raise the best score; true if it changed
    pub fn submit(&mut self, score: f32) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        store.set(HIGH_SCORE_KEY, &self.best.to_string())?;
        log::info!("High score saved ({})", self.best);
        Ok(())
    }
}
