//! Local best score and remembered player name
//!
//! The best score is the only game state that outlives a run. It is read once
//! at startup and written synchronously when a run strictly beats it.

use crate::platform::storage::KeyValueStore;

const BEST_SCORE_KEY: &str = "highScore";
const BEST_SCORE_DATE_KEY: &str = "highScoreDate";
const PLAYER_NAME_KEY: &str = "playerName";

/// All-time best and when it was set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BestScore {
    pub value: u32,
    pub achieved_at: Option<String>,
}

pub struct BestScoreStore {
    storage: Box<dyn KeyValueStore>,
    best: BestScore,
}

impl BestScoreStore {
    /// Read the stored record; missing or unreadable values count as no record
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        let value = match storage.get(BEST_SCORE_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                log::warn!("Ignoring unreadable best score {:?}", raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("Could not read best score: {}", e);
                0
            }
        };
        let achieved_at = if value > 0 {
            storage.get(BEST_SCORE_DATE_KEY).ok().flatten()
        } else {
            None
        };

        log::info!("Best score on record: {}", value);
        Self {
            storage,
            best: BestScore { value, achieved_at },
        }
    }

    pub fn best(&self) -> &BestScore {
        &self.best
    }

    /// Keep `score` if it strictly beats the record. Returns true on a new
    /// record; the in-memory record updates even if persisting fails.
    pub fn record_run(&mut self, score: u32, achieved_at: String) -> bool {
        if score <= self.best.value {
            return false;
        }
        self.best = BestScore {
            value: score,
            achieved_at: Some(achieved_at),
        };

        let value = score.to_string();
        let date = self.best.achieved_at.as_deref().unwrap_or_default();
        if let Err(e) = self
            .storage
            .set(BEST_SCORE_KEY, &value)
            .and_then(|_| self.storage.set(BEST_SCORE_DATE_KEY, date))
        {
            log::warn!("Could not persist best score {}: {}", score, e);
        }
        true
    }

    /// Backing store, shared with other persisted preferences
    pub fn storage_mut(&mut self) -> &mut dyn KeyValueStore {
        self.storage.as_mut()
    }

    /// Name used for the last submission, to prefill the name input
    pub fn last_player_name(&self) -> Option<String> {
        self.storage
            .get(PLAYER_NAME_KEY)
            .ok()
            .flatten()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn remember_player_name(&mut self, name: &str) {
        if let Err(e) = self.storage.set(PLAYER_NAME_KEY, name) {
            log::warn!("Could not remember player name: {}", e);
        }
    }
}
