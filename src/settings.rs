//! Player preferences
//!
//! Persisted separately from the best score, as JSON in key-value storage.

use serde::{Deserialize, Serialize};

use crate::platform::storage::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Draw collision shapes on top of the scene
    pub show_hitboxes: bool,
    /// Gentle up/down bobbing of the player while idle
    pub idle_drift: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_hitboxes: false,
            idle_drift: true,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "el_vis_settings";

    /// Load settings, falling back to defaults on missing or corrupt data
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        if let Ok(Some(json)) = storage.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from storage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, storage: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => match storage.set(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Could not save settings: {}", e),
            },
            Err(e) => log::warn!("Could not encode settings: {}", e),
        }
    }
}
