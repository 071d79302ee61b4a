//! Player settings and preferences
//!
//! Persisted separately from game progress through the host key-value store.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, load_json, save_json};
use crate::sim::GameEvent;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verbose collision diagnostics in the log (no gameplay effect)
    pub debug_mode: bool,

    // === Cosmetic feedback ===
    /// Screen shake on impacts and pickups
    pub screen_shake: bool,
    /// Particle bursts on brick destruction
    pub particles: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            screen_shake: true,
            particles: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "brick_rush_settings";

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Whether a cosmetic event should reach the presentation layer
    pub fn allows(&self, event: &GameEvent) -> bool {
        match event {
            GameEvent::Shake { .. } => self.effective_screen_shake(),
            GameEvent::Particles { .. } => self.particles,
            _ => true,
        }
    }

    /// Load settings, falling back to defaults on any storage failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_reduced_motion_suppresses_shake() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!settings.effective_screen_shake());
        assert!(!settings.allows(&GameEvent::Shake {
            magnitude: 3.0,
            duration_ms: 100.0
        }));
        assert!(settings.allows(&GameEvent::GameOver));
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            debug_mode: true,
            particles: false,
            ..Default::default()
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "][").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }
}
