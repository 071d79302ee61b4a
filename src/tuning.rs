//! Data-driven game balance
//!
//! Static registries (levels, effects, combinations) are loaded once and handed to the
//! component constructors by reference; nothing reads them from global state.

use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::consts::*;
use crate::sim::level::{LevelDef, default_levels};
use crate::sim::powerup::PowerupTable;

/// Numeric tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Frame timing ===
    pub reference_frame_ms: f32,
    /// Larger deltas are treated as a stall
    pub max_frame_ms: f32,

    // === Ball ===
    pub ball_start_speed: f32,
    pub ball_speed_increment: f32,
    pub ball_max_speed: f32,

    // === Deferred timers ===
    pub combo_decay_ms: f64,
    pub combo_check_debounce_ms: f64,
    pub level_transition_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            reference_frame_ms: REFERENCE_FRAME_MS,
            max_frame_ms: MAX_FRAME_MS,
            ball_start_speed: BALL_START_SPEED,
            ball_speed_increment: BALL_SPEED_INCREMENT,
            ball_max_speed: BALL_MAX_SPEED,
            combo_decay_ms: COMBO_DECAY_MS,
            combo_check_debounce_ms: COMBO_CHECK_DEBOUNCE_MS,
            level_transition_ms: LEVEL_TRANSITION_MS,
        }
    }
}

/// Everything a game session is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub levels: Vec<LevelDef>,
    pub powerups: PowerupTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            levels: default_levels(),
            powerups: PowerupTable::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON configuration; omitted sections use the built-in tables
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let t = &self.tuning;
        if !(t.reference_frame_ms > 0.0) || !(t.max_frame_ms >= t.reference_frame_ms) {
            return Err(SimError::Config(format!(
                "frame timing out of range: reference {} ms, max {} ms",
                t.reference_frame_ms, t.max_frame_ms
            )));
        }
        if !(t.ball_start_speed > 0.0) || t.ball_max_speed < t.ball_start_speed {
            return Err(SimError::Config(format!(
                "ball speed out of range: start {}, max {}",
                t.ball_start_speed, t.ball_max_speed
            )));
        }
        if self.levels.is_empty() {
            return Err(SimError::Config("no levels defined".into()));
        }

        let mut numbers: Vec<u32> = self.levels.iter().map(|l| l.number).collect();
        numbers.sort_unstable();
        if let Some(dup) = numbers.windows(2).find(|w| w[0] == w[1]) {
            return Err(SimError::Config(format!("level {} defined twice", dup[0])));
        }
        for level in &self.levels {
            level.validate()?;
        }

        for combo in &self.powerups.combos {
            if combo.requires.is_empty() {
                return Err(SimError::Config(format!(
                    "combination {:?} requires no effects",
                    combo.kind
                )));
            }
            let untracked = combo
                .requires
                .iter()
                .filter(|k| self.powerups.duration(**k) <= 0.0)
                .count();
            if untracked > 0 {
                // Instant effects never enter the active set
                log::warn!(
                    "Combination {:?} needs {} instant effect(s) and will not trigger",
                    combo.kind,
                    untracked
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::powerup::EffectKind;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.levels.len(), 3);
        assert_eq!(config.powerups.duration(EffectKind::Laser), 8_000.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{"tuning":{"ball_max_speed":12.0}}"#).unwrap();
        assert_eq!(config.tuning.ball_max_speed, 12.0);
        assert_eq!(config.tuning.ball_start_speed, BALL_START_SPEED);
        assert_eq!(config.levels, default_levels());
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            GameConfig::from_json("{not json"),
            Err(SimError::Config(_))
        ));
        assert!(GameConfig::from_json(r#"{"levels":[]}"#).is_err());
        assert!(GameConfig::from_json(r#"{"tuning":{"reference_frame_ms":0.0}}"#).is_err());

        let dup = r##"{"levels":[
            {"number":1,"background":"#fff","layout":["1"]},
            {"number":1,"background":"#000","layout":["S"]}
        ]}"##;
        assert!(GameConfig::from_json(dup).is_err());

        let ragged = r##"{"levels":[{"number":4,"background":"#fff","layout":["11","1"]}]}"##;
        assert!(matches!(
            GameConfig::from_json(ragged),
            Err(SimError::InvalidLevel { number: 4, .. })
        ));
    }
}
