//! Game state and session lifecycle
//!
//! All state that must survive a save/restore lives here. Components own their own timers;
//! this type owns the shared clock and hands each component only the pieces it mutates.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::feedback::GameEvent;
use super::level::LevelManager;
use super::paddle::Paddle;
use super::powerup::{EffectTarget, PowerupManager};
use super::score::ScoreSystem;
use crate::persistence::KeyValueStore;
use crate::{Field, GameConfig, Settings, SimError};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Level installed, waiting for the start input
    Ready,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Last ball lost
    GameOver,
    /// Final level cleared
    Victory,
}

/// RNG state wrapper for serialization
///
/// Each draw site gets a fresh generator from the run seed and a monotonically increasing
/// stream counter, so a restored state replays the same sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::seed_from_u64(self.seed ^ self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.stream += 1;
        rng
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub config: GameConfig,
    pub settings: Settings,
    pub field: Field,
    pub phase: GamePhase,
    /// Simulation clock (ms), advanced by sanitized frame deltas while playing
    pub clock_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub paddle: Paddle,
    /// Balls in play (sorted by id)
    pub balls: Vec<Ball>,
    pub levels: LevelManager,
    pub powerups: PowerupManager,
    pub score: ScoreSystem,
    /// Outbound notifications not yet drained by the host
    #[serde(skip)]
    pub(crate) events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Build a session and install the first level
    pub fn new(seed: u64, config: GameConfig, settings: Settings) -> Result<Self, SimError> {
        let field = Field::default();
        let tuning = &config.tuning;
        let mut state = Self {
            seed,
            rng_state: RngState::new(seed),
            field,
            phase: GamePhase::Ready,
            clock_ms: 0.0,
            time_ticks: 0,
            paddle: Paddle::new(&field),
            balls: Vec::new(),
            levels: LevelManager::new(&config.levels, &config.powerups, tuning.level_transition_ms),
            powerups: PowerupManager::new(&config.powerups, tuning.combo_check_debounce_ms),
            score: ScoreSystem::new(tuning.combo_decay_ms),
            events: Vec::new(),
            next_id: 1,
            settings,
            config,
        };

        let first = state
            .levels
            .first_level()
            .ok_or_else(|| SimError::Config("no levels defined".into()))?;
        state.load_level(first)?;
        Ok(state)
    }

    /// Default configuration and settings
    pub fn with_seed(seed: u64) -> Result<Self, SimError> {
        Self::new(seed, GameConfig::default(), Settings::default())
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Fresh serve: power-ups reverted, one ball at the spawn point, paddle centered at base width
    pub fn reset_round(&mut self) {
        self.with_effect_target(|powerups, target, _| powerups.reset(target));
        let id = self.next_entity_id();
        let ball = Ball::new(id, &self.field, self.config.tuning.ball_start_speed);
        self.balls = vec![ball];
        self.paddle.reset(&self.field);
    }

    /// Install level `number` and reset the serve; the current level survives a failure
    pub fn load_level(&mut self, number: u32) -> Result<(), SimError> {
        let mut rng = self.rng_state.next_rng();
        self.levels
            .load_level(number, &self.field, &mut rng, &mut self.events)?;
        self.reset_round();
        Ok(())
    }

    /// Ready -> Playing; from a finished game this restarts first
    pub fn start_game(&mut self) -> Result<(), SimError> {
        match self.phase {
            GamePhase::Ready => {
                log::info!("Game started");
                self.phase = GamePhase::Playing;
            }
            GamePhase::GameOver | GamePhase::Victory => self.restart()?,
            GamePhase::Playing | GamePhase::Paused => {}
        }
        Ok(())
    }

    /// New run from the first level; coins and achievements carry over
    pub fn restart(&mut self) -> Result<(), SimError> {
        self.score.reset();
        let first = self
            .levels
            .first_level()
            .ok_or_else(|| SimError::Config("no levels defined".into()))?;
        self.load_level(first)?;
        self.phase = GamePhase::Playing;
        log::info!("Game restarted at level {}", first);
        Ok(())
    }

    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
        log::debug!("Phase now {:?}", self.phase);
    }

    /// Apply new field dimensions and re-derive percentage geometry
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.field = Field::new(width, height);
        self.paddle.resize(&self.field);
        for ball in &mut self.balls {
            ball.resize(&self.field);
        }
        self.levels.resize(&self.field);
    }

    /// Run `f` with the power-up manager and the state its effects mutate
    pub(crate) fn with_effect_target<R>(
        &mut self,
        f: impl FnOnce(&mut PowerupManager, &mut EffectTarget<'_>, &mut Vec<GameEvent>) -> R,
    ) -> R {
        let mut target = EffectTarget {
            paddle: &mut self.paddle,
            balls: &mut self.balls,
            field: self.field,
            next_id: &mut self.next_id,
        };
        f(&mut self.powerups, &mut target, &mut self.events)
    }

    /// Take pending events, dropping cosmetic ones the settings disable
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        let settings = &self.settings;
        self.events
            .drain(..)
            .filter(|e| settings.allows(e))
            .collect()
    }

    pub fn active_ball_count(&self) -> usize {
        self.balls.iter().filter(|b| b.active).count()
    }

    pub fn load_progress(&mut self, store: &dyn KeyValueStore) {
        self.score.load_progress(store);
    }

    /// Persist coins and achievements if they changed
    pub fn flush_progress(&mut self, store: &mut dyn KeyValueStore) {
        if self.score.needs_save() {
            self.score.save_progress(store);
        }
    }
}
