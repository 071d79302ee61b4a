//! Brick Rush - simulation core of a brick-breaking arcade game
//!
//! Core modules:
//! - `sim`: Ball physics, paddle, levels/boss, power-up scheduler, score & combo engine
//! - `tuning`: Data-driven game balance and static level/effect tables
//! - `settings`: Player preferences (debug mode, cosmetic toggles)
//! - `persistence`: Key-value storage boundary used for progress and settings
//!
//! Rendering, input wiring and the frame loop live in the host shell. The shell feeds
//! [`sim::TickInput`] and a frame delta into [`sim::tick`] and drains
//! [`sim::GameEvent`]s for presentation.

pub mod error;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use settings::Settings;
pub use tuning::{GameConfig, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference frame interval (ms); velocities are expressed per reference frame
    pub const REFERENCE_FRAME_MS: f32 = 16.67;
    /// Frame deltas above this are treated as a stall and replaced by the reference interval
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Default play field
    pub const FIELD_WIDTH: f32 = 600.0;
    pub const FIELD_HEIGHT: f32 = 800.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_START_SPEED: f32 = 5.0;
    pub const BALL_SPEED_INCREMENT: f32 = 0.05;
    pub const BALL_MAX_SPEED: f32 = 10.0;
    /// Ball spawns this far above the bottom edge
    pub const BALL_SPAWN_OFFSET: f32 = 60.0;
    pub const TRAIL_LENGTH: usize = 5;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 15.0;
    pub const PADDLE_BOTTOM_MARGIN: f32 = 10.0;
    pub const PADDLE_MAX_SPEED: f32 = 10.0;
    /// Multiplicative velocity decay per tick
    pub const PADDLE_FRICTION: f32 = 0.9;
    pub const PADDLE_STOP_THRESHOLD: f32 = 0.1;
    pub const PADDLE_EXPAND_FACTOR: f32 = 1.5;
    /// Expanded paddle never exceeds this fraction of the field width
    pub const PADDLE_MAX_WIDTH_FRACTION: f32 = 0.5;
    pub const TOUCH_SMOOTHING: f32 = 0.5;

    /// Laser projectiles
    pub const MAX_LASERS: usize = 5;
    pub const LASER_SPEED: f32 = 8.0;
    pub const LASER_WIDTH: f32 = 3.0;
    pub const SUPER_LASER_WIDTH: f32 = 25.0;
    /// Emitter positions as fractions of paddle width
    pub const LASER_LEFT_OFFSET: f32 = 0.2;
    pub const LASER_RIGHT_OFFSET: f32 = 0.8;

    /// Falling pickups
    pub const PICKUP_SIZE: f32 = 30.0;
    pub const PICKUP_FALL_SPEED: f32 = 3.0;

    /// Brick grid
    pub const BRICK_TOP_OFFSET: f32 = 60.0;
    pub const BRICK_ROW_SPACING: f32 = 40.0;
    pub const BRICK_HEIGHT: f32 = 30.0;
    pub const STEEL_HEALTH: u32 = 3;
    pub const BOSS_SEGMENT_HEALTH: u32 = 15;
    pub const BOSS_SEGMENT_WIDTH_PCT: f32 = 30.0;
    pub const BOSS_SEGMENT_HEIGHT: f32 = 50.0;

    /// Boss sweep (percent of field width)
    pub const BOSS_START_X_PCT: f32 = 35.0;
    pub const BOSS_MIN_X_PCT: f32 = 10.0;
    pub const BOSS_MAX_X_PCT: f32 = 70.0;
    pub const BOSS_WIDTH_PCT: f32 = 30.0;
    pub const BOSS_Y: f32 = 20.0;
    pub const BOSS_HEIGHT: f32 = 50.0;

    /// Scoring
    pub const BRICK_POINTS: f64 = 10.0;
    pub const BOSS_POINTS: f64 = 100.0;
    pub const ACHIEVEMENT_BONUS_COINS: u64 = 200;

    /// Deferred timers (ms)
    pub const COMBO_DECAY_MS: f64 = 3000.0;
    pub const COMBO_CHECK_DEBOUNCE_MS: f64 = 100.0;
    pub const LEVEL_TRANSITION_MS: f64 = 1000.0;
}

/// Play field dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: consts::FIELD_WIDTH,
            height: consts::FIELD_HEIGHT,
        }
    }
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Clamp a raw frame delta (ms) so a stalled tab cannot tunnel the ball through geometry
#[inline]
pub fn sanitize_frame_delta(dt_ms: f32, reference_ms: f32, max_ms: f32) -> f32 {
    if !dt_ms.is_finite() || dt_ms < 0.0 || dt_ms > max_ms {
        reference_ms
    } else {
        dt_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_frame_delta() {
        assert_eq!(sanitize_frame_delta(16.0, 16.67, 100.0), 16.0);
        assert_eq!(sanitize_frame_delta(5000.0, 16.67, 100.0), 16.67);
        assert_eq!(sanitize_frame_delta(f32::NAN, 16.67, 100.0), 16.67);
        assert_eq!(sanitize_frame_delta(-3.0, 16.67, 100.0), 16.67);
        assert_eq!(sanitize_frame_delta(100.0, 16.67, 100.0), 100.0);
    }
}
