//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through the frame delta handed to [`tick`]
//! - Seeded RNG only
//! - Deferred callbacks fire between update passes, never during one
//! - No rendering or platform dependencies

pub mod ball;
pub mod collision;
pub mod feedback;
pub mod level;
pub mod paddle;
pub mod powerup;
pub mod score;
pub mod state;
pub mod tick;
pub mod timer;

pub use ball::{Ball, BallStatus, paddle_bounce_angle, paddle_relative_position};
pub use collision::{Rect, circle_rect_collision};
pub use feedback::{ChallengeTag, FeedbackSink, GameEvent};
pub use level::{
    Boss, BossDef, BossPattern, Brick, BrickHit, BrickKind, Level, LevelDef, LevelManager,
    LevelPhase, LevelUpdate,
};
pub use paddle::{Laser, Paddle, PaddleUpgrade};
pub use powerup::{
    ActiveKey, ComboKind, ComboSpec, EffectKind, EffectSpec, EffectTarget, Pickup, PickupStatus,
    PowerupManager, PowerupTable,
};
pub use score::{AchievementKind, Progress, ScoreSystem, multiplier_for};
pub use state::{GamePhase, GameState, RngState};
pub use tick::{TickInput, tick};
pub use timer::{TimerHandle, TimerQueue};
