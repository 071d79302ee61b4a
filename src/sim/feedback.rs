//! Outbound notifications
//!
//! Components never reach into a shared game object. Anything the host shell should hear
//! about (game over, victory, cosmetic requests, challenge progress) goes through a
//! [`FeedbackSink`] passed in explicitly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::powerup::{ComboKind, EffectKind};
use super::score::AchievementKind;

/// Daily-challenge progress categories reported to the external tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeTag {
    Score,
    Bricks,
    Boss,
}

/// Everything the simulation reports to its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A ball left through the bottom edge
    BallLost { ball_id: u32 },
    /// No balls remain in play
    GameOver,
    LevelLoaded { number: u32 },
    LevelCompleted { number: u32 },
    /// Final level cleared
    Victory,
    BrickDestroyed { brick_id: u32, pos: Vec2 },
    BossDefeated,
    EffectActivated { effect: EffectKind },
    EffectExpired { effect: EffectKind },
    ComboEffectActivated { combo: ComboKind },
    ComboEffectExpired { combo: ComboKind },
    AchievementUnlocked { achievement: AchievementKind },
    ChallengeProgress { tag: ChallengeTag, amount: u32 },
    /// Cosmetic: screen shake
    Shake { magnitude: f32, duration_ms: f32 },
    /// Cosmetic: transient floating text
    Message { text: String },
    /// Cosmetic: particle burst
    Particles { pos: Vec2, count: u32 },
}

impl GameEvent {
    /// Presentation-only events with no bearing on simulation state
    pub fn is_cosmetic(&self) -> bool {
        matches!(
            self,
            GameEvent::Shake { .. } | GameEvent::Message { .. } | GameEvent::Particles { .. }
        )
    }
}

/// Fire-and-forget notification capability
pub trait FeedbackSink {
    fn emit(&mut self, event: GameEvent);

    fn notify_shake(&mut self, magnitude: f32, duration_ms: f32) {
        self.emit(GameEvent::Shake {
            magnitude,
            duration_ms,
        });
    }

    fn notify_message(&mut self, text: &str) {
        self.emit(GameEvent::Message {
            text: text.to_string(),
        });
    }

    fn notify_particles(&mut self, pos: Vec2, count: u32) {
        self.emit(GameEvent::Particles { pos, count });
    }
}

impl FeedbackSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}
