//! Score, coins, combo streak and achievements
//!
//! The combo multiplier is a pure step function of the combo count. Every hit reschedules
//! the decay timer, so the streak only resets after a full idle window.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::feedback::{ChallengeTag, FeedbackSink, GameEvent};
use super::timer::TimerQueue;
use crate::consts::*;
use crate::persistence::{KeyValueStore, load_json, save_json};

/// Storage key for coins and unlocked achievements
pub const PROGRESS_KEY: &str = "game_progress";

/// One-shot milestones, each granting a coin bonus when first reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AchievementKind {
    /// Score at least 100
    FirstBlood,
    /// Reach a 10-hit combo
    ComboMaster,
    /// Hold 1000 coins
    Billionaire,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 3] = [
        AchievementKind::FirstBlood,
        AchievementKind::ComboMaster,
        AchievementKind::Billionaire,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AchievementKind::FirstBlood => "First Blood! Scored 100 points",
            AchievementKind::ComboMaster => "Combo Master! Hit a 10 combo",
            AchievementKind::Billionaire => "Billionaire! Saved 1000 coins",
        }
    }

    fn reached(self, score: &ScoreSystem) -> bool {
        match self {
            AchievementKind::FirstBlood => score.total_score >= 100.0,
            AchievementKind::ComboMaster => score.max_combo >= 10,
            AchievementKind::Billionaire => score.coins >= 1000,
        }
    }
}

/// Persisted meta-progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub coins: u64,
    pub achievements: BTreeSet<AchievementKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
enum ScoreTimer {
    ComboDecay,
}

/// Combo multiplier for a given streak: +0.5 every 3 hits
pub fn multiplier_for(combo: u32) -> f64 {
    1.0 + f64::from(combo / 3) * 0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSystem {
    pub total_score: f64,
    pub coins: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub multiplier: f64,
    pub unlocked: BTreeSet<AchievementKind>,
    decay_ms: f64,
    timers: TimerQueue<ScoreTimer>,
    /// Coins or achievements changed since the last save
    #[serde(skip)]
    dirty: bool,
}

impl ScoreSystem {
    pub fn new(decay_ms: f64) -> Self {
        Self {
            total_score: 0.0,
            coins: 0,
            combo: 0,
            max_combo: 0,
            multiplier: 1.0,
            unlocked: BTreeSet::new(),
            decay_ms,
            timers: TimerQueue::new(),
            dirty: false,
        }
    }

    /// Clear the run (score, streak, pending decay). Coins and achievements carry over.
    pub fn reset(&mut self) {
        self.total_score = 0.0;
        self.combo = 0;
        self.max_combo = 0;
        self.multiplier = 1.0;
        self.timers.clear();
    }

    /// Award `base_points` scaled by the current streak; returns the points added
    pub fn add_score(&mut self, base_points: f64, fx: &mut dyn FeedbackSink) -> f64 {
        let combo_bonus = f64::from(self.combo / 5);
        let total = (base_points + combo_bonus) * self.multiplier;

        self.total_score += total;
        let earned = (total / 10.0).floor().max(0.0) as u64;
        if earned > 0 {
            self.coins += earned;
            self.dirty = true;
        }

        fx.emit(GameEvent::ChallengeProgress {
            tag: ChallengeTag::Score,
            amount: base_points.max(0.0) as u32,
        });
        self.check_achievements(fx);
        total
    }

    /// Extend the streak and restart the decay window
    pub fn register_hit(&mut self, fx: &mut dyn FeedbackSink) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.multiplier = multiplier_for(self.combo);
        self.timers.schedule(ScoreTimer::ComboDecay, self.decay_ms);
        self.check_achievements(fx);
    }

    /// Streak hit with on-screen feedback (paddle contacts)
    pub fn add_combo(&mut self, fx: &mut dyn FeedbackSink) {
        self.register_hit(fx);
        if self.combo > 1 {
            fx.notify_message(&format!("{} combo!", self.combo));
            if matches!(self.combo, 5 | 10 | 20) {
                fx.notify_shake(self.combo as f32 / 2.0, 300.0);
            }
        }
    }

    /// Advance the score clock; an uninterrupted decay window clears the streak
    pub fn advance_to(&mut self, now_ms: f64) {
        self.timers.advance_to(now_ms);
        while let Some((ScoreTimer::ComboDecay, _)) = self.timers.pop_due() {
            if self.combo > 0 {
                log::debug!("Combo of {} expired", self.combo);
            }
            self.combo = 0;
            self.multiplier = 1.0;
        }
    }

    pub fn combo_decay_pending(&self) -> bool {
        self.timers.is_pending(&ScoreTimer::ComboDecay)
    }

    /// Deduct coins if the balance covers `amount`
    pub fn spend_coins(&mut self, amount: u64) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        self.dirty = true;
        true
    }

    pub fn record_brick_break(&mut self, fx: &mut dyn FeedbackSink) {
        fx.emit(GameEvent::ChallengeProgress {
            tag: ChallengeTag::Bricks,
            amount: 1,
        });
    }

    pub fn record_boss_defeat(&mut self, fx: &mut dyn FeedbackSink) {
        fx.emit(GameEvent::ChallengeProgress {
            tag: ChallengeTag::Boss,
            amount: 1,
        });
    }

    pub fn is_unlocked(&self, kind: AchievementKind) -> bool {
        self.unlocked.contains(&kind)
    }

    fn check_achievements(&mut self, fx: &mut dyn FeedbackSink) {
        // A bonus can push coins over a later threshold in the same pass
        for kind in AchievementKind::ALL {
            if !self.unlocked.contains(&kind) && kind.reached(self) {
                self.unlocked.insert(kind);
                self.coins += ACHIEVEMENT_BONUS_COINS;
                self.dirty = true;
                log::info!("Achievement unlocked: {:?}", kind);
                fx.emit(GameEvent::AchievementUnlocked { achievement: kind });
                fx.notify_message(kind.label());
            }
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            coins: self.coins,
            achievements: self.unlocked.clone(),
        }
    }

    pub fn needs_save(&self) -> bool {
        self.dirty
    }

    /// Restore coins and achievements; storage failures leave the in-memory state as is
    pub fn load_progress(&mut self, store: &dyn KeyValueStore) {
        match load_json::<Progress>(store, PROGRESS_KEY) {
            Ok(Some(progress)) => {
                self.coins = progress.coins;
                self.unlocked = progress.achievements;
                log::info!(
                    "Progress loaded: {} coins, {} achievements",
                    self.coins,
                    self.unlocked.len()
                );
            }
            Ok(None) => {}
            Err(e) => log::warn!("Progress unreadable, starting fresh: {e}"),
        }
        self.dirty = false;
    }

    pub fn save_progress(&mut self, store: &mut dyn KeyValueStore) {
        match save_json(store, PROGRESS_KEY, &self.progress()) {
            Ok(()) => self.dirty = false,
            // Stays dirty so the next save point retries
            Err(e) => log::warn!("Progress not saved: {e}"),
        }
    }
}
