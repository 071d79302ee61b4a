//! Power-up pickups and the timed effect scheduler
//!
//! Each effect applies immediately and, if it has a duration, registers a revert timer
//! under its own key. Re-collecting an active effect cancels the old revert before applying
//! again, so a revert can never run twice. When the active set covers a registered
//! combination, the combination takes over: the constituents' reverts are cancelled and
//! the combination's revert restores them along with its own mutation.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::collision::Rect;
use super::feedback::{FeedbackSink, GameEvent};
use super::paddle::{Paddle, PaddleUpgrade};
use super::timer::TimerQueue;
use crate::Field;
use crate::consts::*;

/// Individual power-up effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    ExtraBall,
    ExpandPaddle,
    Laser,
}

impl EffectKind {
    pub fn label(self) -> &'static str {
        match self {
            EffectKind::ExtraBall => "Extra ball!",
            EffectKind::ExpandPaddle => "Wide paddle!",
            EffectKind::Laser => "Laser ready!",
        }
    }

    fn apply(self, target: &mut EffectTarget<'_>) {
        match self {
            EffectKind::ExtraBall => target.spawn_mirrored_ball(),
            EffectKind::ExpandPaddle => {
                target.paddle.upgrade(PaddleUpgrade::Expand, &target.field);
            }
            EffectKind::Laser => {
                target.paddle.upgrade(PaddleUpgrade::Laser, &target.field);
            }
        }
    }

    fn revert(self, target: &mut EffectTarget<'_>) {
        match self {
            // Spawned balls stay in play
            EffectKind::ExtraBall => {}
            EffectKind::ExpandPaddle => target.paddle.restore_width(&target.field),
            EffectKind::Laser => target.paddle.laser_enabled = false,
        }
    }
}

/// Combination effects that supersede two or more active effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComboKind {
    /// Laser + ExpandPaddle: wide, double-damage beams
    SuperLaser,
    /// ExtraBall + Laser: bigger, double-damage balls
    BulletStorm,
}

impl ComboKind {
    pub fn label(self) -> &'static str {
        match self {
            ComboKind::SuperLaser => "Super Laser",
            ComboKind::BulletStorm => "Bullet Storm",
        }
    }

    fn apply(self, target: &mut EffectTarget<'_>) {
        match self {
            ComboKind::SuperLaser => {
                target.paddle.laser_width = SUPER_LASER_WIDTH;
                target.paddle.laser_damage = 2;
            }
            ComboKind::BulletStorm => {
                for ball in target.balls.iter_mut() {
                    ball.radius = BALL_RADIUS * 1.5;
                    ball.damage = 2;
                }
            }
        }
    }

    fn revert(self, target: &mut EffectTarget<'_>) {
        match self {
            ComboKind::SuperLaser => {
                target.paddle.laser_width = LASER_WIDTH;
                target.paddle.laser_damage = 1;
            }
            ComboKind::BulletStorm => {
                for ball in target.balls.iter_mut() {
                    ball.radius = BALL_RADIUS;
                    ball.damage = 1;
                }
            }
        }
    }
}

/// Registered effect type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    /// 0 = instant, never tracked
    pub duration_ms: f64,
}

/// Registered combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboSpec {
    pub kind: ComboKind,
    pub requires: Vec<EffectKind>,
    pub duration_ms: f64,
}

/// Static effect and combination registry. Combination order is detection priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupTable {
    pub effects: Vec<EffectSpec>,
    pub combos: Vec<ComboSpec>,
}

impl Default for PowerupTable {
    fn default() -> Self {
        Self {
            effects: vec![
                EffectSpec {
                    kind: EffectKind::ExtraBall,
                    duration_ms: 0.0,
                },
                EffectSpec {
                    kind: EffectKind::ExpandPaddle,
                    duration_ms: 10_000.0,
                },
                EffectSpec {
                    kind: EffectKind::Laser,
                    duration_ms: 8_000.0,
                },
            ],
            combos: vec![
                ComboSpec {
                    kind: ComboKind::SuperLaser,
                    requires: vec![EffectKind::Laser, EffectKind::ExpandPaddle],
                    duration_ms: 15_000.0,
                },
                ComboSpec {
                    kind: ComboKind::BulletStorm,
                    requires: vec![EffectKind::ExtraBall, EffectKind::Laser],
                    duration_ms: 10_000.0,
                },
            ],
        }
    }
}

impl PowerupTable {
    pub fn duration(&self, kind: EffectKind) -> f64 {
        self.effects
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.duration_ms)
            .unwrap_or(0.0)
    }

    pub fn combo(&self, kind: ComboKind) -> Option<&ComboSpec> {
        self.combos.iter().find(|c| c.kind == kind)
    }

    /// Uniform pick over the registered effects
    pub fn random_effect(&self, rng: &mut impl Rng) -> Option<EffectKind> {
        if self.effects.is_empty() {
            return None;
        }
        Some(self.effects[rng.random_range(0..self.effects.len())].kind)
    }
}

/// Identifier an active effect is tracked under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActiveKey {
    Effect(EffectKind),
    Combo(ComboKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
enum SchedulerKey {
    Revert(ActiveKey),
    /// Debounced combination detection after a pickup
    ComboCheck,
}

/// State the effects mutate
pub struct EffectTarget<'a> {
    pub paddle: &'a mut Paddle,
    pub balls: &'a mut Vec<Ball>,
    pub field: Field,
    /// Entity id allocator for spawned balls
    pub next_id: &'a mut u32,
}

impl EffectTarget<'_> {
    /// Second ball mirrored from the first live one, same speed
    fn spawn_mirrored_ball(&mut self) {
        let Some(primary) = self.balls.iter().find(|b| b.active) else {
            return;
        };
        let speed = primary.speed;
        let dir = Vec2::new(-primary.vel.x, -primary.vel.y.abs()).normalize_or(Vec2::NEG_Y);
        let (radius, damage) = (primary.radius, primary.damage);

        let id = *self.next_id;
        *self.next_id += 1;
        let mut ball = Ball::new(id, &self.field, speed);
        ball.vel = dir * speed;
        ball.radius = radius;
        ball.damage = damage;
        log::debug!("Extra ball {} spawned", id);
        self.balls.push(ball);
    }
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: EffectKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Fall speed per reference frame
    pub speed: f32,
    pub active: bool,
}

/// Outcome of one pickup update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupStatus {
    Falling,
    Collected(EffectKind),
    Missed,
    Inactive,
}

impl Pickup {
    pub fn new(kind: EffectKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            x,
            y,
            width: PICKUP_SIZE,
            height: PICKUP_SIZE,
            speed: PICKUP_FALL_SPEED,
            active: true,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn update(&mut self, frame_scale: f32, field: &Field, paddle: &Rect) -> PickupStatus {
        if !self.active {
            return PickupStatus::Inactive;
        }

        self.y += self.speed * frame_scale;

        if self.y > field.height {
            self.active = false;
            PickupStatus::Missed
        } else if self.rect().overlaps(paddle) {
            self.active = false;
            PickupStatus::Collected(self.kind)
        } else {
            PickupStatus::Falling
        }
    }
}

/// Owns falling pickups and the active effect timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupManager {
    table: PowerupTable,
    debounce_ms: f64,
    pub pickups: Vec<Pickup>,
    timers: TimerQueue<SchedulerKey>,
}

impl PowerupManager {
    pub fn new(table: &PowerupTable, debounce_ms: f64) -> Self {
        Self {
            table: table.clone(),
            debounce_ms,
            pickups: Vec::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn table(&self) -> &PowerupTable {
        &self.table
    }

    /// Drop a pickup; picks a random registered effect when none is given
    pub fn spawn_pickup(
        &mut self,
        x: f32,
        y: f32,
        kind: Option<EffectKind>,
        rng: &mut impl Rng,
    ) -> Option<EffectKind> {
        let kind = kind.or_else(|| self.table.random_effect(rng))?;
        self.pickups.push(Pickup::new(kind, x, y));
        log::debug!("Pickup {:?} spawned at ({:.1}, {:.1})", kind, x, y);
        Some(kind)
    }

    /// Move pickups; returns the effects collected by the paddle this frame
    pub fn update_pickups(
        &mut self,
        frame_scale: f32,
        field: &Field,
        paddle: &Rect,
    ) -> Vec<EffectKind> {
        let mut collected = Vec::new();
        for pickup in &mut self.pickups {
            if let PickupStatus::Collected(kind) = pickup.update(frame_scale, field, paddle) {
                collected.push(kind);
            }
        }
        self.pickups.retain(|p| p.active);
        collected
    }

    /// Currently active effects and combinations
    pub fn active_keys(&self) -> Vec<ActiveKey> {
        self.timers
            .keys()
            .filter_map(|k| match k {
                SchedulerKey::Revert(active) => Some(*active),
                SchedulerKey::ComboCheck => None,
            })
            .collect()
    }

    pub fn is_active(&self, key: ActiveKey) -> bool {
        self.timers.is_pending(&SchedulerKey::Revert(key))
    }

    /// Milliseconds left on an active effect
    pub fn remaining(&self, key: ActiveKey) -> Option<f64> {
        self.timers.remaining(&SchedulerKey::Revert(key))
    }

    fn active_effects(&self) -> BTreeSet<EffectKind> {
        self.active_keys()
            .into_iter()
            .filter_map(|k| match k {
                ActiveKey::Effect(kind) => Some(kind),
                ActiveKey::Combo(_) => None,
            })
            .collect()
    }

    /// True if a live combination owns `kind`
    fn covered_by_combo(&self, kind: EffectKind) -> bool {
        self.active_keys().into_iter().any(|k| match k {
            ActiveKey::Combo(combo) => self
                .table
                .combo(combo)
                .is_some_and(|spec| spec.requires.contains(&kind)),
            ActiveKey::Effect(_) => false,
        })
    }

    /// Apply an effect and schedule its revert
    pub fn activate(
        &mut self,
        kind: EffectKind,
        target: &mut EffectTarget<'_>,
        fx: &mut dyn FeedbackSink,
    ) {
        let key = SchedulerKey::Revert(ActiveKey::Effect(kind));
        if self.timers.cancel(&key).is_some() {
            log::debug!("Effect {:?} re-triggered, previous revert cancelled", kind);
        }

        kind.apply(target);

        let duration = self.table.duration(kind);
        if duration > 0.0 {
            self.timers.schedule(key, duration);
        }
        self.timers.schedule(SchedulerKey::ComboCheck, self.debounce_ms);

        log::info!("Effect {:?} activated", kind);
        fx.emit(GameEvent::EffectActivated { effect: kind });
        fx.notify_shake(5.0, 300.0);
        fx.notify_message(kind.label());
    }

    /// Trigger the first registered combination covered by the active effects
    pub fn check_combinations(
        &mut self,
        target: &mut EffectTarget<'_>,
        fx: &mut dyn FeedbackSink,
    ) -> Option<ComboKind> {
        let active = self.active_effects();
        let spec = self
            .table
            .combos
            .iter()
            .find(|c| c.requires.iter().all(|k| active.contains(k)))?
            .clone();
        self.activate_combo(&spec, target, fx);
        Some(spec.kind)
    }

    fn activate_combo(
        &mut self,
        spec: &ComboSpec,
        target: &mut EffectTarget<'_>,
        fx: &mut dyn FeedbackSink,
    ) {
        for kind in &spec.requires {
            self.timers
                .cancel(&SchedulerKey::Revert(ActiveKey::Effect(*kind)));
        }

        spec.kind.apply(target);
        self.timers.schedule(
            SchedulerKey::Revert(ActiveKey::Combo(spec.kind)),
            spec.duration_ms,
        );

        log::info!("COMBO! {} activated", spec.kind.label());
        fx.emit(GameEvent::ComboEffectActivated { combo: spec.kind });
        fx.notify_shake(5.0, 300.0);
        fx.notify_message(&format!("{} activated!", spec.kind.label()));
    }

    fn revert_effect(&mut self, kind: EffectKind, target: &mut EffectTarget<'_>) {
        // A live combination restores this effect when it ends
        if !self.covered_by_combo(kind) {
            kind.revert(target);
        }
    }

    fn revert_combo(&mut self, kind: ComboKind, target: &mut EffectTarget<'_>) {
        kind.revert(target);
        let Some(spec) = self.table.combo(kind).cloned() else {
            return;
        };
        for effect in spec.requires {
            if !self.is_active(ActiveKey::Effect(effect)) && !self.covered_by_combo(effect) {
                effect.revert(target);
            }
        }
    }

    /// Advance the effect clock and run every revert that has come due
    pub fn advance_to(
        &mut self,
        now_ms: f64,
        target: &mut EffectTarget<'_>,
        fx: &mut dyn FeedbackSink,
    ) {
        self.timers.advance_to(now_ms);
        while let Some((key, _)) = self.timers.pop_due() {
            match key {
                SchedulerKey::Revert(ActiveKey::Effect(kind)) => {
                    self.revert_effect(kind, target);
                    log::info!("Effect {:?} expired", kind);
                    fx.emit(GameEvent::EffectExpired { effect: kind });
                    self.check_combinations(target, fx);
                }
                SchedulerKey::Revert(ActiveKey::Combo(kind)) => {
                    self.revert_combo(kind, target);
                    log::info!("COMBO {} ended", kind.label());
                    fx.emit(GameEvent::ComboEffectExpired { combo: kind });
                    fx.notify_message(&format!("{} ended", kind.label()));
                }
                SchedulerKey::ComboCheck => {
                    self.check_combinations(target, fx);
                }
            }
        }
    }

    /// Cancel every pending revert, restore baseline state immediately, drop pickups
    pub fn reset(&mut self, target: &mut EffectTarget<'_>) {
        let active = self.active_keys();
        self.timers.clear();
        self.pickups.clear();

        for key in &active {
            match *key {
                ActiveKey::Effect(kind) => kind.revert(target),
                ActiveKey::Combo(combo) => {
                    combo.revert(target);
                    if let Some(spec) = self.table.combo(combo) {
                        for effect in &spec.requires {
                            if !active.contains(&ActiveKey::Effect(*effect)) {
                                effect.revert(target);
                            }
                        }
                    }
                }
            }
        }
        if !active.is_empty() {
            log::info!("Power-ups reset ({} effects reverted)", active.len());
        }
    }
}
