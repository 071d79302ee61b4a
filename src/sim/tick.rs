//! Per-frame simulation step
//!
//! Order within a tick: clamp the delta and advance the clock, fire due timers (effect
//! reverts, combo decay, level transitions), apply input, move paddle and balls, update
//! the level and boss, then run the collision-and-scoring pass.

use glam::Vec2;

use super::ball::BallStatus;
use super::feedback::{FeedbackSink, GameEvent};
use super::level::{Brick, BrickHit, LevelUpdate};
use super::powerup::PowerupManager;
use super::score::ScoreSystem;
use super::state::{GamePhase, GameState, RngState};
use crate::consts::*;
use crate::sanitize_frame_delta;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer x in field coordinates (paddle centers under it)
    pub pointer_x: Option<f32>,
    /// Touch x in field coordinates (paddle eases toward it)
    pub touch_x: Option<f32>,
    /// Keyboard direction: -1 left, 1 right, 0 none
    pub direction: f32,
    /// Fire lasers
    pub fire: bool,
    /// Start (or restart after game over / victory)
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one frame of `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    if input.pause {
        state.toggle_pause();
    }

    let mut input = input.clone();
    if input.idle_mode && state.phase != GamePhase::Playing && state.phase != GamePhase::Paused {
        input.start = true;
    }
    if input.start {
        if let Err(e) = state.start_game() {
            log::warn!("Could not start game: {e}");
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    let tuning = state.config.tuning.clone();
    let dt = sanitize_frame_delta(dt_ms, tuning.reference_frame_ms, tuning.max_frame_ms);
    if dt != dt_ms {
        log::debug!("Frame delta {:.1} ms clamped to {:.2} ms", dt_ms, dt);
    }
    let frame_scale = dt / tuning.reference_frame_ms;
    state.clock_ms += f64::from(dt);
    state.time_ticks += 1;

    fire_timers(state);

    if input.idle_mode {
        autopilot(state, &mut input);
    }
    apply_input(state, &input);

    // Paddle and balls move independently
    let field = state.field;
    state.paddle.update(dt, tuning.reference_frame_ms, &field);
    for ball in &mut state.balls {
        if ball.update(dt, tuning.reference_frame_ms, &field) == BallStatus::Lost {
            state.events.emit(GameEvent::BallLost { ball_id: ball.id });
        }
    }
    state.balls.retain(|b| b.active);
    if state.balls.is_empty() {
        state.phase = GamePhase::GameOver;
        log::info!(
            "Game over at level {:?} with score {}",
            state.levels.current_number(),
            state.score.total_score
        );
        state.events.emit(GameEvent::GameOver);
        return;
    }

    match state.levels.update(frame_scale, &mut state.events) {
        LevelUpdate::Victory => {
            state.phase = GamePhase::Victory;
            log::info!("Victory with score {}", state.score.total_score);
            return;
        }
        LevelUpdate::Completed { .. } | LevelUpdate::Continue => {}
    }

    let paddle_rect = state.paddle.rect();
    let collected = state.powerups.update_pickups(frame_scale, &field, &paddle_rect);
    for effect in collected {
        state.with_effect_target(|powerups, target, fx| powerups.activate(effect, target, fx));
    }

    resolve_ball_collisions(state);
    resolve_laser_collisions(state);
}

/// Run every deferred callback that came due, strictly before the update pass
fn fire_timers(state: &mut GameState) {
    let now = state.clock_ms;
    state.with_effect_target(|powerups, target, fx| powerups.advance_to(now, target, fx));
    state.score.advance_to(now);

    let field = state.field;
    let mut rng = state.rng_state.next_rng();
    if let Some(number) = state
        .levels
        .advance_to(now, &field, &mut rng, &mut state.events)
    {
        log::info!("Advanced to level {}", number);
        state.reset_round();
    }
}

/// Track the lowest descending ball and keep firing
fn autopilot(state: &GameState, input: &mut TickInput) {
    let target = state
        .balls
        .iter()
        .filter(|b| b.active && b.vel.y > 0.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .or_else(|| state.balls.iter().find(|b| b.active));

    if let Some(ball) = target {
        // Aim slightly off-center so bounces are not perfectly vertical
        let offset = if ball.vel.x >= 0.0 { -10.0 } else { 10.0 };
        input.pointer_x = Some(ball.pos.x + offset);
        input.touch_x = None;
        input.direction = 0.0;
    }
    input.fire = state.paddle.laser_enabled;
}

fn apply_input(state: &mut GameState, input: &TickInput) {
    let field = state.field;
    if let Some(x) = input.pointer_x {
        state.paddle.follow_pointer(x, &field);
    } else if let Some(x) = input.touch_x {
        state.paddle.follow_touch(x, &field);
    }
    if input.direction != 0.0 {
        state.paddle.move_direction(input.direction);
    }
    if input.fire && state.paddle.fire_laser() && state.settings.debug_mode {
        log::debug!("{} lasers live", state.paddle.lasers.len());
    }
}

/// Score bookkeeping and drops for a destroyed brick
fn on_brick_destroyed(
    brick: &Brick,
    score: &mut ScoreSystem,
    powerups: &mut PowerupManager,
    rng_state: &mut RngState,
    fx: &mut dyn FeedbackSink,
) {
    let center = brick.rect().center();
    fx.emit(GameEvent::BrickDestroyed {
        brick_id: brick.id,
        pos: center,
    });
    fx.notify_particles(center, 10);
    fx.notify_shake(3.0, 200.0);
    score.record_brick_break(fx);

    if let Some(effect) = brick.powerup() {
        let mut rng = rng_state.next_rng();
        powerups.spawn_pickup(brick.x, brick.y, Some(effect), &mut rng);
    }
}

fn on_boss_defeated(state: &mut GameState, pos: Vec2) {
    log::info!("Boss defeated");
    state.levels.clear_boss();
    state.score.add_score(BOSS_POINTS, &mut state.events);
    state.score.record_boss_defeat(&mut state.events);
    state.events.emit(GameEvent::BossDefeated);
    state.events.notify_particles(pos, 30);
    state.events.notify_shake(10.0, 500.0);
    state.events.notify_message("Boss defeated!");
}

/// Ball against paddle, bricks and boss: at most one brick response per ball per tick
fn resolve_ball_collisions(state: &mut GameState) {
    let paddle_rect = state.paddle.rect();
    let field = state.field;
    let increment = state.config.tuning.ball_speed_increment;
    let max_speed = state.config.tuning.ball_max_speed;
    let debug = state.settings.debug_mode;
    let mut boss_defeated_at = None;

    for ball in &mut state.balls {
        if !ball.active {
            continue;
        }

        if ball.collides_with(&paddle_rect) {
            let angle = ball.resolve_paddle_hit(&paddle_rect);
            if debug {
                log::debug!("Ball {} paddle hit, angle {:.1}°", ball.id, angle.to_degrees());
            }
            state.score.add_combo(&mut state.events);
            state.events.notify_shake(3.0, 100.0);
        }

        let mut brick_hit = false;
        for brick in state.levels.bricks_mut() {
            if !brick.active || !ball.collides_with(&brick.rect()) {
                continue;
            }
            let result = brick.hit(ball.damage);
            ball.resolve_brick_hit(&brick.rect(), increment, max_speed);
            if debug {
                log::debug!(
                    "Ball {} hit brick {} ({:?}), speed {:.2}",
                    ball.id,
                    brick.id,
                    result,
                    ball.speed
                );
            }
            state.score.add_score(BRICK_POINTS, &mut state.events);
            state.score.register_hit(&mut state.events);
            if result == BrickHit::Destroyed {
                on_brick_destroyed(
                    brick,
                    &mut state.score,
                    &mut state.powerups,
                    &mut state.rng_state,
                    &mut state.events,
                );
            }
            brick_hit = true;
            break;
        }

        if brick_hit || boss_defeated_at.is_some() {
            continue;
        }
        if let Some(boss) = state.levels.boss_mut() {
            let rect = boss.rect(&field);
            if ball.collides_with(&rect) {
                ball.resolve_brick_hit(&rect, increment, max_speed);
                let defeated = boss.hit(ball.damage);
                if debug {
                    log::debug!("Ball {} hit boss, health {}", ball.id, boss.health);
                }
                state.score.register_hit(&mut state.events);
                state.events.notify_shake(2.0, 100.0);
                if defeated {
                    boss_defeated_at = Some(rect.center());
                }
            }
        }
    }

    if let Some(pos) = boss_defeated_at {
        on_boss_defeated(state, pos);
    }
}

/// Lasers against bricks, then the boss; each beam stops at its first impact
fn resolve_laser_collisions(state: &mut GameState) {
    let field = state.field;
    let damage = state.paddle.laser_damage;
    let debug = state.settings.debug_mode;
    let mut boss_defeated_at = None;

    for laser in &mut state.paddle.lasers {
        if !laser.active {
            continue;
        }
        let beam = laser.rect();

        for brick in state.levels.bricks_mut() {
            if !brick.active || !brick.rect().overlaps(&beam) {
                continue;
            }
            laser.active = false;
            let result = brick.hit(damage);
            if debug {
                log::debug!("Laser hit brick {} ({:?})", brick.id, result);
            }
            if result == BrickHit::Destroyed {
                state.score.add_score(BRICK_POINTS, &mut state.events);
                on_brick_destroyed(
                    brick,
                    &mut state.score,
                    &mut state.powerups,
                    &mut state.rng_state,
                    &mut state.events,
                );
            }
            break;
        }

        if !laser.active || boss_defeated_at.is_some() {
            continue;
        }
        if let Some(boss) = state.levels.boss_mut() {
            let rect = boss.rect(&field);
            if rect.overlaps(&beam) {
                laser.active = false;
                if boss.hit(damage) {
                    boss_defeated_at = Some(rect.center());
                }
            }
        }
    }
    state.paddle.lasers.retain(|l| l.active);

    if let Some(pos) = boss_defeated_at {
        on_boss_defeated(state, pos);
    }
}
