//! Ball kinematics and collision response

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_3;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, circle_rect_collision};
use crate::Field;
use crate::consts::*;

/// Outcome of one ball update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallStatus {
    InPlay,
    /// Crossed the bottom edge this update (reported once per crossing)
    Lost,
    /// Already out of play
    Inactive,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    /// Velocity per reference frame
    pub vel: Vec2,
    /// Scalar speed; `vel.length()` tracks it
    pub speed: f32,
    pub radius: f32,
    /// Brick health removed per impact
    pub damage: u32,
    pub active: bool,
    /// Trail history for rendering (newest first)
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
}

impl Ball {
    pub fn new(id: u32, field: &Field, start_speed: f32) -> Self {
        let mut ball = Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            speed: start_speed,
            radius: BALL_RADIUS,
            damage: 1,
            active: true,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        };
        ball.reset(field, start_speed);
        ball
    }

    /// Back to the serve position, heading straight up
    pub fn reset(&mut self, field: &Field, start_speed: f32) {
        self.pos = Vec2::new(field.width / 2.0, field.height - BALL_SPAWN_OFFSET);
        self.speed = start_speed;
        self.vel = Vec2::new(0.0, -start_speed);
        self.radius = BALL_RADIUS;
        self.damage = 1;
        self.active = true;
        self.trail.clear();
    }

    /// Integrate one frame; `dt_ms` is normalized against the reference frame interval
    pub fn update(&mut self, dt_ms: f32, reference_ms: f32, field: &Field) -> BallStatus {
        if !self.active {
            return BallStatus::Inactive;
        }

        self.pos += self.vel * (dt_ms / reference_ms);
        self.record_trail();
        self.check_boundaries(field)
    }

    /// Record current position to trail
    pub fn record_trail(&mut self) {
        self.trail.push_front(self.pos);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_back();
        }
    }

    /// Keep the circle inside the left/right/top walls; deactivate below the bottom edge
    pub fn check_boundaries(&mut self, field: &Field) -> BallStatus {
        if self.pos.x - self.radius <= 0.0 {
            self.pos.x = self.radius;
            self.vel.x = self.vel.x.abs();
        } else if self.pos.x + self.radius >= field.width {
            self.pos.x = field.width - self.radius;
            self.vel.x = -self.vel.x.abs();
        }

        if self.pos.y - self.radius <= 0.0 {
            self.pos.y = self.radius;
            self.vel.y = self.vel.y.abs();
        }

        if self.pos.y + self.radius > field.height {
            self.active = false;
            log::info!(
                "Ball {} lost at ({:.1}, {:.1})",
                self.id,
                self.pos.x,
                self.pos.y
            );
            return BallStatus::Lost;
        }

        BallStatus::InPlay
    }

    /// Circle vs rectangle overlap; false for malformed targets
    pub fn collides_with(&self, rect: &Rect) -> bool {
        if !rect.is_valid() {
            log::warn!("Collision test rejected malformed target {:?}", rect);
            return false;
        }
        circle_rect_collision(self.pos, self.radius, rect)
    }

    /// Bounce off the paddle with an angle set by where it struck
    ///
    /// Returns the bounce angle in radians (0 = straight up, positive = right).
    pub fn resolve_paddle_hit(&mut self, paddle: &Rect) -> f32 {
        let angle = paddle_bounce_angle(self.pos.x, paddle);

        self.vel = Vec2::new(self.speed * angle.sin(), -self.speed * angle.cos());
        // Always leave upward
        self.vel.y = -self.vel.y.abs();
        // Sit on top of the paddle so the next tick cannot re-penetrate
        self.pos.y = paddle.y - self.radius;

        angle
    }

    /// Bounce off a brick and speed up slightly
    pub fn resolve_brick_hit(&mut self, brick: &Rect, increment: f32, max_speed: f32) {
        let mid_y = brick.y + brick.height / 2.0;
        if self.pos.y != mid_y {
            self.vel.y = -self.vel.y;
        } else {
            self.vel.x = -self.vel.x;
        }

        if self.speed < max_speed {
            self.speed = (self.speed + increment).min(max_speed);
        }
        self.vel = self.vel.normalize_or(Vec2::NEG_Y) * self.speed;
    }

    /// Keep the ball inside a resized field
    pub fn resize(&mut self, field: &Field) {
        self.pos.x = self.pos.x.min(field.width - self.radius);
        self.pos.y = self.pos.y.min(field.height - self.radius);
    }
}

/// Relative hit position across the paddle, -1 (left edge) to 1 (right edge)
pub fn paddle_relative_position(ball_x: f32, paddle: &Rect) -> f32 {
    let half = paddle.width / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    ((ball_x - (paddle.x + half)) / half).clamp(-1.0, 1.0)
}

/// Bounce angle for a paddle hit: relative position scaled to ±60°
pub fn paddle_bounce_angle(ball_x: f32, paddle: &Rect) -> f32 {
    paddle_relative_position(ball_x, paddle) * FRAC_PI_3
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> Field {
        Field::new(600.0, 800.0)
    }

    #[test]
    fn test_reset_position_and_velocity() {
        let ball = Ball::new(1, &field(), 5.0);
        assert_eq!(ball.pos, Vec2::new(300.0, 740.0));
        assert_eq!(ball.vel, Vec2::new(0.0, -5.0));
        assert!(ball.active);
    }

    #[test]
    fn test_update_is_frame_rate_independent() {
        let mut a = Ball::new(1, &field(), 5.0);
        let mut b = Ball::new(2, &field(), 5.0);
        a.update(REFERENCE_FRAME_MS * 2.0, REFERENCE_FRAME_MS, &field());
        b.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        b.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        assert!((a.pos - b.pos).length() < 1e-3);
    }

    #[test]
    fn test_trail_is_bounded() {
        let mut ball = Ball::new(1, &field(), 5.0);
        for _ in 0..20 {
            ball.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        }
        assert_eq!(ball.trail.len(), TRAIL_LENGTH);
        assert_eq!(ball.trail[0], ball.pos);
    }

    #[test]
    fn test_wall_reflection() {
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(3.0, 300.0);
        ball.vel = Vec2::new(-3.0, -4.0);
        assert_eq!(ball.check_boundaries(&field()), BallStatus::InPlay);
        assert_eq!(ball.pos.x, ball.radius);
        assert_eq!(ball.vel.x, 3.0);

        ball.pos = Vec2::new(598.0, 300.0);
        ball.check_boundaries(&field());
        assert_eq!(ball.pos.x, 600.0 - ball.radius);
        assert_eq!(ball.vel.x, -3.0);

        ball.pos = Vec2::new(300.0, 2.0);
        ball.check_boundaries(&field());
        assert_eq!(ball.pos.y, ball.radius);
        assert_eq!(ball.vel.y, 4.0);
    }

    #[test]
    fn test_bottom_exit_signals_once() {
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(300.0, 790.0);
        ball.vel = Vec2::new(0.0, 5.0);
        let first = ball.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        let second = ball.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        assert_eq!(first, BallStatus::Lost);
        assert_eq!(second, BallStatus::Inactive);
        assert!(!ball.active);
    }

    #[test]
    fn test_paddle_center_hit_goes_straight_up() {
        let paddle = Rect::new(250.0, 775.0, 100.0, 15.0);
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(300.0, 770.0);
        ball.vel = Vec2::new(2.0, 4.0);
        let angle = ball.resolve_paddle_hit(&paddle);
        assert!(angle.abs() < 1e-6);
        assert!(ball.vel.x.abs() < 1e-5);
        assert!((ball.vel.y + 5.0).abs() < 1e-5);
        assert_eq!(ball.pos.y, 775.0 - ball.radius);
    }

    #[test]
    fn test_paddle_edge_hit_is_sixty_degrees() {
        let paddle = Rect::new(250.0, 775.0, 100.0, 15.0);
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(350.0, 770.0);
        let angle = ball.resolve_paddle_hit(&paddle);
        assert!((angle.to_degrees() - 60.0).abs() < 1e-3);
        assert!(ball.vel.x > 0.0);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_brick_hit_flips_vertical_and_speeds_up() {
        let brick = Rect::new(100.0, 100.0, 60.0, 30.0);
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(130.0, 136.0);
        ball.vel = Vec2::new(3.0, -4.0);
        ball.resolve_brick_hit(&brick, BALL_SPEED_INCREMENT, BALL_MAX_SPEED);
        assert!(ball.vel.y > 0.0);
        assert!(ball.vel.x > 0.0);
        assert!((ball.speed - 5.05).abs() < 1e-5);
        assert!((ball.vel.length() - ball.speed).abs() < 1e-4);
    }

    #[test]
    fn test_brick_hit_at_midline_flips_horizontal() {
        let brick = Rect::new(100.0, 100.0, 60.0, 30.0);
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(95.0, 115.0);
        ball.vel = Vec2::new(3.0, -4.0);
        ball.resolve_brick_hit(&brick, BALL_SPEED_INCREMENT, BALL_MAX_SPEED);
        assert!(ball.vel.x < 0.0);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_speed_cap() {
        let brick = Rect::new(100.0, 100.0, 60.0, 30.0);
        let mut ball = Ball::new(1, &field(), 5.0);
        ball.pos = Vec2::new(130.0, 140.0);
        for _ in 0..500 {
            ball.resolve_brick_hit(&brick, BALL_SPEED_INCREMENT, BALL_MAX_SPEED);
        }
        assert_eq!(ball.speed, BALL_MAX_SPEED);
    }

    #[test]
    fn test_malformed_target_is_no_hit() {
        let ball = Ball::new(1, &field(), 5.0);
        assert!(!ball.collides_with(&Rect::new(f32::NAN, f32::NAN, 10.0, 10.0)));
    }

    proptest! {
        #[test]
        fn prop_paddle_bounce_angle_and_direction(r in -1.0f32..=1.0, speed in 1.0f32..10.0) {
            let paddle = Rect::new(200.0, 775.0, 120.0, 15.0);
            let mut ball = Ball::new(1, &field(), speed);
            ball.pos = Vec2::new(paddle.x + paddle.width / 2.0 + r * paddle.width / 2.0, 770.0);
            ball.vel = Vec2::new(1.0, speed);
            let angle = ball.resolve_paddle_hit(&paddle);
            prop_assert!((angle - r * FRAC_PI_3).abs() < 1e-4);
            prop_assert!(ball.vel.y < 0.0);
            prop_assert!((ball.vel.length() - speed).abs() < 1e-3);
        }

        #[test]
        fn prop_brick_hits_never_slow_down_or_exceed_cap(
            hits in 1usize..300, y_offset in -20.0f32..20.0
        ) {
            let brick = Rect::new(100.0, 100.0, 60.0, 30.0);
            let mut ball = Ball::new(1, &field(), BALL_START_SPEED);
            ball.pos = Vec2::new(130.0, 115.0 + y_offset);
            let mut last = ball.speed;
            for _ in 0..hits {
                ball.resolve_brick_hit(&brick, BALL_SPEED_INCREMENT, BALL_MAX_SPEED);
                prop_assert!(ball.speed >= last);
                prop_assert!(ball.speed <= BALL_MAX_SPEED);
                last = ball.speed;
            }
        }
    }
}
