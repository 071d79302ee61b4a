//! Player paddle and its laser projectiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::Field;
use crate::consts::*;

/// Permanent paddle modifications applied by power-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddleUpgrade {
    Expand,
    Laser,
}

/// A laser beam growing upward from its emitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Laser {
    pub x: f32,
    /// Bottom edge of the beam
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub active: bool,
}

impl Laser {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y - self.height, self.width, self.height)
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Width restored on round reset and when an expand effect ends
    pub base_width: f32,
    /// Horizontal velocity per reference frame (keyboard/swipe inertia)
    pub velocity: f32,
    pub max_speed: f32,
    pub laser_enabled: bool,
    pub lasers: Vec<Laser>,
    pub max_lasers: usize,
    pub laser_width: f32,
    /// Brick health removed per laser impact
    pub laser_damage: u32,
}

impl Paddle {
    pub fn new(field: &Field) -> Self {
        let mut paddle = Self {
            x: 0.0,
            y: 0.0,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            base_width: PADDLE_WIDTH,
            velocity: 0.0,
            max_speed: PADDLE_MAX_SPEED,
            laser_enabled: false,
            lasers: Vec::new(),
            max_lasers: MAX_LASERS,
            laser_width: LASER_WIDTH,
            laser_damage: 1,
        };
        paddle.reset(field);
        paddle
    }

    /// Center the paddle at the bottom of the field with base width and no projectiles
    pub fn reset(&mut self, field: &Field) {
        self.width = self.base_width;
        self.x = field.width / 2.0 - self.width / 2.0;
        self.y = field.height - self.height - PADDLE_BOTTOM_MARGIN;
        self.velocity = 0.0;
        self.lasers.clear();
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Keyboard-style movement: -1 left, 1 right
    pub fn move_direction(&mut self, direction: f32) {
        self.velocity = direction.clamp(-1.0, 1.0) * self.max_speed;
    }

    /// Mouse-style direct mapping: center the paddle under the pointer
    pub fn follow_pointer(&mut self, pointer_x: f32, field: &Field) {
        self.x = pointer_x - self.width / 2.0;
        self.clamp_to_field(field);
    }

    /// Touch mapping: ease halfway toward the touch point each event
    pub fn follow_touch(&mut self, touch_x: f32, field: &Field) {
        let target = touch_x - self.width / 2.0;
        self.x += (target - self.x) * TOUCH_SMOOTHING;
        self.clamp_to_field(field);
    }

    /// Apply swipe inertia: move, decay, stop below threshold, stop at walls
    pub fn apply_inertia(&mut self, frame_scale: f32, field: &Field) {
        if self.velocity.abs() > PADDLE_STOP_THRESHOLD {
            self.x += self.velocity * frame_scale;
            self.velocity *= PADDLE_FRICTION.powf(frame_scale);
        } else {
            self.velocity = 0.0;
        }

        if self.clamp_to_field(field) {
            self.velocity = 0.0;
        }
    }

    /// Keep the paddle fully inside the field; returns true if it touched a wall
    pub fn clamp_to_field(&mut self, field: &Field) -> bool {
        let max_x = (field.width - self.width).max(0.0);
        if self.x < 0.0 {
            self.x = 0.0;
            true
        } else if self.x > max_x {
            self.x = max_x;
            true
        } else {
            false
        }
    }

    /// Apply a paddle upgrade, keeping the paddle on the field
    pub fn upgrade(&mut self, kind: PaddleUpgrade, field: &Field) -> bool {
        match kind {
            PaddleUpgrade::Expand => {
                let new_width =
                    (self.width * PADDLE_EXPAND_FACTOR).min(field.width * PADDLE_MAX_WIDTH_FRACTION);
                self.set_width_centered(new_width);
                log::debug!("Paddle expanded to {:.1}", self.width);
            }
            PaddleUpgrade::Laser => {
                self.laser_enabled = true;
                log::debug!("Paddle laser enabled");
            }
        }
        self.clamp_to_field(field);
        true
    }

    /// Return to base width, staying centered
    pub fn restore_width(&mut self, field: &Field) {
        self.set_width_centered(self.base_width);
        self.clamp_to_field(field);
    }

    fn set_width_centered(&mut self, width: f32) {
        let old = self.width;
        self.width = width;
        self.x -= (self.width - old) / 2.0;
    }

    /// Fire a symmetric pair of lasers. Fails when lasers are off or the cap is reached.
    pub fn fire_laser(&mut self) -> bool {
        if !self.laser_enabled || self.lasers.len() >= self.max_lasers {
            return false;
        }

        for offset in [LASER_LEFT_OFFSET, LASER_RIGHT_OFFSET] {
            self.lasers.push(Laser {
                x: self.x + self.width * offset,
                y: self.y,
                width: self.laser_width,
                height: 0.0,
                speed: LASER_SPEED,
                active: true,
            });
        }
        log::debug!("Lasers fired ({} live)", self.lasers.len());
        true
    }

    /// Advance inertia and projectiles by one frame
    pub fn update(&mut self, dt_ms: f32, reference_ms: f32, field: &Field) {
        let frame_scale = dt_ms / reference_ms;
        self.apply_inertia(frame_scale, field);

        for laser in &mut self.lasers {
            if laser.active {
                let step = laser.speed * frame_scale;
                laser.y -= step;
                laser.height += step;
                // Gone once the bottom edge clears the top of the field
                if laser.y < 0.0 {
                    laser.active = false;
                }
            }
        }
        self.lasers.retain(|l| l.active);
    }

    /// Re-anchor to the bottom edge of a resized field
    pub fn resize(&mut self, field: &Field) {
        self.y = field.height - self.height - PADDLE_BOTTOM_MARGIN;
        self.clamp_to_field(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Field {
        Field::new(600.0, 800.0)
    }

    #[test]
    fn test_reset_centers_paddle() {
        let paddle = Paddle::new(&field());
        assert_eq!(paddle.x, 250.0);
        assert_eq!(paddle.y, 800.0 - 15.0 - 10.0);
        assert_eq!(paddle.width, PADDLE_WIDTH);
    }

    #[test]
    fn test_inertia_decays_and_stops() {
        let mut paddle = Paddle::new(&field());
        paddle.move_direction(1.0);
        paddle.apply_inertia(1.0, &field());
        assert_eq!(paddle.x, 260.0);
        assert!((paddle.velocity - 9.0).abs() < 1e-5);

        for _ in 0..100 {
            paddle.apply_inertia(1.0, &field());
        }
        assert_eq!(paddle.velocity, 0.0);
    }

    #[test]
    fn test_inertia_decay_scales_with_frame() {
        let mut stepped = Paddle::new(&field());
        stepped.move_direction(1.0);
        stepped.apply_inertia(1.0, &field());
        stepped.apply_inertia(1.0, &field());

        let mut long_frame = Paddle::new(&field());
        long_frame.move_direction(1.0);
        long_frame.apply_inertia(2.0, &field());

        assert!((stepped.velocity - long_frame.velocity).abs() < 1e-4);
        assert!((long_frame.velocity - 8.1).abs() < 1e-4);
    }

    #[test]
    fn test_wall_contact_zeroes_velocity() {
        let mut paddle = Paddle::new(&field());
        paddle.x = 495.0;
        paddle.move_direction(1.0);
        paddle.apply_inertia(1.0, &field());
        assert_eq!(paddle.x, 500.0);
        assert_eq!(paddle.velocity, 0.0);

        paddle.x = 3.0;
        paddle.move_direction(-1.0);
        paddle.apply_inertia(1.0, &field());
        assert_eq!(paddle.x, 0.0);
        assert_eq!(paddle.velocity, 0.0);
    }

    #[test]
    fn test_pointer_and_touch_mapping() {
        let mut paddle = Paddle::new(&field());
        paddle.follow_pointer(100.0, &field());
        assert_eq!(paddle.x, 50.0);
        paddle.follow_pointer(10_000.0, &field());
        assert_eq!(paddle.x, 500.0);

        paddle.x = 100.0;
        paddle.follow_touch(450.0, &field());
        // Halfway from 100 to 400
        assert_eq!(paddle.x, 250.0);
    }

    #[test]
    fn test_expand_is_centered_and_capped() {
        let mut paddle = Paddle::new(&field());
        paddle.upgrade(PaddleUpgrade::Expand, &field());
        assert_eq!(paddle.width, 150.0);
        assert_eq!(paddle.x, 225.0);

        paddle.upgrade(PaddleUpgrade::Expand, &field());
        paddle.upgrade(PaddleUpgrade::Expand, &field());
        assert_eq!(paddle.width, 300.0);

        paddle.restore_width(&field());
        assert_eq!(paddle.width, PADDLE_WIDTH);
        assert!((paddle.center().x - 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_expand_near_wall_stays_inside() {
        let mut paddle = Paddle::new(&field());
        paddle.x = 0.0;
        paddle.upgrade(PaddleUpgrade::Expand, &field());
        assert_eq!(paddle.x, 0.0);
        paddle.x = 450.0;
        paddle.upgrade(PaddleUpgrade::Expand, &field());
        assert!(paddle.x + paddle.width <= 600.0);
    }

    #[test]
    fn test_fire_laser_requires_mode_and_respects_cap() {
        let mut paddle = Paddle::new(&field());
        assert!(!paddle.fire_laser());

        paddle.upgrade(PaddleUpgrade::Laser, &field());
        assert!(paddle.fire_laser());
        assert_eq!(paddle.lasers.len(), 2);
        assert_eq!(paddle.lasers[0].x, paddle.x + paddle.width * 0.2);
        assert_eq!(paddle.lasers[1].x, paddle.x + paddle.width * 0.8);

        assert!(paddle.fire_laser());
        assert!(paddle.fire_laser());
        assert_eq!(paddle.lasers.len(), 6);
        assert!(!paddle.fire_laser());
    }

    #[test]
    fn test_lasers_rise_grow_and_expire() {
        let mut paddle = Paddle::new(&field());
        paddle.upgrade(PaddleUpgrade::Laser, &field());
        paddle.fire_laser();
        paddle.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        let laser = &paddle.lasers[0];
        assert_eq!(laser.y, paddle.y - LASER_SPEED);
        assert_eq!(laser.height, LASER_SPEED);

        for _ in 0..200 {
            paddle.update(REFERENCE_FRAME_MS, REFERENCE_FRAME_MS, &field());
        }
        assert!(paddle.lasers.is_empty());
    }
}
