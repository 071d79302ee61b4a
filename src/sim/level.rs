//! Levels, bricks and the boss
//!
//! Layouts are static declarative data (rows of type codes). Horizontal brick geometry is
//! stored as a percentage of the field width and re-derived on every load and resize;
//! heights and vertical offsets are fixed pixels.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::feedback::{FeedbackSink, GameEvent};
use super::powerup::{EffectKind, PowerupTable};
use super::timer::TimerQueue;
use crate::consts::*;
use crate::{Field, SimError};

/// Brick type, parsed from a layout code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrickKind {
    /// `1`
    Normal,
    /// `S`: three hits
    Steel,
    /// `P`: drops its attached power-up when destroyed
    PowerUp(EffectKind),
    /// `B`: wide, heavily armored
    BossSegment,
}

impl BrickKind {
    pub fn initial_health(self) -> u32 {
        match self {
            BrickKind::Normal | BrickKind::PowerUp(_) => 1,
            BrickKind::Steel => STEEL_HEALTH,
            BrickKind::BossSegment => BOSS_SEGMENT_HEALTH,
        }
    }
}

/// Result of one impact on a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickHit {
    Damaged { remaining: u32 },
    Destroyed,
    /// Brick was already gone
    Ignored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub kind: BrickKind,
    pub health: u32,
    pub active: bool,
    /// Left edge, percent of field width
    pub x_pct: f32,
    pub width_pct: f32,
    /// Derived pixel geometry
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Brick {
    /// Apply `damage`; deactivates exactly once when health reaches zero
    pub fn hit(&mut self, damage: u32) -> BrickHit {
        if !self.active {
            return BrickHit::Ignored;
        }
        self.health = self.health.saturating_sub(damage.max(1));
        if self.health == 0 {
            self.active = false;
            BrickHit::Destroyed
        } else {
            BrickHit::Damaged {
                remaining: self.health,
            }
        }
    }

    pub fn relayout(&mut self, field: &Field) {
        self.x = field.width * self.x_pct / 100.0;
        self.width = field.width * self.width_pct / 100.0;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Attached power-up, if any
    pub fn powerup(&self) -> Option<EffectKind> {
        match self.kind {
            BrickKind::PowerUp(effect) => Some(effect),
            _ => None,
        }
    }
}

/// Boss attack pattern identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BossPattern {
    LaserBarrage,
}

/// Boss descriptor in level data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossDef {
    pub health: u32,
    pub pattern: BossPattern,
    /// Percent of field width per reference frame
    pub move_speed: f32,
}

/// Static level definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub number: u32,
    /// Presentation token (background color)
    pub background: String,
    /// One string per row: `1` normal, `S` steel, `P` power-up, `B` boss segment, `0` empty
    pub layout: Vec<String>,
    #[serde(default)]
    pub boss: Option<BossDef>,
}

impl LevelDef {
    /// Reject empty, ragged or unknown-code layouts
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason: String| SimError::InvalidLevel {
            number: self.number,
            reason,
        };
        let cols = self
            .layout
            .first()
            .map(|row| row.chars().count())
            .unwrap_or(0);
        if cols == 0 {
            return Err(invalid("empty layout".into()));
        }
        for (row_index, row) in self.layout.iter().enumerate() {
            if row.chars().count() != cols {
                return Err(invalid(format!(
                    "row {row_index} has {} columns, expected {cols}",
                    row.chars().count()
                )));
            }
            if let Some(code) = row.chars().find(|c| !matches!(c, '0' | '1' | 'S' | 'P' | 'B')) {
                return Err(invalid(format!("unknown brick code '{code}' in row {row_index}")));
            }
        }
        if let Some(boss) = &self.boss {
            if boss.health == 0 {
                return Err(invalid("boss health must be positive".into()));
            }
        }
        Ok(())
    }
}

/// Built-in level table
pub fn default_levels() -> Vec<LevelDef> {
    let rows = |rows: &[&str]| -> Vec<String> { rows.iter().map(|r| r.to_string()).collect() };
    vec![
        LevelDef {
            number: 1,
            background: "#ffd1dc".into(),
            layout: rows(&["1111", "P00P", "1SS1"]),
            boss: None,
        },
        LevelDef {
            number: 2,
            background: "#ffb3ba".into(),
            layout: rows(&["S11S", "1PP1", "S11S"]),
            boss: None,
        },
        LevelDef {
            number: 5,
            background: "#ff8095".into(),
            layout: rows(&["BBB"]),
            boss: Some(BossDef {
                health: 100,
                pattern: BossPattern::LaserBarrage,
                move_speed: 2.0,
            }),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    /// Left edge, percent of field width
    pub x_pct: f32,
    pub y: f32,
    pub width_pct: f32,
    pub height: f32,
    pub health: u32,
    pub max_health: u32,
    pub pattern: BossPattern,
    pub move_speed: f32,
    /// +1 right, -1 left
    pub direction: f32,
}

impl Boss {
    pub fn new(def: &BossDef) -> Self {
        Self {
            x_pct: BOSS_START_X_PCT,
            y: BOSS_Y,
            width_pct: BOSS_WIDTH_PCT,
            height: BOSS_HEIGHT,
            health: def.health,
            max_health: def.health,
            pattern: def.pattern,
            move_speed: def.move_speed,
            direction: 1.0,
        }
    }

    /// Ping-pong sweep between the bound percentages
    pub fn update(&mut self, frame_scale: f32) {
        self.x_pct += self.direction * self.move_speed * frame_scale;
        if self.x_pct >= BOSS_MAX_X_PCT {
            self.x_pct = BOSS_MAX_X_PCT;
            self.direction = -1.0;
        } else if self.x_pct <= BOSS_MIN_X_PCT {
            self.x_pct = BOSS_MIN_X_PCT;
            self.direction = 1.0;
        }
    }

    pub fn rect(&self, field: &Field) -> Rect {
        Rect::new(
            field.width * self.x_pct / 100.0,
            self.y,
            field.width * self.width_pct / 100.0,
            self.height,
        )
    }

    /// Returns true when this impact defeats the boss
    pub fn hit(&mut self, damage: u32) -> bool {
        if self.health == 0 {
            return false;
        }
        self.health = self.health.saturating_sub(damage.max(1));
        self.health == 0
    }

    /// Health bar fill, relative to the configured health
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }
}

/// The installed level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub number: u32,
    pub background: String,
    pub bricks: Vec<Brick>,
    pub boss: Option<Boss>,
}

impl Level {
    /// Build bricks from a definition; power-up bricks draw their effect from `table`
    pub fn build(
        def: &LevelDef,
        table: &PowerupTable,
        field: &Field,
        rng: &mut impl Rng,
    ) -> Result<Self, SimError> {
        def.validate()?;
        let cols = def.layout[0].chars().count();
        let col_pct = 100.0 / cols as f32;

        let mut bricks = Vec::new();
        for (row, codes) in def.layout.iter().enumerate() {
            for (col, code) in codes.chars().enumerate() {
                let kind = match code {
                    '1' => BrickKind::Normal,
                    'S' => BrickKind::Steel,
                    'P' => match table.random_effect(rng) {
                        Some(effect) => BrickKind::PowerUp(effect),
                        None => BrickKind::Normal,
                    },
                    'B' => BrickKind::BossSegment,
                    _ => continue,
                };
                let (width_pct, height) = match kind {
                    BrickKind::BossSegment => (BOSS_SEGMENT_WIDTH_PCT, BOSS_SEGMENT_HEIGHT),
                    _ => (col_pct, BRICK_HEIGHT),
                };
                let mut brick = Brick {
                    id: bricks.len() as u32 + 1,
                    kind,
                    health: kind.initial_health(),
                    active: true,
                    x_pct: col as f32 * col_pct,
                    width_pct,
                    x: 0.0,
                    y: row as f32 * BRICK_ROW_SPACING + BRICK_TOP_OFFSET,
                    width: 0.0,
                    height,
                };
                brick.relayout(field);
                bricks.push(brick);
            }
        }

        Ok(Self {
            number: def.number,
            background: def.background.clone(),
            bricks,
            boss: def.boss.as_ref().map(Boss::new),
        })
    }

    pub fn active_brick_count(&self) -> usize {
        self.bricks.iter().filter(|b| b.active).count()
    }

    pub fn resize(&mut self, field: &Field) {
        for brick in &mut self.bricks {
            brick.relayout(field);
        }
    }
}

/// Per-level state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Nothing installed yet
    Empty,
    Loaded,
    /// Cleared; transition to the successor pending
    Completed,
    /// Final level cleared
    Victory,
}

/// What the owner must react to after a level update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelUpdate {
    Continue,
    /// Cleared; `next` loads after the transition delay
    Completed { next: u32 },
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
enum LevelTimer {
    Transition(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelManager {
    /// Definitions in ascending level number
    levels: Vec<LevelDef>,
    table: PowerupTable,
    transition_ms: f64,
    pub current: Option<Level>,
    pub phase: LevelPhase,
    timers: TimerQueue<LevelTimer>,
}

impl LevelManager {
    pub fn new(levels: &[LevelDef], table: &PowerupTable, transition_ms: f64) -> Self {
        let mut levels = levels.to_vec();
        levels.sort_by_key(|l| l.number);
        log::info!("Level manager ready with {} levels", levels.len());
        Self {
            levels,
            table: table.clone(),
            transition_ms,
            current: None,
            phase: LevelPhase::Empty,
            timers: TimerQueue::new(),
        }
    }

    pub fn first_level(&self) -> Option<u32> {
        self.levels.first().map(|l| l.number)
    }

    /// Next defined level after `number`
    pub fn successor(&self, number: u32) -> Option<u32> {
        self.levels
            .iter()
            .map(|l| l.number)
            .find(|&n| n > number)
    }

    pub fn current_number(&self) -> Option<u32> {
        self.current.as_ref().map(|l| l.number)
    }

    /// Install level `number`. On failure the current level is left untouched.
    pub fn load_level(
        &mut self,
        number: u32,
        field: &Field,
        rng: &mut impl Rng,
        fx: &mut dyn FeedbackSink,
    ) -> Result<(), SimError> {
        let Some(def) = self.levels.iter().find(|l| l.number == number) else {
            log::warn!("Level {} not found", number);
            return Err(SimError::LevelNotFound { number });
        };
        let level = Level::build(def, &self.table, field, rng)?;
        log::info!(
            "Level {} loaded with {} bricks{}",
            number,
            level.bricks.len(),
            if level.boss.is_some() { " and a boss" } else { "" }
        );

        self.current = Some(level);
        self.phase = LevelPhase::Loaded;
        self.timers.clear();
        fx.emit(GameEvent::LevelLoaded { number });
        Ok(())
    }

    pub fn resize(&mut self, field: &Field) {
        if let Some(level) = &mut self.current {
            level.resize(field);
        }
    }

    pub fn active_brick_count(&self) -> usize {
        self.current.as_ref().map_or(0, Level::active_brick_count)
    }

    pub fn bricks_mut(&mut self) -> &mut [Brick] {
        match &mut self.current {
            Some(level) => &mut level.bricks,
            None => &mut [],
        }
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.current.as_ref().and_then(|l| l.boss.as_ref())
    }

    pub fn boss_mut(&mut self) -> Option<&mut Boss> {
        self.current.as_mut().and_then(|l| l.boss.as_mut())
    }

    /// Remove a defeated boss
    pub fn clear_boss(&mut self) {
        if let Some(level) = &mut self.current {
            level.boss = None;
        }
    }

    /// Fire a due transition, installing the successor level
    pub fn advance_to(
        &mut self,
        now_ms: f64,
        field: &Field,
        rng: &mut impl Rng,
        fx: &mut dyn FeedbackSink,
    ) -> Option<u32> {
        self.timers.advance_to(now_ms);
        let mut advanced = None;
        while let Some((LevelTimer::Transition(next), _)) = self.timers.pop_due() {
            match self.load_level(next, field, rng, fx) {
                Ok(()) => advanced = Some(next),
                Err(e) => log::warn!("Level transition failed: {e}"),
            }
        }
        advanced
    }

    /// Completion check and boss motion, once per tick
    pub fn update(&mut self, frame_scale: f32, fx: &mut dyn FeedbackSink) -> LevelUpdate {
        if self.phase != LevelPhase::Loaded {
            return LevelUpdate::Continue;
        }
        let Some(number) = self.current_number() else {
            return LevelUpdate::Continue;
        };

        if let Some(boss) = self.boss_mut() {
            boss.update(frame_scale);
        }

        if self.active_brick_count() > 0 {
            return LevelUpdate::Continue;
        }

        fx.emit(GameEvent::LevelCompleted { number });
        match self.successor(number) {
            Some(next) => {
                log::info!("Level {} complete, loading {} shortly", number, next);
                self.phase = LevelPhase::Completed;
                self.timers
                    .schedule(LevelTimer::Transition(next), self.transition_ms);
                LevelUpdate::Completed { next }
            }
            None => {
                log::info!("Final level {} cleared", number);
                self.phase = LevelPhase::Victory;
                fx.emit(GameEvent::Victory);
                LevelUpdate::Victory
            }
        }
    }

    pub fn transition_pending(&self) -> bool {
        !self.timers.is_empty()
    }
}
