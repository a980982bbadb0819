//! Data-driven game balance
//!
//! One canonical constant set. Hosts may override individual values with a
//! JSON document; anything not mentioned keeps its default.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::highscores::MAX_NAME_LEN;

/// Every gameplay constant in one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Surface ===
    /// Logical drawing surface width
    pub surface_width: f32,
    /// Logical drawing surface height
    pub surface_height: f32,
    /// Height of the solid decorative ground strip at the bottom
    pub ground_height: f32,

    // === Player ===
    /// Fixed horizontal position of the player's left edge
    pub player_x: f32,
    /// Sprite width after scaling
    pub player_width: f32,
    /// Sprite height after scaling
    pub player_height: f32,
    /// Hitbox radius = min(width, height) / divisor
    pub hitbox_divisor: f32,
    /// Added to velocity every frame the activation is not held
    pub gravity: f32,
    /// Velocity while the activation is held (negative = up)
    pub lift: f32,

    // === Obstacles ===
    pub obstacle_width: f32,
    /// Vertical opening between the two members of a pair
    pub obstacle_gap: f32,
    /// Horizontal inset of the obstacle hitbox on each side
    pub obstacle_padding: f32,
    /// A new pair spawns once the newest one is this far from the right edge
    pub spawn_distance: f32,
    /// Smallest allowed gap-top offset
    pub gap_margin_top: f32,
    /// Space kept free below the lowest possible gap
    pub gap_margin_bottom: f32,
    pub base_speed: f32,
    pub speed_increment: f32,
    /// Speed goes up after every this-many spawned pairs
    pub speed_up_every: u32,

    // === Timing ===
    /// Simulation steps per second
    pub sim_hz: f32,
    /// Maximum simulation steps per display frame
    pub max_substeps: u32,
    /// No obstacles spawn during the first part of a run
    pub grace_period_ms: f64,
    /// Activation is ignored for this long after a game over
    pub restart_cooldown_ms: f64,
    /// How long a notice stays on screen
    pub notice_ms: f64,

    // === Idle animation ===
    pub idle_drift_amplitude: f32,
    pub idle_drift_step: f32,

    // === Leaderboard ===
    pub leaderboard_limit: u32,
    pub max_name_len: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            surface_width: 768.0,
            surface_height: 1024.0,
            ground_height: 86.0,

            player_x: 100.0,
            player_width: 158.0 * 0.6,
            player_height: 56.0 * 0.6,
            hitbox_divisor: 2.5,
            gravity: 0.5,
            lift: -7.0,

            obstacle_width: 120.0,
            obstacle_gap: 200.0,
            obstacle_padding: 15.0,
            spawn_distance: 400.0,
            gap_margin_top: 20.0,
            gap_margin_bottom: 50.0,
            base_speed: 4.0,
            speed_increment: 0.5,
            speed_up_every: 5,

            sim_hz: 60.0,
            max_substeps: 4,
            grace_period_ms: 2000.0,
            restart_cooldown_ms: 1000.0,
            notice_ms: 4000.0,

            idle_drift_amplitude: 5.0,
            idle_drift_step: 0.5,

            leaderboard_limit: 10,
            max_name_len: 10,
        }
    }
}

impl Tuning {
    /// Parse overrides from JSON and validate the result
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("surface_width", self.surface_width),
            ("surface_height", self.surface_height),
            ("ground_height", self.ground_height),
            ("player_width", self.player_width),
            ("player_height", self.player_height),
            ("hitbox_divisor", self.hitbox_divisor),
            ("obstacle_width", self.obstacle_width),
            ("obstacle_gap", self.obstacle_gap),
            ("base_speed", self.base_speed),
            ("sim_hz", self.sim_hz),
        ];
        for (field, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(TuningError::NotPositive { field });
            }
        }
        if self.speed_up_every == 0 {
            return Err(TuningError::NotPositive {
                field: "speed_up_every",
            });
        }
        if self.max_substeps == 0 {
            return Err(TuningError::NotPositive {
                field: "max_substeps",
            });
        }
        if self.obstacle_padding * 2.0 >= self.obstacle_width {
            return Err(TuningError::PaddingTooWide {
                padding: self.obstacle_padding,
                width: self.obstacle_width,
            });
        }
        let (lo, hi) = self.gap_offset_range();
        if lo > hi {
            return Err(TuningError::EmptyGapRange { min: lo, max: hi });
        }
        // The service rejects anything longer
        if self.max_name_len == 0 || self.max_name_len > MAX_NAME_LEN {
            return Err(TuningError::NameLength {
                len: self.max_name_len,
                max: MAX_NAME_LEN,
            });
        }
        Ok(())
    }

    /// Surface dimensions as a vector
    #[inline]
    pub fn surface(&self) -> Vec2 {
        Vec2::new(self.surface_width, self.surface_height)
    }

    /// Inclusive range for the gap-top offset of a new pair
    pub fn gap_offset_range(&self) -> (f32, f32) {
        (
            self.gap_margin_top,
            self.surface_height - self.obstacle_gap - self.gap_margin_bottom,
        )
    }

    /// y coordinate where the solid ground strip begins
    #[inline]
    pub fn floor_line(&self) -> f32 {
        self.surface_height - self.ground_height
    }

    /// Player y that centers the sprite vertically
    #[inline]
    pub fn player_start_y(&self) -> f32 {
        (self.surface_height - self.player_height) / 2.0
    }

    /// Number of steps the spawn grace period lasts
    pub fn grace_steps(&self) -> u64 {
        (self.grace_period_ms * self.sim_hz as f64 / 1000.0).round() as u64
    }

    /// Length of one simulation step in milliseconds
    #[inline]
    pub fn step_ms(&self) -> f64 {
        1000.0 / self.sim_hz as f64
    }
}
