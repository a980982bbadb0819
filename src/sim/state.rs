//! Run state and core simulation types
//!
//! Everything a single run owns lives in [`RunState`]; the state machine holds
//! one and lends it to the tick, collision and render code.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, Rect};
use crate::tuning::Tuning;

/// The swimming player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Left edge; never changes during a run
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Vertical velocity per step (positive = down)
    pub velocity: f32,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.player_x,
            y: tuning.player_start_y(),
            velocity: 0.0,
        }
    }

    /// Sprite bounds
    pub fn bounds(&self, tuning: &Tuning) -> Rect {
        Rect::from_xywh(self.x, self.y, tuning.player_width, tuning.player_height)
    }

    /// Circular hitbox, a little smaller than the sprite
    pub fn hitbox(&self, tuning: &Tuning) -> Circle {
        let size = Vec2::new(tuning.player_width, tuning.player_height);
        Circle::new(
            Vec2::new(self.x, self.y) + size / 2.0,
            size.min_element() / tuning.hitbox_divisor,
        )
    }

    #[inline]
    pub fn leading_edge(&self, tuning: &Tuning) -> f32 {
        self.x + tuning.player_width
    }

    #[inline]
    pub fn lower_edge(&self, tuning: &Tuning) -> f32 {
        self.y + tuning.player_height
    }
}

/// Upper and lower obstacle spawned together around one gap
///
/// Both members share `x` and `gap_top` by construction, and the `scored` flag
/// covers the pair as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePair {
    /// Left edge of both obstacles
    pub x: f32,
    /// y where the upper obstacle ends and the gap begins
    pub gap_top: f32,
    pub scored: bool,
}

impl ObstaclePair {
    pub fn new(x: f32, gap_top: f32) -> Self {
        Self {
            x,
            gap_top,
            scored: false,
        }
    }

    /// Drawn upper obstacle, `[0, gap_top]`
    pub fn upper(&self, tuning: &Tuning) -> Rect {
        Rect::from_xywh(self.x, 0.0, tuning.obstacle_width, self.gap_top)
    }

    /// Drawn lower obstacle, `[gap_top + gap, surface_height]`
    pub fn lower(&self, tuning: &Tuning) -> Rect {
        let top = self.gap_bottom(tuning);
        Rect::from_xywh(
            self.x,
            top,
            tuning.obstacle_width,
            tuning.surface_height - top,
        )
    }

    #[inline]
    pub fn gap_bottom(&self, tuning: &Tuning) -> f32 {
        self.gap_top + tuning.obstacle_gap
    }

    /// Solid regions used for collisions, horizontally inset by the padding.
    /// The upper one has no top: hovering off the top of the screen does not
    /// clear a pair.
    pub fn hitboxes(&self, tuning: &Tuning) -> [Rect; 2] {
        let upper = Rect::new(
            Vec2::new(self.x, f32::MIN),
            Vec2::new(self.x + tuning.obstacle_width, self.gap_top),
        );
        [
            upper.inset_x(tuning.obstacle_padding),
            self.lower(tuning).inset_x(tuning.obstacle_padding),
        ]
    }

    /// x the player's leading edge must pass to score this pair
    #[inline]
    pub fn score_line(&self, tuning: &Tuning) -> f32 {
        self.x + tuning.obstacle_width / 2.0
    }

    /// Right edge
    #[inline]
    pub fn trailing_edge(&self, tuning: &Tuning) -> f32 {
        self.x + tuning.obstacle_width
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// One play session from start to terminal contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Seed this run's obstacles were generated from
    pub rng_state: RngState,
    #[serde(skip, default = "default_rng")]
    pub rng: Pcg32,
    pub player: Player,
    /// Oldest pair first
    pub obstacles: Vec<ObstaclePair>,
    pub score: u32,
    /// Current scroll speed (units per step)
    pub speed: f32,
    /// Pairs spawned so far this run
    pub pairs_spawned: u32,
    /// Simulated steps since the run began
    pub time_ticks: u64,
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl RunState {
    /// Fresh run: no obstacles, zero score, base speed, player centered
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            rng: rng_state.to_rng(),
            rng_state,
            player: Player::new(tuning),
            obstacles: Vec::new(),
            score: 0,
            speed: tuning.base_speed,
            pairs_spawned: 0,
            time_ticks: 0,
        }
    }

    /// Newest pair (rightmost)
    pub fn newest(&self) -> Option<&ObstaclePair> {
        self.obstacles.last()
    }

    /// Simulated milliseconds since the run began
    pub fn elapsed_ms(&self, tuning: &Tuning) -> f64 {
        self.time_ticks as f64 * tuning.step_ms()
    }

    /// Whether spawning is still suppressed at the start of the run
    pub fn in_grace_period(&self, tuning: &Tuning) -> bool {
        self.time_ticks < tuning.grace_steps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_reset() {
        let tuning = Tuning::default();
        let run = RunState::new(7, &tuning);
        assert_eq!(run.score, 0);
        assert!(run.obstacles.is_empty());
        assert_eq!(run.speed, tuning.base_speed);
        assert_eq!(run.player.velocity, 0.0);
        let centre = run.player.y + tuning.player_height / 2.0;
        assert!((centre - tuning.surface_height / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_pair_members_share_gap() {
        let tuning = Tuning::default();
        let pair = ObstaclePair::new(300.0, 150.0);
        let upper = pair.upper(&tuning);
        let lower = pair.lower(&tuning);
        assert_eq!(upper.min.x, lower.min.x);
        assert_eq!(upper.max.y, 150.0);
        assert_eq!(lower.min.y - upper.max.y, tuning.obstacle_gap);
        assert_eq!(lower.max.y, tuning.surface_height);
    }

    #[test]
    fn test_hitboxes_are_padded() {
        let tuning = Tuning::default();
        let pair = ObstaclePair::new(300.0, 150.0);
        let [upper, lower] = pair.hitboxes(&tuning);
        assert_eq!(upper.min.x, 315.0);
        assert_eq!(upper.max.x, 405.0);
        assert_eq!(upper.max.y, 150.0);
        assert_eq!(upper.min.y, f32::MIN);
        assert_eq!(lower.min.y, 350.0);
    }

    #[test]
    fn test_player_hitbox_radius() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let hitbox = player.hitbox(&tuning);
        assert!((hitbox.radius - tuning.player_height / 2.5).abs() < 1e-5);
    }
}
