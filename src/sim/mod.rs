//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod geometry;
pub mod state;
pub mod tick;

pub use collision::{Contact, circle_rect_hit, find_contact, hits_floor, is_terminal};
pub use geometry::{Circle, Rect};
pub use state::{ObstaclePair, Player, RngState, RunState};
pub use tick::{StepReport, TickInput, advance_obstacles, evict_offscreen, score_pass, step, tick};
