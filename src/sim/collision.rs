//! Collision detection
//!
//! The player is a circle; obstacles are padded rectangles. Circle-vs-rect
//! uses the closest point on the rectangle, which stays exact near corners
//! where a plain bounding-box overlap would report false hits.
//!
//! Nothing here mutates state. The state machine decides what a contact means.

use super::geometry::{Circle, Rect};
use super::state::RunState;
use crate::tuning::Tuning;

/// What the player ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Index of the pair in the run's obstacle sequence
    Obstacle { pair: usize },
    /// Ground strip or the bottom of the surface
    Floor,
}

/// Circle overlaps rectangle: squared distance from the center to the
/// closest point is strictly less than the squared radius. Exactly tangent is
/// not a hit.
pub fn circle_rect_hit(circle: &Circle, rect: &Rect) -> bool {
    let closest = rect.closest_point(circle.center);
    circle.center.distance_squared(closest) < circle.radius * circle.radius
}

/// Player's lower edge has reached the solid ground strip (or left the surface)
pub fn hits_floor(lower_edge: f32, surface_height: f32, ground_height: f32) -> bool {
    lower_edge >= surface_height || lower_edge >= surface_height - ground_height
}

/// First terminal contact in the current positions, if any
pub fn find_contact(run: &RunState, tuning: &Tuning) -> Option<Contact> {
    let lower = run.player.lower_edge(tuning);
    if hits_floor(lower, tuning.surface_height, tuning.ground_height) {
        return Some(Contact::Floor);
    }

    let hitbox = run.player.hitbox(tuning);
    run.obstacles
        .iter()
        .position(|pair| {
            pair.hitboxes(tuning)
                .iter()
                .any(|rect| circle_rect_hit(&hitbox, rect))
        })
        .map(|pair| Contact::Obstacle { pair })
}

/// Terminal signal for the state machine
#[inline]
pub fn is_terminal(run: &RunState, tuning: &Tuning) -> bool {
    find_contact(run, tuning).is_some()
}
