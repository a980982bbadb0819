//! Scene composition
//!
//! Draw order is fixed so later layers cover earlier ones:
//! background → obstacles → ground → player → score → leaderboard (idle) →
//! game-over overlay → debug hitboxes.

use std::f32::consts::PI;

use glam::Vec2;

use super::{Color, Sprite, Surface, TextStyle};
use crate::game::Phase;
use crate::highscores::LeaderboardEntry;
use crate::sim::geometry::Rect;
use crate::sim::state::RunState;
use crate::tuning::Tuning;

/// Tilt while lifting
const LIFT_TILT: f32 = -20.0 * PI / 180.0;
/// Steepest nose-down tilt
const MAX_DIVE_TILT: f32 = PI / 2.0;
/// Falling speed at which the dive tilt is reached
const DIVE_REFERENCE_SPEED: f32 = 10.0;
const LEADERBOARD_ROWS: usize = 10;

/// Everything one frame draws; borrowed from the state machine
pub struct FrameView<'a> {
    pub phase: Phase,
    pub run: &'a RunState,
    pub activation_held: bool,
    /// Idle bobbing added to the drawn player y
    pub player_offset: f32,
    /// Scroll position of the ground strip, in `(-tile, 0]`
    pub ground_offset: f32,
    pub leaderboard: &'a [LeaderboardEntry],
    pub best_score: u32,
    pub show_hitboxes: bool,
}

/// Sprite rotation in radians (clockwise positive)
pub fn player_tilt(velocity: f32, activation_held: bool) -> f32 {
    if activation_held {
        LIFT_TILT
    } else if velocity > 0.0 {
        (velocity / DIVE_REFERENCE_SPEED).min(1.0) * MAX_DIVE_TILT
    } else {
        0.0
    }
}

/// Width of one ground tile at the tuned strip height
pub fn ground_tile_width(tuning: &Tuning) -> f32 {
    let native = Sprite::Ground.native_size();
    native.x * tuning.ground_height / native.y
}

pub fn render_frame(surface: &mut dyn Surface, view: &FrameView<'_>, tuning: &Tuning) {
    let size = tuning.surface();
    let center_x = size.x / 2.0;

    surface.draw_sprite(Sprite::Background, Rect::from_xywh(0.0, 0.0, size.x, size.y));

    // Both members use the full-height image, cut off by the gap
    for pair in &view.run.obstacles {
        surface.draw_sprite(
            Sprite::Obstacle,
            Rect::from_xywh(pair.x, pair.gap_top - size.y, tuning.obstacle_width, size.y),
        );
        surface.draw_sprite(
            Sprite::Obstacle,
            Rect::from_xywh(pair.x, pair.gap_bottom(tuning), tuning.obstacle_width, size.y),
        );
    }

    draw_ground(surface, view.ground_offset, tuning);
    draw_player(surface, view, tuning);

    surface.fill_text(
        &view.run.score.to_string(),
        Vec2::new(center_x, size.y * 0.2),
        TextStyle::display(size.x / 10.0, Color::WHITE),
    );

    match view.phase {
        Phase::Idle => draw_leaderboard(surface, view.leaderboard, size),
        Phase::GameOver => draw_game_over(surface, view, size),
        Phase::Playing => {}
    }

    if view.show_hitboxes {
        draw_hitboxes(surface, view.run, tuning);
    }
}

fn draw_ground(surface: &mut dyn Surface, offset: f32, tuning: &Tuning) {
    let tile = ground_tile_width(tuning);
    let top = tuning.floor_line();
    let mut x = offset;
    while x < tuning.surface_width + tile {
        surface.draw_sprite(
            Sprite::Ground,
            Rect::from_xywh(x, top, tile, tuning.ground_height),
        );
        x += tile;
    }
}

fn draw_player(surface: &mut dyn Surface, view: &FrameView<'_>, tuning: &Tuning) {
    let player = &view.run.player;
    let size = Vec2::new(tuning.player_width, tuning.player_height);
    let pivot = Vec2::new(player.x, player.y + view.player_offset) + size * 0.4;
    surface.draw_sprite_rotated(
        Sprite::Player,
        size,
        pivot,
        player_tilt(player.velocity, view.activation_held),
    );
}

fn draw_leaderboard(surface: &mut dyn Surface, entries: &[LeaderboardEntry], size: Vec2) {
    if entries.is_empty() {
        return;
    }
    let center_x = size.x / 2.0;
    let top = size.y / 2.0 + 100.0;
    surface.fill_text(
        "Top Scores",
        Vec2::new(center_x, top),
        TextStyle::plain(size.x / 20.0, Color::YELLOW),
    );
    for (i, entry) in entries.iter().take(LEADERBOARD_ROWS).enumerate() {
        surface.fill_text(
            &format!("{}. {}: {}", i + 1, entry.player, entry.score),
            Vec2::new(center_x, top + 40.0 + i as f32 * 30.0),
            TextStyle::plain(size.x / 30.0, Color::YELLOW),
        );
    }
}

fn draw_game_over(surface: &mut dyn Surface, view: &FrameView<'_>, size: Vec2) {
    let center_x = size.x / 2.0;
    surface.fill_rect(
        Rect::from_xywh(0.0, 0.0, size.x, size.y),
        Color::rgba(0.0, 0.0, 0.0, 0.3),
    );
    surface.fill_text(
        &format!("Score: {}", view.run.score),
        Vec2::new(center_x, size.y / 2.0 - 80.0),
        TextStyle::display(size.x / 8.0, Color::WHITE),
    );
    surface.fill_text(
        &format!("Best: {}", view.best_score),
        Vec2::new(center_x, size.y / 2.0 - 10.0),
        TextStyle::display(size.x / 16.0, Color::WHITE),
    );
    surface.fill_text(
        "Tap or press Space to play again",
        Vec2::new(center_x, size.y / 2.0 + 40.0),
        TextStyle::plain(size.x / 30.0, Color::WHITE),
    );
}

fn draw_hitboxes(surface: &mut dyn Surface, run: &RunState, tuning: &Tuning) {
    surface.stroke_circle(run.player.hitbox(tuning), Color::RED);
    for pair in &run.obstacles {
        for mut rect in pair.hitboxes(tuning) {
            rect.min.y = rect.min.y.max(0.0);
            surface.stroke_rect(rect, Color::LIME);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCmd, RecordingSurface};
    use crate::sim::state::ObstaclePair;

    fn view<'a>(phase: Phase, run: &'a RunState, board: &'a [LeaderboardEntry]) -> FrameView<'a> {
        FrameView {
            phase,
            run,
            activation_held: false,
            player_offset: 0.0,
            ground_offset: 0.0,
            leaderboard: board,
            best_score: 4,
            show_hitboxes: false,
        }
    }

    fn board() -> Vec<LeaderboardEntry> {
        vec![LeaderboardEntry {
            player: "Ada".into(),
            score: 7,
            created_at: "2024-05-01 12:00:00".into(),
        }]
    }

    /// Index of the first command matching `pred`
    fn first(cmds: &[DrawCmd], pred: impl Fn(&DrawCmd) -> bool) -> usize {
        cmds.iter().position(pred).unwrap()
    }

    #[test]
    fn test_tilt() {
        assert_eq!(player_tilt(3.0, true), LIFT_TILT);
        assert_eq!(player_tilt(-4.0, false), 0.0);
        assert!((player_tilt(5.0, false) - PI / 4.0).abs() < 1e-6);
        assert_eq!(player_tilt(25.0, false), PI / 2.0);
    }

    #[test]
    fn test_layer_order() {
        let tuning = Tuning::default();
        let mut run = RunState::new(1, &tuning);
        run.obstacles.push(ObstaclePair::new(300.0, 200.0));
        let mut surface = RecordingSurface::new(tuning.surface());
        render_frame(&mut surface, &view(Phase::Playing, &run, &[]), &tuning);

        let cmds = surface.commands();
        let obstacle = first(&cmds, |c| {
            matches!(c, DrawCmd::Sprite { sprite: Sprite::Obstacle, .. })
        });
        let ground = first(&cmds, |c| {
            matches!(c, DrawCmd::Sprite { sprite: Sprite::Ground, .. })
        });
        let player = first(&cmds, |c| matches!(c, DrawCmd::RotatedSprite { .. }));
        let score = first(&cmds, |c| c.text() == Some("0"));

        assert!(matches!(
            cmds[0],
            DrawCmd::Sprite {
                sprite: Sprite::Background,
                ..
            }
        ));
        assert!(0 < obstacle && obstacle < ground && ground < player && player < score);
    }

    #[test]
    fn test_leaderboard_only_while_idle() {
        let tuning = Tuning::default();
        let run = RunState::new(1, &tuning);
        let board = board();
        let mut surface = RecordingSurface::new(tuning.surface());

        render_frame(&mut surface, &view(Phase::Idle, &run, &board), &tuning);
        assert!(surface.texts().contains(&"Top Scores".to_string()));
        assert!(surface.texts().contains(&"1. Ada: 7".to_string()));

        render_frame(&mut surface, &view(Phase::Playing, &run, &board), &tuning);
        assert!(!surface.texts().contains(&"Top Scores".to_string()));
    }

    #[test]
    fn test_overlay_only_in_game_over() {
        let tuning = Tuning::default();
        let mut run = RunState::new(1, &tuning);
        run.score = 3;
        let mut surface = RecordingSurface::new(tuning.surface());

        render_frame(&mut surface, &view(Phase::Playing, &run, &[]), &tuning);
        assert!(!surface
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCmd::FillRect { .. })));

        render_frame(&mut surface, &view(Phase::GameOver, &run, &[]), &tuning);
        let cmds = surface.commands();
        let overlay = first(&cmds, |c| matches!(c, DrawCmd::FillRect { .. }));
        let score = first(&cmds, |c| c.text() == Some("Score: 3"));
        assert!(overlay < score);
        assert!(surface.texts().contains(&"Best: 4".to_string()));
        assert_eq!(surface.frames_drawn(), 2);
    }

    #[test]
    fn test_ground_covers_surface_width() {
        let tuning = Tuning::default();
        let run = RunState::new(1, &tuning);
        let mut surface = RecordingSurface::new(tuning.surface());
        let mut v = view(Phase::Idle, &run, &[]);
        v.ground_offset = -ground_tile_width(&tuning) * 0.5;
        render_frame(&mut surface, &v, &tuning);

        let tiles: Vec<Rect> = surface
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DrawCmd::Sprite {
                    sprite: Sprite::Ground,
                    rect,
                } => Some(rect),
                _ => None,
            })
            .collect();
        assert!(tiles[0].min.x <= 0.0);
        assert!(tiles.last().unwrap().max.x >= tuning.surface_width);
    }

    #[test]
    fn test_hitbox_overlay() {
        let tuning = Tuning::default();
        let mut run = RunState::new(1, &tuning);
        run.obstacles.push(ObstaclePair::new(300.0, 200.0));
        let mut surface = RecordingSurface::new(tuning.surface());
        let mut v = view(Phase::Playing, &run, &[]);
        v.show_hitboxes = true;
        render_frame(&mut surface, &v, &tuning);

        let cmds = surface.commands();
        assert!(matches!(cmds[cmds.len() - 3], DrawCmd::StrokeCircle { .. }));
        let rects: Vec<Rect> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCmd::StrokeRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects.len(), 2);
        // Unbounded upper hitbox is drawn from the top of the surface
        assert_eq!(rects[0].min.y, 0.0);
        assert_eq!(rects[0].max.y, 200.0);
    }
}
