//! Fixed timestep simulation step
//!
//! One call to [`step`] is one simulated frame:
//! tick → advance_obstacles → score_pass → evict_offscreen.

use rand::Rng;

use super::state::{ObstaclePair, Player, RunState};
use crate::tuning::Tuning;

/// Input observed by a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Activation latched at the frame boundary
    pub activation_held: bool,
}

/// What a step changed, for logging and the state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub spawned: bool,
    pub scored: u32,
    pub evicted: bool,
}

/// Player physics: held activation pins velocity to `lift`, otherwise gravity
/// accumulates without a terminal cap. Position then moves by velocity.
pub fn tick(player: &mut Player, activation_held: bool, tuning: &Tuning) {
    if activation_held {
        player.velocity = tuning.lift;
    } else {
        player.velocity += tuning.gravity;
    }
    player.y += player.velocity;
}

/// Scroll every pair left, then spawn a new pair when there is room.
/// Returns true if a pair was spawned.
pub fn advance_obstacles(run: &mut RunState, tuning: &Tuning) -> bool {
    let speed = run.speed;
    for pair in &mut run.obstacles {
        pair.x -= speed;
    }

    if run.in_grace_period(tuning) {
        return false;
    }

    let room = run
        .newest()
        .is_none_or(|newest| newest.x < tuning.surface_width - tuning.spawn_distance);
    if !room {
        return false;
    }

    let (lo, hi) = tuning.gap_offset_range();
    let gap_top = run.rng.random_range(lo..=hi);
    run.obstacles
        .push(ObstaclePair::new(tuning.surface_width, gap_top));
    run.pairs_spawned += 1;

    if run.pairs_spawned % tuning.speed_up_every == 0 {
        run.speed += tuning.speed_increment;
        log::debug!(
            "Speed up to {:.1} after {} pairs",
            run.speed,
            run.pairs_spawned
        );
    }
    true
}

/// Mark every pair the player has cleared and count it once.
/// Returns the number of pairs scored this step.
pub fn score_pass(run: &mut RunState, tuning: &Tuning) -> u32 {
    let leading = run.player.leading_edge(tuning);
    let mut scored = 0;
    for pair in run.obstacles.iter_mut().filter(|p| !p.scored) {
        if leading > pair.score_line(tuning) {
            pair.scored = true;
            scored += 1;
        }
    }
    run.score += scored;
    scored
}

/// Drop the oldest pair once it is fully off the left edge.
/// Returns true if a pair was removed.
pub fn evict_offscreen(run: &mut RunState, tuning: &Tuning) -> bool {
    match run.obstacles.first() {
        Some(oldest) if oldest.trailing_edge(tuning) < 0.0 => {
            run.obstacles.remove(0);
            true
        }
        _ => false,
    }
}

/// Advance a run by one simulated frame
pub fn step(run: &mut RunState, input: TickInput, tuning: &Tuning) -> StepReport {
    tick(&mut run.player, input.activation_held, tuning);
    let spawned = advance_obstacles(run, tuning);
    let scored = score_pass(run, tuning);
    let evicted = evict_offscreen(run, tuning);

    run.time_ticks += 1;

    StepReport {
        spawned,
        scored,
        evicted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn past_grace(tuning: &Tuning) -> RunState {
        let mut run = RunState::new(12345, tuning);
        run.time_ticks = tuning.grace_steps();
        run
    }

    #[test]
    fn test_gravity_accumulates_without_cap() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        for i in 1..=200 {
            let before = player.velocity;
            tick(&mut player, false, &tuning);
            assert_eq!(player.velocity, before + tuning.gravity);
            assert_eq!(player.velocity, i as f32 * tuning.gravity);
        }
    }

    #[test]
    fn test_lift_overrides_velocity() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.velocity = 42.0;
        let y = player.y;
        tick(&mut player, true, &tuning);
        assert_eq!(player.velocity, tuning.lift);
        assert_eq!(player.y, y + tuning.lift);

        // Holding keeps the velocity pinned (hover), it does not stack
        tick(&mut player, true, &tuning);
        assert_eq!(player.velocity, tuning.lift);
    }

    #[test]
    fn test_no_spawn_during_grace_period() {
        let tuning = Tuning::default();
        let mut run = RunState::new(1, &tuning);
        let mut steps = 0;
        while run.in_grace_period(&tuning) {
            let report = step(&mut run, TickInput::default(), &tuning);
            assert!(!report.spawned);
            steps += 1;
        }
        assert_eq!(steps, 120);
        assert!(run.obstacles.is_empty());
        assert!(advance_obstacles(&mut run, &tuning));
    }

    #[test]
    fn test_spawn_cadence_and_position() {
        let tuning = Tuning::default();
        let mut run = past_grace(&tuning);

        assert!(advance_obstacles(&mut run, &tuning));
        assert_eq!(run.obstacles.len(), 1);
        assert_eq!(run.obstacles[0].x, tuning.surface_width);

        // Not yet far enough from the right edge
        assert!(!advance_obstacles(&mut run, &tuning));

        // 768 - 4k < 368 first holds at k = 101
        let mut frames = 1;
        while !advance_obstacles(&mut run, &tuning) {
            frames += 1;
        }
        assert_eq!(frames, 100);
        assert_eq!(run.obstacles.len(), 2);
    }

    #[test]
    fn test_speed_steps_every_fifth_pair() {
        let tuning = Tuning::default();
        let mut run = past_grace(&tuning);
        let mut last_speed = run.speed;
        while run.pairs_spawned < 15 {
            advance_obstacles(&mut run, &tuning);
            assert!(run.speed >= last_speed);
            last_speed = run.speed;
            let expected = tuning.base_speed
                + (run.pairs_spawned / tuning.speed_up_every) as f32 * tuning.speed_increment;
            assert_eq!(run.speed, expected);
        }
        assert_eq!(run.speed, 5.5);
    }

    #[test]
    fn test_score_once_per_pair() {
        let tuning = Tuning::default();
        let mut run = RunState::new(3, &tuning);
        // Score line at 60 + 60 = 120; leading edge 100 + 94.8
        run.obstacles.push(ObstaclePair::new(60.0, 300.0));
        run.obstacles.push(ObstaclePair::new(500.0, 300.0));

        assert_eq!(score_pass(&mut run, &tuning), 1);
        assert_eq!(run.score, 1);
        assert!(run.obstacles[0].scored);
        assert!(!run.obstacles[1].scored);

        // Same zone again: no double counting
        assert_eq!(score_pass(&mut run, &tuning), 0);
        assert_eq!(run.score, 1);
    }

    #[test]
    fn test_score_requires_strictly_past() {
        let tuning = Tuning {
            player_width: 100.0,
            ..Tuning::default()
        };
        let mut run = RunState::new(3, &tuning);
        // Leading edge 200, score line 140 + 60
        run.obstacles.push(ObstaclePair::new(140.0, 300.0));
        assert_eq!(score_pass(&mut run, &tuning), 0);
        run.obstacles[0].x = 139.5;
        assert_eq!(score_pass(&mut run, &tuning), 1);
    }

    #[test]
    fn test_evict_removes_oldest_pair_only() {
        let tuning = Tuning::default();
        let mut run = RunState::new(3, &tuning);
        run.obstacles.push(ObstaclePair::new(-120.0, 100.0));
        run.obstacles.push(ObstaclePair::new(-130.0, 100.0));
        run.obstacles.push(ObstaclePair::new(300.0, 100.0));

        // Trailing edge exactly at 0 stays
        assert!(!evict_offscreen(&mut run, &tuning));
        run.obstacles[0].x = -120.5;
        assert!(evict_offscreen(&mut run, &tuning));
        assert_eq!(run.obstacles.len(), 2);
        assert_eq!(run.obstacles[0].x, -130.0);
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning::default();
        let mut a = RunState::new(99999, &tuning);
        let mut b = RunState::new(99999, &tuning);
        for i in 0..600 {
            let input = TickInput {
                activation_held: i % 7 < 3,
            };
            step(&mut a, input, &tuning);
            step(&mut b, input, &tuning);
        }
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(a.player, b.player);
        assert_eq!(a.score, b.score);
    }

    proptest! {
        #[test]
        fn prop_gap_offset_in_range(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let mut run = past_grace(&tuning);
            run.rng = crate::sim::state::RngState::new(seed).to_rng();
            let (lo, hi) = tuning.gap_offset_range();
            for _ in 0..400 {
                if advance_obstacles(&mut run, &tuning) {
                    let pair = run.newest().unwrap();
                    prop_assert!(pair.gap_top >= lo && pair.gap_top <= hi);
                    prop_assert_eq!(pair.x, tuning.surface_width);
                    prop_assert_eq!(pair.upper(&tuning).max.y, pair.gap_top);
                    prop_assert_eq!(
                        pair.lower(&tuning).min.y,
                        pair.gap_top + tuning.obstacle_gap
                    );
                }
            }
        }

        #[test]
        fn prop_physics_law(held in proptest::collection::vec(any::<bool>(), 1..200)) {
            let tuning = Tuning::default();
            let mut player = Player::new(&tuning);
            for h in held {
                let (v0, y0) = (player.velocity, player.y);
                tick(&mut player, h, &tuning);
                let expected = if h { tuning.lift } else { v0 + tuning.gravity };
                prop_assert_eq!(player.velocity, expected);
                prop_assert_eq!(player.y, y0 + expected);
            }
        }

        #[test]
        fn prop_speed_monotonic(frames in 1usize..2000) {
            let tuning = Tuning::default();
            let mut run = RunState::new(5, &tuning);
            let mut last = run.speed;
            for _ in 0..frames {
                step(&mut run, TickInput { activation_held: true }, &tuning);
                prop_assert!(run.speed >= last);
                last = run.speed;
            }
        }
    }
}
