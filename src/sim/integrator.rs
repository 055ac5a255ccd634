//! Per-tick advance of a falling ball
//!
//! Order each tick: gravity, steering, friction, integrate, peg collisions,
//! speed cap, wall clamp, landing test. All constants are per tick.
//!
//! Steering has two parts. Entering the band above peg row `r` blends vx
//! once toward the `path[r]` side. Every tick the ball also leans toward its
//! lane, the gap its choices so far lead through, so it reaches the floor
//! near its slot and the landing snap stays small.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{bounce_velocity, circle_collision, clamp_to_walls};
use super::lattice::PegLattice;
use super::path::OutcomePath;
use super::state::Ball;
use crate::config::{BoardConfig, PhysicsTuning};

/// What happened to a ball during one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still above the floor
    Airborne,
    /// Crossed the floor (or timed out) and must be finalized
    CrossedFloor,
}

/// Band the ball centre is in; band `r` is the stretch just above peg row `r`
#[inline]
pub fn row_index(y: f32, config: &BoardConfig) -> u32 {
    let band = ((y - config.drop_zone_height) / config.peg_spacing_y).ceil();
    band.max(0.0) as u32
}

/// X a ball in `band` should pass: the gap in peg row `band` that the first
/// `band + 1` choices lead through, or the slot once every choice is made
pub fn lane_x(path: &OutcomePath, band: u32, config: &BoardConfig) -> f32 {
    let decided = (band + 1).min(path.len());
    let rights = path.iter().take(decided as usize).filter(|right| *right).count();
    config.center_x() + (rights as f32 - decided as f32 / 2.0) * config.peg_spacing_x
}

/// Advance a falling ball by one tick
pub fn advance(
    ball: &mut Ball,
    lattice: &PegLattice,
    config: &BoardConfig,
    tuning: &PhysicsTuning,
    rng: &mut Pcg32,
) -> StepOutcome {
    ball.fall_ticks += 1;

    ball.vel.y += tuning.gravity;

    steer(ball, config, tuning);

    ball.vel.x *= tuning.friction;

    ball.pos += ball.vel;
    ball.rotation += ball.vel.x / config.ball_radius;

    resolve_pegs(ball, lattice, config, tuning, rng);

    // Speed cap keeps repeated contacts from adding energy
    let speed = ball.vel.length();
    if speed > tuning.max_speed {
        ball.vel *= tuning.max_speed / speed;
    }

    let (x, vx, _) = clamp_to_walls(
        ball.pos.x,
        ball.vel.x,
        config.min_x(),
        config.max_x(),
        tuning.restitution,
    );
    ball.pos.x = x;
    ball.vel.x = vx;

    if ball.pos.y > config.floor_y() {
        return StepOutcome::CrossedFloor;
    }
    if ball.fall_ticks >= tuning.max_fall_ticks {
        log::warn!(
            "Ball {} still airborne after {} ticks, landing it",
            ball.id,
            ball.fall_ticks
        );
        return StepOutcome::CrossedFloor;
    }
    StepOutcome::Airborne
}

/// Bias vx toward the ball's path; pathless balls are left alone
fn steer(ball: &mut Ball, config: &BoardConfig, tuning: &PhysicsTuning) {
    let Some(path) = ball.path().copied() else {
        return;
    };

    let next = row_index(ball.pos.y + ball.vel.y, config);
    if ball.steered_row.is_none_or(|done| next > done) {
        if let Some(right) = path.goes_right(next) {
            ball.steered_row = Some(next);
            let target = if right {
                tuning.steer_velocity
            } else {
                -tuning.steer_velocity
            };
            ball.vel.x += (target - ball.vel.x) * tuning.steer_blend;
        }
    }

    if tuning.lane_gain <= 0.0 {
        return;
    }
    let band = row_index(ball.pos.y, config);
    let mut lane = lane_x(&path, band, config);
    if band == path.len() {
        // The slot sits under a last-row peg; aim beside it
        let side = if ball.pos.x >= lane { 1.0 } else { -1.0 };
        lane += side * tuning.last_row_offset * (config.ball_radius + config.peg_radius);
    }
    let wanted = ((lane - ball.pos.x) * tuning.lane_gain).clamp(-tuning.lane_speed, tuning.lane_speed);
    ball.vel.x += (wanted - ball.vel.x) * tuning.lane_blend;
}

/// Push the ball out of every peg it overlaps and bounce it
fn resolve_pegs(
    ball: &mut Ball,
    lattice: &PegLattice,
    config: &BoardConfig,
    tuning: &PhysicsTuning,
    rng: &mut Pcg32,
) {
    for peg in lattice.rows_near(ball.pos.y) {
        let contact = circle_collision(ball.pos, config.ball_radius, peg.pos, config.peg_radius);
        if !contact.hit {
            continue;
        }
        ball.pos += contact.normal * (contact.penetration + tuning.push_slack);

        let approaching = ball.vel.dot(contact.normal) < 0.0;
        ball.vel = bounce_velocity(
            ball.vel,
            contact.normal,
            tuning.restitution,
            tuning.overcorrection,
        );
        if approaching && tuning.impact_jitter > 0.0 {
            let tangent = Vec2::new(-contact.normal.y, contact.normal.x);
            ball.vel += tangent * rng.random_range(-tuning.impact_jitter..=tuning.impact_jitter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::path::OutcomePath;
    use rand::SeedableRng;

    use crate::config::EngineConfig;

    fn setup() -> (BoardConfig, PhysicsTuning, PegLattice, Pcg32) {
        let config = BoardConfig::default();
        let lattice = PegLattice::new(&config);
        (config, PhysicsTuning::default(), lattice, Pcg32::seed_from_u64(1))
    }

    fn ball_with(path: &[bool], config: &BoardConfig) -> Ball {
        let path = OutcomePath::new(path, config.rows).unwrap();
        let spawn = EngineConfig {
            board: config.clone(),
            ..Default::default()
        }
        .spawn_point();
        Ball::falling(1, spawn, path)
    }

    /// Drop one ball on `config` and return it as it crosses the floor, before any snap
    fn fall(path: &[bool], config: &EngineConfig, seed: u64) -> Ball {
        let board = &config.board;
        let lattice = PegLattice::new(board);
        let mut rng = Pcg32::seed_from_u64(seed);
        let path = OutcomePath::new(path, board.rows).unwrap();
        let mut spawn = config.spawn_point();
        spawn.x += rng.random_range(-2.0..=2.0);
        let mut ball = Ball::falling(1, spawn, path);
        while advance(&mut ball, &lattice, board, &config.tuning, &mut rng) == StepOutcome::Airborne {}
        ball
    }

    #[test]
    fn test_row_index() {
        let config = BoardConfig::default();
        assert_eq!(row_index(0.0, &config), 0);
        assert_eq!(row_index(config.drop_zone_height - 1.0, &config), 0);
        assert_eq!(row_index(config.drop_zone_height, &config), 0);
        assert_eq!(row_index(config.drop_zone_height + 1.0, &config), 1);
        assert_eq!(row_index(config.drop_zone_height + 2.5 * config.peg_spacing_y, &config), 3);
    }

    #[test]
    fn test_lane_follows_choices() {
        let config = BoardConfig::default();
        let center = config.center_x();
        let half = config.peg_spacing_x / 2.0;
        let path = OutcomePath::parse("RRLRLLRR", 8).unwrap();

        assert_eq!(lane_x(&path, 0, &config), center + half);
        assert_eq!(lane_x(&path, 1, &config), center + 2.0 * half);
        assert_eq!(lane_x(&path, 2, &config), center + half);
        assert_eq!(lane_x(&path, 3, &config), center + 2.0 * half);
        // Every choice made: the slot itself, however deep the band
        assert_eq!(lane_x(&path, 7, &config), config.slot_x(path.slot()));
        assert_eq!(lane_x(&path, 12, &config), config.slot_x(path.slot()));
    }

    #[test]
    fn test_gravity_accelerates_free_ball() {
        let (config, tuning, lattice, mut rng) = setup();
        let mut ball = ball_with(&[false; 8], &config);
        let start_y = ball.pos.y;

        assert_eq!(advance(&mut ball, &lattice, &config, &tuning, &mut rng), StepOutcome::Airborne);
        assert!((ball.vel.y - tuning.gravity).abs() < 1e-6);
        assert!(ball.pos.y > start_y);
    }

    #[test]
    fn test_steering_applies_once_per_row() {
        let (config, _, _, _) = setup();
        let tuning = PhysicsTuning {
            lane_gain: 0.0,
            ..Default::default()
        };
        let mut ball = ball_with(&[true; 8], &config);
        ball.pos.y = config.drop_zone_height + 1.0;

        steer(&mut ball, &config, &tuning);
        let first = ball.vel.x;
        assert!((first - tuning.steer_velocity * tuning.steer_blend).abs() < 1e-6);
        assert_eq!(ball.steered_row, Some(1));

        // Same row again: no further bias
        steer(&mut ball, &config, &tuning);
        assert_eq!(ball.vel.x, first);
    }

    #[test]
    fn test_lane_pull_leans_toward_first_gap() {
        let (config, tuning, _, _) = setup();
        for (path, sign) in [([true; 8], 1.0), ([false; 8], -1.0)] {
            let mut ball = ball_with(&path, &config);
            ball.pos.x = config.center_x();
            ball.steered_row = Some(0);
            steer(&mut ball, &config, &tuning);
            assert!(ball.vel.x * sign > 0.0);
            assert!(ball.vel.x.abs() <= tuning.lane_speed);
        }
    }

    #[test]
    fn test_extreme_paths_fall_to_their_side() {
        let config = EngineConfig::default();
        let board = &config.board;
        let edge = board.center_x() + (board.rows as f32 / 2.0 - 0.5) * board.peg_spacing_x;
        for seed in 0..8 {
            let right = fall(&[true; 8], &config, seed);
            assert!(right.pos.x > edge, "all-right ended at {}", right.pos.x);
            let left = fall(&[false; 8], &config, seed);
            assert!(left.pos.x < 2.0 * board.center_x() - edge, "all-left ended at {}", left.pos.x);
        }
    }

    /// Physics alone carries the ball close to its slot before the snap
    #[test]
    fn test_ball_reaches_floor_near_its_slot() {
        for rows in [4u32, 8, 12] {
            let config = EngineConfig::with_rows(rows);
            let board = &config.board;
            let mut paths = Pcg32::seed_from_u64(rows as u64);
            let drifts: Vec<f32> = (0..48u64)
                .map(|seed| {
                    let path: Vec<bool> = (0..rows).map(|_| paths.random_bool(0.5)).collect();
                    let slot = path.iter().filter(|right| **right).count() as u32;
                    let ball = fall(&path, &config, seed);
                    assert!(ball.fall_ticks < config.tuning.max_fall_ticks, "ball stalled");
                    (ball.pos.x - board.slot_x(slot)).abs() / board.peg_spacing_x
                })
                .collect();
            let worst = drifts.iter().cloned().fold(0.0, f32::max);
            let mean = drifts.iter().sum::<f32>() / drifts.len() as f32;
            assert!(worst < 0.5, "{} rows: worst drift {} slots", rows, worst);
            assert!(mean < 0.25, "{} rows: mean drift {} slots", rows, mean);
        }
    }

    #[test]
    fn test_steering_ignores_pathless_ball() {
        let (config, tuning, _, _) = setup();
        let mut ball = Ball::reservoir(2, Vec2::new(250.0, config.drop_zone_height + 1.0), 0);
        steer(&mut ball, &config, &tuning);
        assert_eq!(ball.vel.x, 0.0);
        assert_eq!(ball.steered_row, None);
    }

    #[test]
    fn test_peg_contact_pushes_ball_clear() {
        let (config, tuning, lattice, mut rng) = setup();
        let mut ball = ball_with(&[false; 8], &config);
        let peg = lattice.row(0)[0];
        // Sitting slightly into the top of the first peg, moving down
        ball.pos = peg.pos + Vec2::new(0.5, -(config.ball_radius + config.peg_radius) + 2.0);
        ball.vel = Vec2::new(0.0, 3.0);

        resolve_pegs(&mut ball, &lattice, &config, &tuning, &mut rng);
        let dist = (ball.pos - peg.pos).length();
        assert!(dist >= config.ball_radius + config.peg_radius);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_wall_reflects_ball_in_bounds() {
        let (config, tuning, lattice, mut rng) = setup();
        let mut ball = ball_with(&[true; 8], &config);
        ball.pos = Vec2::new(config.max_x() - 1.0, config.drop_zone_height - 20.0);
        ball.vel = Vec2::new(10.0, 0.0);

        advance(&mut ball, &lattice, &config, &tuning, &mut rng);
        assert!(ball.pos.x <= config.max_x());
        assert!(ball.pos.x >= config.min_x());
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_speed_is_bounded() {
        let (config, tuning, lattice, mut rng) = setup();
        let mut ball = ball_with(&[true; 8], &config);
        ball.vel = Vec2::new(50.0, 80.0);
        advance(&mut ball, &lattice, &config, &tuning, &mut rng);
        assert!(ball.vel.length() <= tuning.max_speed + 1e-3);
    }

    #[test]
    fn test_reaches_floor() {
        let (config, tuning, lattice, mut rng) = setup();
        let mut ball = ball_with(&[true, false, true, true, false, true, false, true], &config);
        let crossed = (0..tuning.max_fall_ticks)
            .any(|_| advance(&mut ball, &lattice, &config, &tuning, &mut rng) == StepOutcome::CrossedFloor);
        assert!(crossed);
    }

    #[test]
    fn test_watchdog_lands_stuck_ball() {
        let (config, _, lattice, mut rng) = setup();
        let tuning = PhysicsTuning {
            gravity: 0.0,
            max_fall_ticks: 5,
            ..Default::default()
        };
        let mut ball = ball_with(&[true; 8], &config);
        let outcomes: Vec<_> = (0..5)
            .map(|_| advance(&mut ball, &lattice, &config, &tuning, &mut rng))
            .collect();
        assert_eq!(outcomes[3], StepOutcome::Airborne);
        assert_eq!(outcomes[4], StepOutcome::CrossedFloor);
    }
}
