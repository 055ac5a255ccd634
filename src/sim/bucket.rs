//! Reservoir staging
//!
//! Balls can be dropped into a bucket above the board before their outcome
//! paths are known. They tumble in, come to rest, and are released together
//! once every one of them has a path.
//!
//! Bucket state machine: `Empty -> Filling -> Settled -> Releasing -> Empty`

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::resolve_ball_pairs;
use super::state::{Ball, BallId, BallPhase};
use crate::config::{BoardConfig, BucketConfig, PhysicsTuning};
use crate::error::EngineError;
use crate::ms_to_ticks;

/// Aggregate phase of the reservoir
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketState {
    /// No staged balls
    #[default]
    Empty,
    /// Balls entering or still moving
    Filling,
    /// Every staged ball is at rest
    Settled,
    /// Balls released and still on the board
    Releasing,
}

/// Owns the bucket state machine; the balls themselves live in the engine
#[derive(Debug, Clone)]
pub struct BucketController {
    config: BucketConfig,
    state: BucketState,
    released: Vec<BallId>,
}

impl BucketController {
    pub fn new(config: BucketConfig) -> Self {
        Self {
            config,
            state: BucketState::Empty,
            released: Vec::new(),
        }
    }

    pub fn state(&self) -> BucketState {
        self.state
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Create a reservoir ball that appears `delay_ms` from `now_tick`
    pub fn stage(
        &mut self,
        id: BallId,
        delay_ms: u32,
        now_tick: u64,
        board: &BoardConfig,
        rng: &mut Pcg32,
    ) -> Ball {
        let (min_x, max_x) = self.config.inner_x_range(board);
        let spread = (max_x - min_x) / 4.0;
        let x = board.center_x() + rng.random_range(-spread..=spread);
        let enter_tick = now_tick + ms_to_ticks(delay_ms);

        self.state = BucketState::Filling;
        log::debug!("Ball {} staged, enters at tick {}", id, enter_tick);
        Ball::reservoir(id, Vec2::new(x, self.config.entry_y), enter_tick)
    }

    /// Advance every entered reservoir ball by one tick
    pub fn step(&self, balls: &mut [Ball], board: &BoardConfig, tuning: &PhysicsTuning, now_tick: u64) {
        let (min_x, max_x) = self.config.inner_x_range(board);
        let floor = self.config.floor_y - board.ball_radius;

        let active: Vec<usize> = balls
            .iter()
            .enumerate()
            .filter(|(_, b)| b.phase == BallPhase::Reservoir && b.has_entered(now_tick))
            .map(|(i, _)| i)
            .collect();

        for &i in &active {
            let ball = &mut balls[i];
            if ball.asleep {
                continue;
            }
            ball.vel.y += tuning.gravity;
            ball.vel *= self.config.damping;
            ball.pos += ball.vel;
            ball.rotation += ball.vel.x / board.ball_radius;
        }

        resolve_ball_pairs(balls, &active, board.ball_radius, self.config.restitution);

        for &i in &active {
            let ball = &mut balls[i];
            if ball.asleep {
                continue;
            }
            self.contain(ball, min_x, max_x, floor, tuning.gravity);
            self.update_sleep(ball, now_tick);
        }
    }

    /// Keep a ball inside the bucket walls and above its floor
    fn contain(&self, ball: &mut Ball, min_x: f32, max_x: f32, floor: f32, gravity: f32) {
        let restitution = self.config.restitution;
        if ball.pos.x < min_x {
            ball.pos.x = min_x;
            ball.vel.x = ball.vel.x.abs() * restitution;
        } else if ball.pos.x > max_x {
            ball.pos.x = max_x;
            ball.vel.x = -ball.vel.x.abs() * restitution;
        }
        if ball.pos.y > floor {
            ball.pos.y = floor;
            ball.vel.y = -ball.vel.y.abs() * restitution;
            // Resting contact: gravity alone would otherwise leave a tiny bounce forever
            if ball.vel.y.abs() < gravity * 2.0 {
                ball.vel.y = 0.0;
            }
        }
    }

    fn update_sleep(&self, ball: &mut Ball, now_tick: u64) {
        if ball.speed() < self.config.settle_epsilon {
            ball.slow_ticks += 1;
        } else {
            ball.slow_ticks = 0;
        }
        let timed_out = now_tick.saturating_sub(ball.enter_tick) >= self.config.max_settle_ticks;
        if ball.slow_ticks >= self.config.sleep_ticks || timed_out {
            ball.asleep = true;
            ball.vel = Vec2::ZERO;
        }
    }

    /// Settle predicate: at least one reservoir ball, all entered, all slower than epsilon
    pub fn is_settled(&self, balls: &[Ball], now_tick: u64) -> bool {
        let mut reservoir = balls
            .iter()
            .filter(|b| b.phase == BallPhase::Reservoir)
            .peekable();
        if reservoir.peek().is_none() {
            return false;
        }
        reservoir.all(|b| b.has_entered(now_tick) && b.speed() < self.config.settle_epsilon)
    }

    /// Poll the settle predicate, moving `Filling -> Settled` on the first true result
    ///
    /// Returns true only on the poll that made the transition.
    pub fn poll_settled(&mut self, balls: &[Ball], now_tick: u64) -> bool {
        if self.state == BucketState::Filling && self.is_settled(balls, now_tick) {
            self.state = BucketState::Settled;
            log::info!("Bucket settled at tick {}", now_tick);
            return true;
        }
        false
    }

    /// Release every reservoir ball into the falling phase at once
    ///
    /// Fails without changing anything if any reservoir ball lacks a path.
    pub fn open(&mut self, balls: &mut [Ball], board: &BoardConfig) -> Result<usize, EngineError> {
        if let Some(pathless) = balls
            .iter()
            .find(|b| b.phase == BallPhase::Reservoir && b.path().is_none())
        {
            return Err(EngineError::PathMissing(pathless.id));
        }

        let center = board.center_x();
        self.released.clear();
        for ball in balls.iter_mut().filter(|b| b.phase == BallPhase::Reservoir) {
            ball.phase = BallPhase::Falling;
            ball.asleep = false;
            ball.slow_ticks = 0;
            ball.fall_ticks = 0;
            ball.vel = Vec2::new((center - ball.pos.x) * self.config.release_funnel, 0.0);
            self.released.push(ball.id);
        }

        if self.released.is_empty() {
            return Ok(0);
        }
        self.state = BucketState::Releasing;
        log::info!("Bucket opened, {} balls released", self.released.len());
        Ok(self.released.len())
    }

    /// Return to `Empty` once every released ball has been removed
    pub fn update_release(&mut self, balls: &[Ball]) {
        if self.state != BucketState::Releasing {
            return;
        }
        let still_out = self.released.iter().any(|id| {
            balls
                .iter()
                .any(|b| b.id == *id && b.phase != BallPhase::Removed)
        });
        if !still_out {
            self.released.clear();
            self.state = BucketState::Empty;
            log::debug!("Bucket round complete");
        }
    }

    /// Back to `Empty`; the caller discards the balls
    pub fn reset(&mut self) {
        self.released.clear();
        self.state = BucketState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::path::OutcomePath;
    use rand::SeedableRng;

    fn setup() -> (BucketController, BoardConfig, PhysicsTuning, Pcg32) {
        (
            BucketController::new(BucketConfig::default()),
            BoardConfig::default(),
            PhysicsTuning::default(),
            Pcg32::seed_from_u64(3),
        )
    }

    #[test]
    fn test_stage_moves_to_filling() {
        let (mut bucket, board, _, mut rng) = setup();
        assert_eq!(bucket.state(), BucketState::Empty);
        let ball = bucket.stage(1, 200, 10, &board, &mut rng);
        assert_eq!(bucket.state(), BucketState::Filling);
        assert_eq!(ball.phase, BallPhase::Reservoir);
        assert_eq!(ball.enter_tick, 22);
        let (min_x, max_x) = bucket.config().inner_x_range(&board);
        assert!((min_x..=max_x).contains(&ball.pos.x));
    }

    #[test]
    fn test_not_settled_until_entered() {
        let (mut bucket, board, tuning, mut rng) = setup();
        // Nothing staged
        assert!(!bucket.is_settled(&[], 0));

        let mut balls = vec![bucket.stage(1, 1000, 0, &board, &mut rng)];
        // Not yet entered, at rest but invisible
        assert!(!bucket.is_settled(&balls, 10));
        for tick in 0..400 {
            bucket.step(&mut balls, &board, &tuning, tick);
        }
        assert!(bucket.is_settled(&balls, 400));
    }

    #[test]
    fn test_balls_rest_inside_bucket() {
        let (mut bucket, board, tuning, mut rng) = setup();
        let mut balls: Vec<Ball> = (0..10)
            .map(|i| bucket.stage(i, i * 200, 0, &board, &mut rng))
            .collect();
        let mut settled_at = None;
        for tick in 0..1000 {
            bucket.step(&mut balls, &board, &tuning, tick);
            if bucket.poll_settled(&balls, tick) {
                settled_at = Some(tick);
                break;
            }
        }
        assert!(settled_at.is_some());
        assert_eq!(bucket.state(), BucketState::Settled);

        let (min_x, max_x) = bucket.config().inner_x_range(&board);
        for ball in &balls {
            assert!(ball.pos.x >= min_x - 1e-3 && ball.pos.x <= max_x + 1e-3);
            assert!(ball.pos.y <= bucket.config().floor_y - board.ball_radius + 1e-3);
        }
        // Second poll does not re-fire
        assert!(!bucket.poll_settled(&balls, 1000));
    }

    #[test]
    fn test_open_requires_every_path() {
        let (mut bucket, board, _, mut rng) = setup();
        let mut balls = vec![
            bucket.stage(1, 0, 0, &board, &mut rng),
            bucket.stage(2, 0, 0, &board, &mut rng),
        ];
        let path = OutcomePath::new(&[true; 8], 8).unwrap();
        balls[0].assign_path(path).unwrap();

        assert_eq!(bucket.open(&mut balls, &board), Err(EngineError::PathMissing(2)));
        assert!(balls.iter().all(|b| b.phase == BallPhase::Reservoir));
        assert_eq!(bucket.state(), BucketState::Filling);

        balls[1].assign_path(path).unwrap();
        assert_eq!(bucket.open(&mut balls, &board), Ok(2));
        assert!(balls.iter().all(|b| b.phase == BallPhase::Falling));
        assert_eq!(bucket.state(), BucketState::Releasing);
    }

    #[test]
    fn test_release_completes_when_balls_removed() {
        let (mut bucket, board, _, mut rng) = setup();
        let mut balls = vec![bucket.stage(1, 0, 0, &board, &mut rng)];
        balls[0]
            .assign_path(OutcomePath::new(&[false; 8], 8).unwrap())
            .unwrap();
        bucket.open(&mut balls, &board).unwrap();

        bucket.update_release(&balls);
        assert_eq!(bucket.state(), BucketState::Releasing);

        balls[0].phase = BallPhase::Removed;
        bucket.update_release(&balls);
        assert_eq!(bucket.state(), BucketState::Empty);
    }

    #[test]
    fn test_reset() {
        let (mut bucket, board, _, mut rng) = setup();
        bucket.stage(1, 0, 0, &board, &mut rng);
        bucket.reset();
        assert_eq!(bucket.state(), BucketState::Empty);
    }
}
