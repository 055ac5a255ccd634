//! The engine instance
//!
//! A `PlinkoEngine` is created for one board, driven by calling [`PlinkoEngine::tick`]
//! once per animation frame, and torn down with [`PlinkoEngine::destroy`].
//! There is no global state: two engines never share anything.
//!
//! Events accumulate until drained, so callers should drain or flush them
//! every frame.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EngineEvent, EngineObserver};
use crate::sim::collision::{clamp_to_walls, resolve_ball_pairs};
use crate::sim::{
    Ball, BallId, BallPhase, BallSnapshot, BucketController, BucketState, OutcomePath, PegLattice,
    StepOutcome, advance, expire, finalize,
};

/// Peg-board simulator owning every ball on one board
#[derive(Debug)]
pub struct PlinkoEngine {
    config: EngineConfig,
    lattice: PegLattice,
    /// Sorted by id for deterministic iteration
    balls: Vec<Ball>,
    bucket: BucketController,
    rng: Pcg32,
    time_ticks: u64,
    events: Vec<EngineEvent>,
}

impl PlinkoEngine {
    /// Validate the configuration and build the board
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let lattice = PegLattice::new(&config.board);
        log::info!(
            "Engine created: {} rows, {} pegs, {} slots",
            config.board.rows,
            lattice.len(),
            config.board.slot_count()
        );
        Ok(Self {
            rng: Pcg32::seed_from_u64(config.tuning.jitter_seed),
            bucket: BucketController::new(config.bucket.clone()),
            lattice,
            balls: Vec::new(),
            time_ticks: 0,
            events: Vec::new(),
            config,
        })
    }

    /// Tear the engine down, discarding every ball and pending event
    pub fn destroy(mut self) {
        let remaining = self.balls.len();
        self.clear_balls();
        log::info!("Engine destroyed after {} ticks ({} balls discarded)", self.time_ticks, remaining);
    }

    fn ensure_new_id(&self, id: BallId) -> Result<(), EngineError> {
        if self.balls.iter().any(|b| b.id == id) {
            return Err(EngineError::DuplicateBall(id));
        }
        Ok(())
    }

    fn insert(&mut self, ball: Ball) {
        let at = self.balls.partition_point(|b| b.id < ball.id);
        self.balls.insert(at, ball);
    }

    /// Drop a ball straight away with its outcome path
    pub fn drop_ball(&mut self, id: BallId, path: &[bool]) -> Result<(), EngineError> {
        self.ensure_new_id(id)?;
        let path = OutcomePath::new(path, self.config.board.rows)?;

        let jitter = self.config.tuning.spawn_jitter;
        let mut spawn = self.config.spawn_point();
        spawn.x += self.rng.random_range(-jitter..=jitter);

        log::debug!("Ball {} dropped with path {} (slot {})", id, path, path.slot());
        self.insert(Ball::falling(id, spawn, path));
        Ok(())
    }

    /// Stage a pathless ball in the reservoir, appearing after `delay_ms`
    pub fn drop_ball_into_bucket(&mut self, id: BallId, delay_ms: u32) -> Result<(), EngineError> {
        self.ensure_new_id(id)?;
        let ball = self.bucket.stage(
            id,
            delay_ms,
            self.time_ticks,
            &self.config.board,
            &mut self.rng,
        );
        self.insert(ball);
        Ok(())
    }

    /// Give a reservoir ball its outcome path
    pub fn assign_path_to_ball(&mut self, id: BallId, path: &[bool]) -> Result<(), EngineError> {
        let rows = self.config.board.rows;
        let ball = self
            .balls
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(EngineError::UnknownBall(id))?;
        let path = OutcomePath::new(path, rows)?;
        ball.assign_path(path)
    }

    /// Release every reservoir ball at once; returns how many were released
    pub fn open_bucket(&mut self) -> Result<usize, EngineError> {
        self.bucket.open(&mut self.balls, &self.config.board)
    }

    /// Settle predicate for the reservoir, meant to be polled off the render loop
    ///
    /// Queues `Settled` the first time it holds for a round of staged balls.
    pub fn are_balls_settled(&mut self) -> bool {
        if self.bucket.poll_settled(&self.balls, self.time_ticks) {
            self.events.push(EngineEvent::Settled);
        }
        self.bucket.is_settled(&self.balls, self.time_ticks)
    }

    /// Empty the bucket for the next round, discarding all ball state
    pub fn reset_bucket(&mut self) {
        self.clear_balls();
        log::info!("Bucket reset");
    }

    /// Remove every ball and pending event
    pub fn clear_balls(&mut self) {
        self.balls.clear();
        self.events.clear();
        self.bucket.reset();
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) {
        self.time_ticks += 1;
        let now = self.time_ticks;
        let board = &self.config.board;
        let tuning = &self.config.tuning;

        self.bucket.step(&mut self.balls, board, tuning, now);

        for ball in self.balls.iter_mut().filter(|b| b.phase == BallPhase::Falling) {
            if advance(ball, &self.lattice, board, tuning, &mut self.rng) == StepOutcome::CrossedFloor {
                if let Some(landing) = finalize(ball, board, now) {
                    self.events.push(EngineEvent::Landed {
                        id: landing.id,
                        slot: landing.slot,
                    });
                }
            }
        }

        let falling: Vec<usize> = self
            .balls
            .iter()
            .enumerate()
            .filter(|(_, b)| b.phase == BallPhase::Falling)
            .map(|(i, _)| i)
            .collect();
        if falling.len() > 1 {
            resolve_ball_pairs(&mut self.balls, &falling, board.ball_radius, tuning.restitution);
            for &i in &falling {
                let ball = &mut self.balls[i];
                let (x, vx, _) =
                    clamp_to_walls(ball.pos.x, ball.vel.x, board.min_x(), board.max_x(), tuning.restitution);
                ball.pos.x = x;
                ball.vel.x = vx;
            }
        }

        for ball in self.balls.iter_mut() {
            if expire(ball, now, tuning.removal_delay_ticks) {
                self.events.push(EngineEvent::Removed { id: ball.id });
            }
        }

        let frame = self.snapshots();
        self.events.push(EngineEvent::FrameUpdate { balls: frame });

        self.bucket.update_release(&self.balls);
        self.balls.retain(|b| b.phase != BallPhase::Removed);
    }

    /// Snapshots of every visible ball, by id
    pub fn snapshots(&self) -> Vec<BallSnapshot> {
        self.balls
            .iter()
            .filter(|b| b.is_visible(self.time_ticks))
            .map(Ball::snapshot)
            .collect()
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deliver every queued event to `observer`, oldest first
    pub fn flush_events(&mut self, observer: &mut impl EngineObserver) {
        for event in self.drain_events() {
            event.dispatch(observer);
        }
    }

    /// Queued events, oldest first, left in the queue
    pub fn pending_events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    /// Balls not yet removed (including reservoir balls still waiting to enter)
    pub fn active_ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn bucket_state(&self) -> BucketState {
        self.bucket.state()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn lattice(&self) -> &PegLattice {
        &self.lattice
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True when no ball is on the board and nothing is queued
    pub fn is_idle(&self) -> bool {
        self.balls.is_empty() && self.events.is_empty() && self.bucket.state() == BucketState::Empty
    }
}
