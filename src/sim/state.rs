//! Ball state and render snapshots

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::path::OutcomePath;
use crate::error::EngineError;

/// Caller-supplied ball identifier
pub type BallId = u32;

/// Lifecycle phase of a ball
///
/// `Reservoir` (optional) -> `Falling` -> `Landed` -> `Removed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallPhase {
    /// Held in the bucket, path possibly unknown
    Reservoir,
    /// Dropping through the peg lattice
    Falling,
    /// Snapped to its slot, waiting out the removal delay
    Landed,
    /// Terminal
    Removed,
}

/// A ball owned by the engine
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Visual spin angle (radians)
    pub rotation: f32,
    pub phase: BallPhase,
    path: Option<OutcomePath>,
    target_slot: Option<u32>,
    /// Deepest row whose steering bias has been applied
    pub steered_row: Option<u32>,
    /// Tick at which a reservoir ball appears in the bucket
    pub enter_tick: u64,
    /// Ticks spent falling (watchdog)
    pub fall_ticks: u64,
    /// Tick at which the ball landed
    pub landed_tick: Option<u64>,
    /// Reservoir ball is at rest and no longer integrated
    pub asleep: bool,
    /// Consecutive reservoir ticks below the settle speed
    pub slow_ticks: u32,
}

impl Ball {
    fn new(id: BallId, pos: Vec2, phase: BallPhase) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            phase,
            path: None,
            target_slot: None,
            steered_row: None,
            enter_tick: 0,
            fall_ticks: 0,
            landed_tick: None,
            asleep: false,
            slow_ticks: 0,
        }
    }

    /// A ball that drops straight away with a known path
    pub fn falling(id: BallId, pos: Vec2, path: OutcomePath) -> Self {
        let mut ball = Self::new(id, pos, BallPhase::Falling);
        ball.target_slot = Some(path.slot());
        ball.path = Some(path);
        ball
    }

    /// A pathless ball staged in the reservoir, appearing at `enter_tick`
    pub fn reservoir(id: BallId, pos: Vec2, enter_tick: u64) -> Self {
        let mut ball = Self::new(id, pos, BallPhase::Reservoir);
        ball.enter_tick = enter_tick;
        ball
    }

    pub fn path(&self) -> Option<&OutcomePath> {
        self.path.as_ref()
    }

    /// Canonical slot, fixed once the path is assigned
    pub fn target_slot(&self) -> Option<u32> {
        self.target_slot
    }

    /// Attach a path to a reservoir ball. The path is set at most once.
    pub fn assign_path(&mut self, path: OutcomePath) -> Result<(), EngineError> {
        if self.phase != BallPhase::Reservoir {
            return Err(EngineError::NotInReservoir(self.id));
        }
        if self.path.is_some() {
            return Err(EngineError::PathAlreadyAssigned(self.id));
        }
        self.target_slot = Some(path.slot());
        self.path = Some(path);
        Ok(())
    }

    /// Whether a reservoir ball has appeared yet
    #[inline]
    pub fn has_entered(&self, now_tick: u64) -> bool {
        now_tick >= self.enter_tick
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Whether the ball is drawn this tick
    pub fn is_visible(&self, now_tick: u64) -> bool {
        match self.phase {
            BallPhase::Reservoir => self.has_entered(now_tick),
            BallPhase::Falling | BallPhase::Landed => true,
            BallPhase::Removed => false,
        }
    }

    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            rotation: self.rotation,
            phase: self.phase,
        }
    }
}

/// Read-only copy of a ball for renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub id: BallId,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub phase: BallPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falling_ball_has_slot() {
        let path = OutcomePath::new(&[true, true, false], 3).unwrap();
        let ball = Ball::falling(7, Vec2::new(10.0, 20.0), path);
        assert_eq!(ball.phase, BallPhase::Falling);
        assert_eq!(ball.target_slot(), Some(2));
        assert!(ball.is_visible(0));
    }

    #[test]
    fn test_assign_path_once() {
        let mut ball = Ball::reservoir(1, Vec2::ZERO, 5);
        assert_eq!(ball.target_slot(), None);
        assert!(!ball.is_visible(4));
        assert!(ball.is_visible(5));

        let path = OutcomePath::new(&[true, false], 2).unwrap();
        ball.assign_path(path).unwrap();
        assert_eq!(ball.target_slot(), Some(1));
        assert_eq!(
            ball.assign_path(path),
            Err(EngineError::PathAlreadyAssigned(1))
        );
    }

    #[test]
    fn test_assign_path_requires_reservoir() {
        let path = OutcomePath::new(&[true, false], 2).unwrap();
        let mut ball = Ball::falling(3, Vec2::ZERO, path);
        assert_eq!(ball.assign_path(path), Err(EngineError::NotInReservoir(3)));
    }

    #[test]
    fn test_snapshot_copies_state() {
        let mut ball = Ball::reservoir(9, Vec2::new(1.0, 2.0), 0);
        ball.rotation = 0.5;
        let snap = ball.snapshot();
        assert_eq!(
            snap,
            BallSnapshot {
                id: 9,
                x: 1.0,
                y: 2.0,
                rotation: 0.5,
                phase: BallPhase::Reservoir
            }
        );
    }
}
