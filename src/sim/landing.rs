//! Landing detection
//!
//! Physics only has to look right. The landing position is taken from the
//! outcome path alone: whatever x the ball reached, it is snapped to the
//! centre of its canonical slot here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Ball, BallId, BallPhase};
use crate::config::BoardConfig;

/// Emitted exactly once per ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingEvent {
    pub id: BallId,
    pub slot: u32,
}

/// Snap a ball that crossed the floor onto its slot
///
/// Returns `None` if the ball already landed or never received a path.
pub fn finalize(ball: &mut Ball, config: &BoardConfig, now_tick: u64) -> Option<LandingEvent> {
    if ball.phase != BallPhase::Falling {
        return None;
    }
    let Some(slot) = ball.target_slot() else {
        log::warn!("Ball {} crossed the floor without a path", ball.id);
        return None;
    };

    ball.pos = Vec2::new(config.slot_x(slot), config.floor_y());
    ball.vel = Vec2::ZERO;
    ball.phase = BallPhase::Landed;
    ball.landed_tick = Some(now_tick);
    log::debug!("Ball {} landed in slot {} at tick {}", ball.id, slot, now_tick);

    Some(LandingEvent { id: ball.id, slot })
}

/// Move a landed ball to `Removed` once its grace delay has passed
///
/// Returns true on the tick the transition happens.
pub fn expire(ball: &mut Ball, now_tick: u64, removal_delay_ticks: u64) -> bool {
    match (ball.phase, ball.landed_tick) {
        (BallPhase::Landed, Some(landed)) if now_tick >= landed + removal_delay_ticks => {
            ball.phase = BallPhase::Removed;
            true
        }
        _ => false,
    }
}
