//! Plinko Drop - peg-lattice ball-drop animation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (lattice, balls, integrator, landing, bucket)
//! - `engine`: The explicit engine instance that owns a board and its balls
//! - `config`: Data-driven board geometry and physics tuning
//! - `events`: Typed events for renderers
//! - `error`: Input contract violations
//! - `wasm`: JavaScript binding (wasm32 only)

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::{BoardConfig, BucketConfig, EngineConfig, PhysicsTuning};
pub use engine::PlinkoEngine;
pub use error::EngineError;
pub use events::{EngineEvent, EngineObserver, EventLog, NoOpObserver};
pub use sim::{BallId, BallPhase, BallSnapshot, BucketState, OutcomePath, Peg, PegLattice};

/// Engine timing constants
pub mod consts {
    /// Animation ticks per second. Physics constants are per tick, not per second.
    pub const TICK_RATE_HZ: u32 = 60;
    /// Duration of one tick in milliseconds
    pub const TICK_MS: f32 = 1000.0 / TICK_RATE_HZ as f32;
    /// Longest outcome path an `OutcomePath` can hold
    pub const MAX_ROWS: u32 = 64;
}

/// Convert a delay in milliseconds to whole ticks (rounded up)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    (ms as u64 * consts::TICK_RATE_HZ as u64).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_ticks() {
        assert_eq!(ms_to_ticks(0), 0);
        assert_eq!(ms_to_ticks(200), 12);
        assert_eq!(ms_to_ticks(1000), 60);
        // Partial ticks round up so a ball never enters early
        assert_eq!(ms_to_ticks(1), 1);
    }
}
