//! Deterministic simulation module
//!
//! All ball motion lives here. This module must be pure and deterministic:
//! - Fixed per-tick constants only
//! - Seeded RNG only (jitter, never outcome)
//! - Stable iteration order (by ball id)
//! - No rendering or platform dependencies

pub mod bucket;
pub mod collision;
pub mod integrator;
pub mod landing;
pub mod lattice;
pub mod path;
pub mod state;

pub use bucket::{BucketController, BucketState};
pub use collision::{CollisionResult, circle_collision};
pub use integrator::{StepOutcome, advance};
pub use landing::{LandingEvent, expire, finalize};
pub use lattice::{Peg, PegLattice, generate};
pub use path::OutcomePath;
pub use state::{Ball, BallId, BallPhase, BallSnapshot};
