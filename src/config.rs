//! Board geometry and physics tuning
//!
//! Every physics constant lives here rather than in the integrator so boards
//! can be re-tuned from JSON without touching simulation code.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_ROWS;
use crate::error::EngineError;

/// Static board geometry (screen space, y grows downward)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    /// Number of decision rows (and outcome path length)
    pub rows: u32,
    /// Horizontal distance between neighbouring pegs in a row
    pub peg_spacing_x: f32,
    /// Vertical distance between peg rows
    pub peg_spacing_y: f32,
    pub ball_radius: f32,
    pub peg_radius: f32,
    /// Full board width; the board is centred on `board_width / 2`
    pub board_width: f32,
    /// Vertical offset of the first peg row
    pub drop_zone_height: f32,
    /// Extra distance below the last peg row before a ball counts as landed
    pub landing_margin: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            peg_spacing_x: 60.0,
            peg_spacing_y: 50.0,
            ball_radius: 8.0,
            peg_radius: 5.0,
            board_width: 600.0,
            drop_zone_height: 140.0,
            landing_margin: 30.0,
        }
    }
}

impl BoardConfig {
    /// Check the geometry invariants
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(EngineError::InvalidRows { rows: self.rows });
        }
        let positive = [
            ("peg_spacing_x", self.peg_spacing_x),
            ("peg_spacing_y", self.peg_spacing_y),
            ("ball_radius", self.ball_radius),
            ("peg_radius", self.peg_radius),
            ("board_width", self.board_width),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidDimension { field });
            }
        }
        if !(self.drop_zone_height.is_finite() && self.drop_zone_height >= 0.0) {
            return Err(EngineError::InvalidDimension { field: "drop_zone_height" });
        }
        if !(self.landing_margin.is_finite() && self.landing_margin >= 0.0) {
            return Err(EngineError::InvalidDimension { field: "landing_margin" });
        }
        if self.peg_spacing_x <= 2.0 * self.peg_radius {
            return Err(EngineError::PegOverlap);
        }
        if self.slot_x(0) < self.min_x() || self.slot_x(self.rows) > self.max_x() {
            return Err(EngineError::BoardTooNarrow);
        }
        Ok(())
    }

    /// Horizontal centre of the board
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.board_width / 2.0
    }

    /// Leftmost x a ball centre may occupy
    #[inline]
    pub fn min_x(&self) -> f32 {
        self.ball_radius
    }

    /// Rightmost x a ball centre may occupy
    #[inline]
    pub fn max_x(&self) -> f32 {
        self.board_width - self.ball_radius
    }

    /// Screen x of a slot's centre: `center_x + (slot - rows/2) * peg_spacing_x`
    #[inline]
    pub fn slot_x(&self, slot: u32) -> f32 {
        self.center_x() + (slot as f32 - self.rows as f32 / 2.0) * self.peg_spacing_x
    }

    /// Y beyond which a ball is handed to the landing detector
    #[inline]
    pub fn floor_y(&self) -> f32 {
        self.drop_zone_height + self.rows as f32 * self.peg_spacing_y + self.landing_margin
    }

    /// Y of peg row `row`
    #[inline]
    pub fn row_y(&self, row: u32) -> f32 {
        self.drop_zone_height + row as f32 * self.peg_spacing_y
    }

    /// Number of landing slots (`rows + 1`)
    #[inline]
    pub fn slot_count(&self) -> u32 {
        self.rows + 1
    }
}

/// Per-tick physics constants for the falling phase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Added to vy every tick
    pub gravity: f32,
    /// Target lateral speed when steering at a row crossing
    pub steer_velocity: f32,
    /// Blend factor toward the steering target (0 = ignore path, 1 = hard override)
    pub steer_blend: f32,
    /// Per-tick lateral speed asked for per pixel of distance from the path's lane (0 disables)
    pub lane_gain: f32,
    /// Cap on the lane-seeking lateral speed
    pub lane_speed: f32,
    /// Per-tick blend toward the lane-seeking speed
    pub lane_blend: f32,
    /// Above the last peg row the lane sits this fraction of the contact
    /// distance beside the slot, so balls roll off the peg over it
    pub last_row_offset: f32,
    /// Multiplier applied to vx every tick
    pub friction: f32,
    /// Fraction of normal speed kept after a peg or wall bounce
    pub restitution: f32,
    /// Extra factor on the normal reflection so the ball clears the peg next tick
    pub overcorrection: f32,
    /// Distance added to the push-out beyond the penetration depth
    pub push_slack: f32,
    /// Speed cap
    pub max_speed: f32,
    /// Max random tangential nudge on a peg impact
    pub impact_jitter: f32,
    /// Max random lateral offset at the spawn point
    pub spawn_jitter: f32,
    /// Seed for the jitter RNG
    pub jitter_seed: u64,
    /// Ticks a landed ball stays visible before removal
    pub removal_delay_ticks: u64,
    /// A falling ball still airborne after this many ticks is landed anyway
    pub max_fall_ticks: u64,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 0.35,
            steer_velocity: 2.2,
            steer_blend: 0.45,
            lane_gain: 0.25,
            lane_speed: 5.0,
            lane_blend: 0.4,
            last_row_offset: 0.75,
            friction: 0.985,
            restitution: 0.5,
            overcorrection: 1.1,
            push_slack: 0.5,
            max_speed: 12.0,
            impact_jitter: 0.3,
            spawn_jitter: 2.0,
            jitter_seed: 0x5EED_B0A2D,
            removal_delay_ticks: 60,
            max_fall_ticks: 1800,
        }
    }
}

impl PhysicsTuning {
    pub fn validate(&self) -> Result<(), EngineError> {
        let non_negative = [
            ("gravity", self.gravity),
            ("steer_velocity", self.steer_velocity),
            ("lane_gain", self.lane_gain),
            ("lane_speed", self.lane_speed),
            ("last_row_offset", self.last_row_offset),
            ("push_slack", self.push_slack),
            ("impact_jitter", self.impact_jitter),
            ("spawn_jitter", self.spawn_jitter),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidDimension { field });
            }
        }
        let unit = [
            ("steer_blend", self.steer_blend),
            ("lane_blend", self.lane_blend),
            ("friction", self.friction),
            ("restitution", self.restitution),
        ];
        for (field, value) in unit {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(EngineError::InvalidDimension { field });
            }
        }
        if !(self.overcorrection.is_finite() && self.overcorrection >= 1.0) {
            return Err(EngineError::InvalidDimension { field: "overcorrection" });
        }
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(EngineError::InvalidDimension { field: "max_speed" });
        }
        if self.max_fall_ticks == 0 {
            return Err(EngineError::InvalidDimension { field: "max_fall_ticks" });
        }
        Ok(())
    }
}

/// Reservoir box above the drop zone and its settling behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BucketConfig {
    /// Inner width of the bucket, centred on the board
    pub width: f32,
    /// Y of the bucket floor; immediate drops spawn below it, clear of the top peg
    pub floor_y: f32,
    /// Y at which staged balls appear
    pub entry_y: f32,
    /// Fraction of normal speed kept on wall, floor and ball contacts
    pub restitution: f32,
    /// Velocity multiplier applied every tick while in the bucket
    pub damping: f32,
    /// Speed below which a reservoir ball counts as settled
    pub settle_epsilon: f32,
    /// Consecutive slow ticks before a ball goes to sleep
    pub sleep_ticks: u32,
    /// Ticks after entry after which a ball is put to sleep regardless
    pub max_settle_ticks: u64,
    /// Lateral pull toward the board centre applied on release
    pub release_funnel: f32,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            width: 180.0,
            floor_y: 95.0,
            entry_y: 10.0,
            restitution: 0.3,
            damping: 0.96,
            settle_epsilon: 0.05,
            sleep_ticks: 10,
            max_settle_ticks: 180,
            release_funnel: 0.03,
        }
    }
}

impl BucketConfig {
    /// Horizontal extent of the bucket interior for a ball of `radius`
    pub fn inner_x_range(&self, board: &BoardConfig) -> (f32, f32) {
        let half = self.width / 2.0 - board.ball_radius;
        (board.center_x() - half, board.center_x() + half)
    }

    pub fn validate(&self, board: &BoardConfig) -> Result<(), EngineError> {
        if !(self.width.is_finite() && self.width > 2.0 * board.ball_radius) {
            return Err(EngineError::InvalidDimension { field: "bucket.width" });
        }
        if self.width > board.board_width {
            return Err(EngineError::InvalidDimension { field: "bucket.width" });
        }
        if !(self.floor_y.is_finite() && self.floor_y > self.entry_y) {
            return Err(EngineError::InvalidDimension { field: "bucket.floor_y" });
        }
        // Room for a spawned ball between the bucket floor and the top peg
        if self.floor_y + 2.0 * board.ball_radius + board.peg_radius > board.drop_zone_height {
            return Err(EngineError::InvalidDimension { field: "bucket.floor_y" });
        }
        let unit = [
            ("bucket.restitution", self.restitution),
            ("bucket.damping", self.damping),
        ];
        for (field, value) in unit {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(EngineError::InvalidDimension { field });
            }
        }
        if !(self.settle_epsilon.is_finite() && self.settle_epsilon > 0.0) {
            return Err(EngineError::InvalidDimension { field: "bucket.settle_epsilon" });
        }
        if !(self.release_funnel.is_finite() && self.release_funnel >= 0.0) {
            return Err(EngineError::InvalidDimension { field: "bucket.release_funnel" });
        }
        Ok(())
    }
}

/// Everything needed to construct an engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub board: BoardConfig,
    pub tuning: PhysicsTuning,
    pub bucket: BucketConfig,
}

impl EngineConfig {
    /// Create a config for a board with `rows` rows, other values default
    pub fn with_rows(rows: u32) -> Self {
        let mut config = Self::default();
        config.board.rows = rows;
        // Keep the outer slots on the board
        let needed = (rows as f32 + 1.0) * config.board.peg_spacing_x + 4.0 * config.board.ball_radius;
        config.board.board_width = config.board.board_width.max(needed);
        config
    }

    /// Where immediate drops start: centred, between the bucket floor and the top peg
    pub fn spawn_point(&self) -> Vec2 {
        let below_bucket = self.bucket.floor_y + self.board.ball_radius;
        let above_pegs = self.board.drop_zone_height - self.board.ball_radius - self.board.peg_radius;
        Vec2::new(self.board.center_x(), (below_bucket + above_pegs) / 2.0)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.board.validate()?;
        self.tuning.validate()?;
        self.bucket.validate(&self.board)?;
        Ok(())
    }

    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded engine config: {} rows, board width {}",
            config.board.rows,
            config.board.board_width
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
