//! Engine settings
//!
//! Board dimensions, physics tuning and search budget. Every section
//! deserializes with defaults so a partial JSON document only overrides the
//! fields it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value:.2})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be at least {min} (got {value})")]
    TooFew {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("slot width {slot_width:.2} is too narrow for the ball (needs {required:.2})")]
    SlotTooNarrow { slot_width: f32, required: f32 },
    #[error("peg field is too cramped: {reason}")]
    BoardTooCramped { reason: String },
    #[error("bounce randomness range invalid (min {min:.2} > max {max:.2})")]
    RandomnessRange { min: f32, max: f32 },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Board dimensions supplied by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub board_width: f32,
    pub board_height: f32,
    pub peg_rows: u32,
    pub slot_count: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            peg_rows: PEG_ROWS,
            slot_count: SLOT_COUNT,
        }
    }
}

impl BoardConfig {
    pub fn new(board_width: f32, board_height: f32, peg_rows: u32, slot_count: u32) -> Self {
        Self {
            board_width,
            board_height,
            peg_rows,
            slot_count,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("board_width", self.board_width)?;
        positive("board_height", self.board_height)?;
        at_least("peg_rows", 1, self.peg_rows)?;
        at_least("slot_count", 1, self.slot_count)?;
        Ok(())
    }
}

/// Physics tuning (units are pixels and frames)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // === Geometry ===
    pub ball_radius: f32,
    pub peg_radius: f32,
    pub border_width: f32,
    pub bucket_wall_width: f32,

    // === Motion ===
    pub gravity: f32,
    pub terminal_velocity: f32,
    /// Horizontal velocity retained per frame
    pub air_resistance: f32,
    pub min_bounce_velocity: f32,
    pub max_speed: f32,
    /// Largest random deflection (radians) at bounce_randomness = 1.0
    pub max_deflection: f32,

    // === Restitution ===
    pub peg_restitution: f32,
    pub wall_restitution: f32,
    pub bucket_wall_restitution: f32,
    pub bucket_floor_restitution: f32,
    pub floor_friction: f32,

    // === Collision bookkeeping ===
    pub peg_cooldown_frames: u32,
    pub cooldown_capacity: usize,
    pub near_peg_margin: f32,

    // === Termination ===
    pub settle_speed: f32,
    pub settle_frames: u32,
    pub floor_rest_speed: f32,
    pub stuck_frames: u32,
    pub stuck_progress: f32,
    pub max_frames: u32,
    pub max_bucket_frames: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ball_radius: BALL_RADIUS,
            peg_radius: PEG_RADIUS,
            border_width: BORDER_WIDTH,
            bucket_wall_width: BUCKET_WALL_WIDTH,

            gravity: GRAVITY,
            terminal_velocity: TERMINAL_VELOCITY,
            air_resistance: AIR_RESISTANCE,
            min_bounce_velocity: MIN_BOUNCE_VELOCITY,
            max_speed: MAX_SPEED,
            max_deflection: MAX_DEFLECTION,

            peg_restitution: PEG_RESTITUTION,
            wall_restitution: WALL_RESTITUTION,
            bucket_wall_restitution: BUCKET_WALL_RESTITUTION,
            bucket_floor_restitution: BUCKET_FLOOR_RESTITUTION,
            floor_friction: FLOOR_FRICTION,

            peg_cooldown_frames: PEG_COOLDOWN_FRAMES,
            cooldown_capacity: COOLDOWN_CAPACITY,
            near_peg_margin: NEAR_PEG_MARGIN,

            settle_speed: SETTLE_SPEED,
            settle_frames: SETTLE_FRAMES,
            floor_rest_speed: FLOOR_REST_SPEED,
            stuck_frames: STUCK_FRAMES,
            stuck_progress: STUCK_PROGRESS,
            max_frames: MAX_FRAMES,
            max_bucket_frames: MAX_BUCKET_FRAMES,
        }
    }
}

impl PhysicsConfig {
    /// Ball radius + peg radius: the minimum allowed centre distance
    #[inline]
    pub fn collision_radius(&self) -> f32 {
        self.ball_radius + self.peg_radius
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ball_radius", self.ball_radius)?;
        positive("peg_radius", self.peg_radius)?;
        positive("gravity", self.gravity)?;
        positive("terminal_velocity", self.terminal_velocity)?;
        positive("min_bounce_velocity", self.min_bounce_velocity)?;
        if self.border_width < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "border_width",
                value: self.border_width,
            });
        }
        if self.max_speed < self.min_bounce_velocity {
            return Err(ConfigError::RangeViolation {
                field: "max_speed",
                min: self.min_bounce_velocity,
                max: f32::MAX,
                value: self.max_speed,
            });
        }
        unit_range("air_resistance", self.air_resistance)?;
        unit_range("peg_restitution", self.peg_restitution)?;
        unit_range("wall_restitution", self.wall_restitution)?;
        unit_range("bucket_wall_restitution", self.bucket_wall_restitution)?;
        unit_range("bucket_floor_restitution", self.bucket_floor_restitution)?;
        unit_range("floor_friction", self.floor_friction)?;
        at_least(
            "cooldown_capacity",
            1,
            u32::try_from(self.cooldown_capacity).unwrap_or(u32::MAX),
        )?;
        at_least("settle_frames", 1, self.settle_frames)?;
        at_least("stuck_frames", 1, self.stuck_frames)?;
        at_least("max_frames", 1, self.max_frames)?;
        at_least("max_bucket_frames", self.settle_frames, self.max_bucket_frames)?;
        Ok(())
    }
}

/// Outcome search budget and attempt diversity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_attempts: u32,
    pub min_bounce_randomness: f32,
    pub max_bounce_randomness: f32,
    /// Largest initial horizontal speed given to the ball
    pub max_start_vx: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            min_bounce_randomness: MIN_BOUNCE_RANDOMNESS,
            max_bounce_randomness: MAX_BOUNCE_RANDOMNESS,
            max_start_vx: 0.6,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        at_least("max_attempts", 1, self.max_attempts)?;
        if self.min_bounce_randomness > self.max_bounce_randomness {
            return Err(ConfigError::RandomnessRange {
                min: self.min_bounce_randomness,
                max: self.max_bounce_randomness,
            });
        }
        unit_range("min_bounce_randomness", self.min_bounce_randomness)?;
        unit_range("max_bounce_randomness", self.max_bounce_randomness)?;
        if self.max_start_vx < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "max_start_vx",
                value: self.max_start_vx,
            });
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub board: BoardConfig,
    pub physics: PhysicsConfig,
    pub search: SearchConfig,
}

impl EngineSettings {
    /// Parse settings from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        self.physics.validate()?;
        self.search.validate()?;
        Ok(())
    }

    /// Load settings from a JSON file (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn at_least(field: &'static str, min: u32, value: u32) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::TooFew { field, min, value })
    }
}

fn unit_range(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            EngineSettings::from_json(r#"{ "board": { "slot_count": 9 } }"#).unwrap();
        assert_eq!(settings.board.slot_count, 9);
        assert_eq!(settings.board.peg_rows, PEG_ROWS);
        assert_eq!(settings.physics, PhysicsConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = EngineSettings::default();
        settings.search.max_attempts = 50;
        let json = settings.to_json().unwrap();
        assert_eq!(EngineSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_non_positive_board() {
        let board = BoardConfig::new(0.0, 500.0, 10, 7);
        assert!(matches!(
            board.validate(),
            Err(ConfigError::NonPositive { field: "board_width", .. })
        ));
        let board = BoardConfig::new(375.0, -1.0, 10, 7);
        assert!(board.validate().is_err());
        let board = BoardConfig::new(375.0, 500.0, 10, 0);
        assert!(matches!(
            board.validate(),
            Err(ConfigError::TooFew { field: "slot_count", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_restitution() {
        let physics = PhysicsConfig {
            peg_restitution: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            physics.validate(),
            Err(ConfigError::RangeViolation { field: "peg_restitution", .. })
        ));
    }

    #[test]
    fn test_cooldown_capacity_bounds() {
        let physics = PhysicsConfig {
            cooldown_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            physics.validate(),
            Err(ConfigError::TooFew { field: "cooldown_capacity", .. })
        ));

        // Capacities past u32::MAX must not wrap to zero
        let physics = PhysicsConfig {
            cooldown_capacity: usize::MAX,
            ..Default::default()
        };
        assert!(physics.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_randomness_range() {
        let search = SearchConfig {
            min_bounce_randomness: 0.9,
            max_bounce_randomness: 0.1,
            ..Default::default()
        };
        assert!(matches!(
            search.validate(),
            Err(ConfigError::RandomnessRange { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(matches!(
            EngineSettings::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
