//! Plinko Drop - deterministic peg-board physics with outcome search
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board layout, collisions, bucket, search)
//! - `game`: Game phase state machine and prize selection glue
//! - `settings`: Data-driven board/physics/search tuning
//! - `platform`: Browser bindings (wasm32 only)

pub mod error;
pub mod game;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::Error;
pub use game::{GameEvent, GameMachine, GameState};
pub use settings::{BoardConfig, EngineSettings, PhysicsConfig, SearchConfig};
pub use sim::{Board, Outcome, OutcomeSearch, SearchRequest, Trajectory, TrajectoryPoint};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Hard cap on simulated frames per attempt
    pub const MAX_FRAMES: u32 = 800;
    /// Extra frames allowed for settling once the ball reaches the bucket
    pub const MAX_BUCKET_FRAMES: u32 = 300;

    /// Board defaults (portrait phone-sized board)
    pub const BOARD_WIDTH: f32 = 375.0;
    pub const BOARD_HEIGHT: f32 = 500.0;
    pub const PEG_ROWS: u32 = 10;
    pub const SLOT_COUNT: u32 = 7;
    /// Thickness of the left/right board walls
    pub const BORDER_WIDTH: f32 = 8.0;
    /// Thickness of the dividers between slots
    pub const BUCKET_WALL_WIDTH: f32 = 4.0;

    /// Ball and peg sizes
    pub const BALL_RADIUS: f32 = 7.0;
    pub const PEG_RADIUS: f32 = 6.0;

    /// Gravity (pixels/frame²)
    pub const GRAVITY: f32 = 0.35;
    /// Maximum downward speed from gravity alone (pixels/frame)
    pub const TERMINAL_VELOCITY: f32 = 9.0;
    /// Horizontal velocity retained each frame
    pub const AIR_RESISTANCE: f32 = 0.995;

    /// Peg restitution (fraction of speed kept after a peg bounce)
    pub const PEG_RESTITUTION: f32 = 0.7;
    /// Board wall restitution
    pub const WALL_RESTITUTION: f32 = 0.6;
    /// Bucket wall/floor restitution (friction dominates in the slot)
    pub const BUCKET_WALL_RESTITUTION: f32 = 0.3;
    pub const BUCKET_FLOOR_RESTITUTION: f32 = 0.3;
    /// Horizontal velocity kept on each floor contact
    pub const FLOOR_FRICTION: f32 = 0.8;

    /// Speed bounds after a peg bounce
    pub const MIN_BOUNCE_VELOCITY: f32 = 1.2;
    pub const MAX_SPEED: f32 = 11.0;
    /// Largest random deflection (radians) at bounce_randomness = 1.0
    pub const MAX_DEFLECTION: f32 = 0.5;

    /// Frames a peg ignores repeat hits after a collision
    pub const PEG_COOLDOWN_FRAMES: u32 = 3;
    /// Maximum pegs tracked in the cooldown map
    pub const COOLDOWN_CAPACITY: usize = 8;
    /// Extra distance for visual peg-hit feedback
    pub const NEAR_PEG_MARGIN: f32 = 2.0;

    /// Settling detection
    pub const SETTLE_SPEED: f32 = 0.2;
    pub const SETTLE_FRAMES: u32 = 8;
    /// Vertical floor bounces slower than this come to rest
    pub const FLOOR_REST_SPEED: f32 = 0.5;

    /// Stuck detection: frames without vertical progress above the bucket
    pub const STUCK_FRAMES: u32 = 150;
    /// Minimum downward movement that counts as progress
    pub const STUCK_PROGRESS: f32 = 1.0;

    /// Separation kept between ball and peg after resolving contact
    pub const SEPARATION_EPSILON: f32 = 0.01;

    /// Outcome search defaults
    pub const MAX_ATTEMPTS: u32 = 20_000;
    pub const MIN_BOUNCE_RANDOMNESS: f32 = 0.2;
    pub const MAX_BOUNCE_RANDOMNESS: f32 = 0.8;
}

/// Rotate a vector by `angle` radians (counter-clockwise in math coordinates)
#[inline]
pub fn rotate_vec(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Mix a base seed with an index into an independent 64-bit sub-seed (SplitMix64)
#[inline]
pub fn mix_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed
        .wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
