//! Deterministic simulation module
//!
//! All drop physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (pegs by row, then column)
//! - No rendering or platform dependencies

pub mod board;
pub mod bucket;
pub mod collision;
pub mod rng;
pub mod search;
pub mod state;
pub mod tick;

pub use board::{Board, DropZone, Peg, PegKey};
pub use collision::{CollisionResult, RecentCollisions, reflect_velocity, segment_circle_toi};
pub use rng::SeededRng;
pub use search::{
    AttemptPlan, OutcomeSearch, SearchError, SearchMode, SearchReport, SearchRequest, SearchResult,
    search,
};
pub use state::{
    Ball, DropPhase, DropState, Landing, Outcome, SimulationParams, SimulationRun, Trajectory,
    TrajectoryPoint, WallSide,
};
pub use tick::{simulate, tick};
