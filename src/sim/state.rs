//! Simulation state and trajectory types
//!
//! Everything a renderer needs is carried by `TrajectoryPoint`; live ball
//! state never leaves the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::board::{Board, PegKey};
use super::collision::RecentCollisions;
use super::rng::SeededRng;
use crate::settings::PhysicsConfig;

/// Phase of a single drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPhase {
    /// Ball held at the drop point (frame 0 only)
    Resting,
    /// Falling through the peg field
    Falling,
    /// Constrained by a slot's walls and floor
    Bucket,
    /// Came to rest inside a slot
    Settled,
    /// No vertical progress above the bucket for too long
    Stuck,
}

/// The moving ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Visual rolling angle (radians)
    pub rotation: f32,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            rotation: 0.0,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Which side a wall contact happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallSide {
    Left,
    Right,
}

/// One rendered frame of a drop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub vx: f32,
    pub vy: f32,
    /// Peg touched this frame (visual feedback only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peg_hit: Option<PegKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_hit: Option<WallSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_wall_hit: Option<WallSide>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bucket_floor_hit: bool,
}

impl TrajectoryPoint {
    pub fn from_ball(frame: u32, ball: &Ball) -> Self {
        Self {
            frame,
            x: ball.pos.x,
            y: ball.pos.y,
            rotation: ball.rotation,
            vx: ball.vel.x,
            vy: ball.vel.y,
            peg_hit: None,
            wall_hit: None,
            bucket_wall_hit: None,
            bucket_floor_hit: false,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Append-only frame sequence of one drop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory(Vec<TrajectoryPoint>);

impl Trajectory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub(crate) fn push(&mut self, point: TrajectoryPoint) {
        self.0.push(point);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryPoint> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.0.last()
    }

    /// Point at playback index `frame`
    pub fn point(&self, frame: usize) -> Option<&TrajectoryPoint> {
        self.0.get(frame)
    }

    /// Frames on which a peg flashed
    pub fn peg_hits(&self) -> impl Iterator<Item = (u32, PegKey)> + '_ {
        self.0
            .iter()
            .filter_map(|p| p.peg_hit.map(|key| (p.frame, key)))
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Starting conditions for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub start_x: f32,
    pub start_vx: f32,
    pub bounce_randomness: f32,
    /// Seed for the attempt's bounce RNG
    pub seed: u64,
}

/// How a drop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Landing {
    Slot(usize),
    Stuck { frame: u32 },
    NeverReachedBucket,
}

impl Landing {
    pub fn slot(&self) -> Option<usize> {
        match self {
            Landing::Slot(slot) => Some(*slot),
            _ => None,
        }
    }

    /// Slot index for external consumers; -1 for an invalid drop
    pub fn index(&self) -> i64 {
        self.slot().map_or(-1, |slot| slot as i64)
    }
}

/// Result of simulating one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    pub params: SimulationParams,
    pub trajectory: Trajectory,
    pub landing: Landing,
}

/// An accepted drop: a trajectory and the slot it ends in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub trajectory: Trajectory,
    pub landed_slot: usize,
    pub params: SimulationParams,
    /// Attempts the search needed (1 = first try)
    pub attempts: u32,
}

impl Outcome {
    pub fn frame_count(&self) -> usize {
        self.trajectory.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Mutable per-attempt simulation state
///
/// Owns the ball, the RNG stream and the cooldown map so attempts share
/// nothing and can run on any thread.
#[derive(Debug, Clone)]
pub struct DropState {
    pub ball: Ball,
    pub phase: DropPhase,
    pub frame: u32,
    pub bounce_randomness: f32,
    pub rng: SeededRng,
    pub recent: RecentCollisions,
    /// Lowest point reached while falling, for stuck detection
    pub best_y: f32,
    pub last_progress_frame: u32,
    /// Frame the ball entered the bucket zone
    pub bucket_entry_frame: Option<u32>,
    /// Slot the ball entered; it stays confined to it afterwards
    pub bucket_slot: Option<usize>,
    /// Consecutive slow frames inside the bucket
    pub calm_frames: u32,
}

impl DropState {
    pub fn new(board: &Board, physics: &PhysicsConfig, params: &SimulationParams) -> Self {
        let start_x = params.start_x.clamp(board.min_x(), board.max_x());
        let ball = Ball::new(
            Vec2::new(start_x, board.drop_y),
            Vec2::new(params.start_vx, 0.0),
        );
        Self {
            ball,
            phase: DropPhase::Resting,
            frame: 0,
            bounce_randomness: params.bounce_randomness,
            rng: SeededRng::new(params.seed),
            recent: RecentCollisions::new(physics.cooldown_capacity),
            best_y: ball.pos.y,
            last_progress_frame: 0,
            bucket_entry_frame: None,
            bucket_slot: None,
            calm_frames: 0,
        }
    }

    /// Trajectory point for the current state
    pub fn snapshot(&self) -> TrajectoryPoint {
        TrajectoryPoint::from_ball(self.frame, &self.ball)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, DropPhase::Settled | DropPhase::Stuck)
    }
}
