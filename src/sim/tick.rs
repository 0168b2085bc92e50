//! Fixed-step simulation loop
//!
//! One call to `tick` advances a drop by exactly one frame and returns the
//! trajectory point for that frame. `simulate` runs a whole attempt.

use super::board::Board;
use super::bucket::{self, SettleCheck};
use super::collision::{resolve_peg_collision, separate_from_pegs};
use super::state::{
    DropPhase, DropState, Landing, SimulationParams, SimulationRun, Trajectory, TrajectoryPoint,
    WallSide,
};
use crate::settings::PhysicsConfig;

/// Advance the drop by one frame
pub fn tick(state: &mut DropState, board: &Board, physics: &PhysicsConfig) -> TrajectoryPoint {
    match state.phase {
        DropPhase::Resting => state.phase = DropPhase::Falling,
        DropPhase::Settled | DropPhase::Stuck => return state.snapshot(),
        DropPhase::Falling | DropPhase::Bucket => {}
    }

    state.frame += 1;
    let frame = state.frame;
    let old = state.ball;
    let mut ball = state.ball;

    // Integrate
    ball.vel.y = (ball.vel.y + physics.gravity).min(physics.terminal_velocity);
    ball.vel.x *= physics.air_resistance;
    ball.pos += ball.vel;

    let mut peg_hit = None;
    let mut wall_hit = None;
    let mut bucket_wall_hit = None;
    let mut bucket_floor_hit = false;

    if state.phase == DropPhase::Falling {
        let result = resolve_peg_collision(
            &old,
            &ball,
            board,
            physics,
            &mut state.recent,
            frame,
            state.bounce_randomness,
            &mut state.rng,
        );
        ball.pos = result.pos;
        ball.vel = result.vel;
        peg_hit = result
            .contact
            .map(|c| c.peg)
            .or_else(|| result.pegs_hit.first().copied());

        // Board walls
        if ball.pos.x < board.min_x() {
            ball.pos.x = board.min_x();
            ball.vel.x = ball.vel.x.abs() * physics.wall_restitution;
            wall_hit = Some(WallSide::Left);
        } else if ball.pos.x > board.max_x() {
            ball.pos.x = board.max_x();
            ball.vel.x = -ball.vel.x.abs() * physics.wall_restitution;
            wall_hit = Some(WallSide::Right);
        }

        if board.in_bucket_zone(ball.pos.y) {
            let slot = board.slot_at(ball.pos.x);
            state.phase = DropPhase::Bucket;
            state.bucket_entry_frame = Some(frame);
            state.bucket_slot = Some(slot);
            log::debug!(
                "Frame {}: entered bucket zone at x={:.1} (slot {})",
                frame,
                ball.pos.x,
                slot
            );
        }
    }

    let slot = state
        .bucket_slot
        .unwrap_or_else(|| board.slot_at(ball.pos.x));
    let mut on_floor = false;
    if state.phase == DropPhase::Bucket {
        let contact = bucket::constrain_to_slot(&mut ball, slot, board, physics);
        bucket_wall_hit = contact.wall;
        bucket_floor_hit = contact.floor;
        on_floor = contact.floor;
    }

    if let Some(key) = separate_from_pegs(&mut ball, board, physics) {
        peg_hit = peg_hit.or(Some(key));
    }

    ball.rotation = (ball.rotation + ball.vel.x / board.ball_radius).rem_euclid(std::f32::consts::TAU);

    match state.phase {
        DropPhase::Falling => {
            if ball.pos.y > state.best_y + physics.stuck_progress {
                state.best_y = ball.pos.y;
                state.last_progress_frame = frame;
            } else if frame - state.last_progress_frame >= physics.stuck_frames {
                log::debug!(
                    "Frame {}: ball stuck at ({:.1}, {:.1})",
                    frame,
                    ball.pos.x,
                    ball.pos.y
                );
                state.phase = DropPhase::Stuck;
            }
        }
        DropPhase::Bucket => {
            let frames_in_bucket = frame - state.bucket_entry_frame.unwrap_or(frame);
            match bucket::check_settled(
                &ball,
                on_floor,
                &mut state.calm_frames,
                frames_in_bucket,
                physics,
            ) {
                SettleCheck::Moving => {}
                SettleCheck::Settled => {
                    bucket::settle(&mut ball, slot, board);
                    state.phase = DropPhase::Settled;
                }
                SettleCheck::Forced => {
                    log::warn!(
                        "Frame {}: ball still moving after {} bucket frames, forcing settle",
                        frame,
                        frames_in_bucket
                    );
                    bucket::settle(&mut ball, slot, board);
                    state.phase = DropPhase::Settled;
                }
            }
        }
        DropPhase::Resting | DropPhase::Settled | DropPhase::Stuck => {}
    }

    state.ball = ball;

    TrajectoryPoint {
        peg_hit,
        wall_hit,
        bucket_wall_hit,
        bucket_floor_hit,
        ..state.snapshot()
    }
}

/// Run one attempt to completion
///
/// Stops when the ball settles, gets stuck, or the frame cap is reached. A
/// ball still bouncing in its slot at the cap counts as landed; one that never
/// reached the bucket does not.
pub fn simulate(board: &Board, physics: &PhysicsConfig, params: &SimulationParams) -> SimulationRun {
    let mut state = DropState::new(board, physics, params);
    let mut trajectory = Trajectory::with_capacity(physics.max_frames as usize / 2);
    trajectory.push(state.snapshot());

    while state.frame < physics.max_frames && !state.is_finished() {
        let point = tick(&mut state, board, physics);
        trajectory.push(point);
    }

    let landed = state
        .bucket_slot
        .unwrap_or_else(|| board.slot_at(state.ball.pos.x));
    let landing = match state.phase {
        DropPhase::Settled => Landing::Slot(landed),
        DropPhase::Bucket => {
            log::debug!(
                "Frame cap {} reached while settling, accepting slot {}",
                physics.max_frames,
                landed
            );
            Landing::Slot(landed)
        }
        DropPhase::Stuck => Landing::Stuck { frame: state.frame },
        DropPhase::Resting | DropPhase::Falling => Landing::NeverReachedBucket,
    };

    SimulationRun {
        params: *params,
        trajectory,
        landing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BoardConfig;

    fn setup() -> (Board, PhysicsConfig) {
        let physics = PhysicsConfig::default();
        let board = Board::layout(&BoardConfig::default(), &physics).unwrap();
        (board, physics)
    }

    fn params(start_x: f32, seed: u64) -> SimulationParams {
        SimulationParams {
            start_x,
            start_vx: 0.0,
            bounce_randomness: 0.5,
            seed,
        }
    }

    #[test]
    fn test_tick_resting_to_falling() {
        let (board, physics) = setup();
        let mut state = DropState::new(&board, &physics, &params(100.0, 1));
        assert_eq!(state.phase, DropPhase::Resting);
        let point = tick(&mut state, &board, &physics);
        assert_eq!(state.phase, DropPhase::Falling);
        assert_eq!(point.frame, 1);
        assert!(point.y > board.drop_y);
    }

    #[test]
    fn test_gravity_clamped_to_terminal_velocity() {
        let (board, physics) = setup();
        // Drop down the wall lane, clear of every peg
        let mut state = DropState::new(&board, &physics, &params(board.min_x(), 1));
        for _ in 0..60 {
            tick(&mut state, &board, &physics);
            assert!(state.ball.vel.y <= physics.terminal_velocity + 1e-5);
        }
    }

    #[test]
    fn test_simulation_lands_in_a_slot() {
        let (board, physics) = setup();
        let run = simulate(&board, &physics, &params(board.width() / 2.0, 12345));
        let slot = run.landing.slot().expect("ball should land");
        assert!(slot < board.slot_count());
        let last = run.trajectory.last().unwrap();
        assert_eq!(board.slot_at(last.x), slot);
        assert!(run.trajectory.len() <= physics.max_frames as usize + 1);
        // Frames are consecutive from zero
        for (i, point) in run.trajectory.iter().enumerate() {
            assert_eq!(point.frame as usize, i);
        }
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let (board, physics) = setup();
        let a = simulate(&board, &physics, &params(150.0, 42));
        let b = simulate(&board, &physics, &params(150.0, 42));
        assert_eq!(a.trajectory.len(), b.trajectory.len());
        assert_eq!(a.trajectory, b.trajectory);
        assert_eq!(a.landing, b.landing);
    }

    #[test]
    fn test_frame_cap_without_bucket_is_invalid() {
        let (board, mut physics) = setup();
        physics.max_frames = 5;
        let run = simulate(&board, &physics, &params(board.width() / 2.0, 7));
        assert_eq!(run.landing, Landing::NeverReachedBucket);
        assert_eq!(run.landing.index(), -1);
        assert_eq!(run.trajectory.len(), 6);
    }

    #[test]
    fn test_stalled_ball_is_reported_stuck() {
        let (board, mut physics) = setup();
        physics.gravity = 0.001;
        physics.stuck_frames = 10;
        let run = simulate(&board, &physics, &params(board.min_x(), 7));
        assert!(matches!(run.landing, Landing::Stuck { frame: 10 }));
        assert_eq!(run.landing.slot(), None);
    }

    #[test]
    fn test_fast_ball_stays_in_entry_slot() {
        let (board, physics) = setup();
        let mut state = DropState::new(&board, &physics, &params(100.0, 3));
        let (_, right) = board.slot_walls(3);
        state.phase = DropPhase::Bucket;
        state.frame = 200;
        state.bucket_entry_frame = Some(200);
        state.bucket_slot = Some(3);
        state.ball.pos = glam::Vec2::new(right - board.ball_radius - 0.5, board.bucket_zone_y + 20.0);
        state.ball.vel = glam::Vec2::new(10.0, 0.0);

        let point = tick(&mut state, &board, &physics);
        assert_eq!(board.slot_at(point.x), 3);
        assert!(point.x + board.ball_radius <= right + 1e-4);
        assert_eq!(point.bucket_wall_hit, Some(WallSide::Right));

        // Keeps settling in the same slot
        for _ in 0..physics.max_bucket_frames {
            tick(&mut state, &board, &physics);
        }
        assert_eq!(state.phase, DropPhase::Settled);
        assert_eq!(board.slot_at(state.ball.pos.x), 3);
    }

    #[test]
    fn test_settled_ball_rests_on_floor() {
        let (board, physics) = setup();
        let run = simulate(&board, &physics, &params(board.width() / 3.0, 99));
        let last = run.trajectory.last().unwrap();
        if run.landing.slot().is_some() {
            assert!((last.y - (board.bucket_floor_y - board.ball_radius)).abs() < 0.5);
        }
    }
}
