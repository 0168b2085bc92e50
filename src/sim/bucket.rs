//! Bucket physics: slot walls, floor and settling
//!
//! Below the peg field the ball is boxed in by its slot. Walls and floor bounce
//! with low restitution and the floor bleeds horizontal speed, so the ball
//! comes to rest within a few dozen frames.

use super::board::Board;
use super::state::{Ball, WallSide};
use crate::settings::PhysicsConfig;

/// Contacts made while constraining the ball to its slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketContact {
    pub slot: usize,
    pub wall: Option<WallSide>,
    pub floor: bool,
}

/// Keep the ball inside `slot`, the slot it entered the bucket through
pub fn constrain_to_slot(
    ball: &mut Ball,
    slot: usize,
    board: &Board,
    physics: &PhysicsConfig,
) -> BucketContact {
    let r = board.ball_radius;
    let (left, right) = board.slot_walls(slot);
    let mut contact = BucketContact {
        slot,
        ..Default::default()
    };

    if ball.pos.x - r < left {
        ball.pos.x = left + r;
        ball.vel.x = ball.vel.x.abs() * physics.bucket_wall_restitution;
        contact.wall = Some(WallSide::Left);
    } else if ball.pos.x + r > right {
        ball.pos.x = right - r;
        ball.vel.x = -ball.vel.x.abs() * physics.bucket_wall_restitution;
        contact.wall = Some(WallSide::Right);
    }

    let floor = board.bucket_floor_y - r;
    if ball.pos.y >= floor {
        ball.pos.y = floor;
        if ball.vel.y > 0.0 {
            ball.vel.y = -ball.vel.y * physics.bucket_floor_restitution;
        }
        if ball.vel.y.abs() < physics.floor_rest_speed {
            ball.vel.y = 0.0;
        }
        ball.vel.x *= physics.floor_friction;
        contact.floor = true;
    }

    // Floor bounces may not carry the ball back out over the dividers
    let ceiling = board.bucket_zone_y - r;
    if ball.pos.y < ceiling {
        ball.pos.y = ceiling;
        ball.vel.y = ball.vel.y.max(0.0);
    }

    contact
}

/// Outcome of a settle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleCheck {
    Moving,
    Settled,
    /// Bucket frame budget ran out before the ball calmed down
    Forced,
}

/// Track consecutive calm frames and decide whether the ball has settled
pub fn check_settled(
    ball: &Ball,
    on_floor: bool,
    calm_frames: &mut u32,
    frames_in_bucket: u32,
    physics: &PhysicsConfig,
) -> SettleCheck {
    if on_floor && ball.speed() < physics.settle_speed {
        *calm_frames += 1;
    } else {
        *calm_frames = 0;
    }

    if *calm_frames >= physics.settle_frames {
        SettleCheck::Settled
    } else if frames_in_bucket >= physics.max_bucket_frames {
        SettleCheck::Forced
    } else {
        SettleCheck::Moving
    }
}

/// Put the ball to rest on the floor of `slot`
pub fn settle(ball: &mut Ball, slot: usize, board: &Board) {
    let (left, right) = board.slot_walls(slot);
    let r = board.ball_radius;
    ball.pos.x = ball.pos.x.clamp(left + r, right - r);
    ball.pos.y = board.bucket_floor_y - r;
    ball.vel = glam::Vec2::ZERO;
}
