//! Continuous collision detection and response between the ball and pegs
//!
//! The ball's motion over one frame is a segment from its old to its new
//! position. Every peg is inflated to `ball_radius + peg_radius` and the
//! segment is intersected with each circle; the earliest hit wins, so a fast
//! ball can never tunnel through a peg or resolve against the wrong one.

use std::collections::BTreeMap;

use glam::Vec2;

use super::board::{Board, PegKey};
use super::rng::SeededRng;
use super::state::Ball;
use crate::consts::SEPARATION_EPSILON;
use crate::rotate_vec;
use crate::settings::PhysicsConfig;

/// Pegs hit recently, keyed by peg, valued by the frame of the hit
#[derive(Debug, Clone, Default)]
pub struct RecentCollisions {
    entries: BTreeMap<PegKey, u32>,
    capacity: usize,
}

impl RecentCollisions {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// True if `key` was hit within `cooldown` frames of `frame`
    pub fn is_cooling(&self, key: PegKey, frame: u32, cooldown: u32) -> bool {
        self.entries
            .get(&key)
            .is_some_and(|&hit| frame.saturating_sub(hit) < cooldown)
    }

    /// Record a hit, evicting the oldest entries past capacity
    pub fn record(&mut self, key: PegKey, frame: u32) {
        self.entries.insert(key, frame);
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|&(key, &hit)| (hit, *key))
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved ball/peg contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PegContact {
    pub peg: PegKey,
    /// Fraction of the frame's travel at which contact happened
    pub t: f32,
    /// Unit normal from peg centre to ball centre
    pub normal: Vec2,
}

/// Result of resolving one frame of ball motion against the peg field
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Physics contact, if any
    pub contact: Option<PegContact>,
    /// Corrected position and velocity
    pub pos: Vec2,
    pub vel: Vec2,
    /// Pegs close enough to flash (no physics effect)
    pub pegs_hit: Vec<PegKey>,
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Earliest parametric time in [0, 1] at which a point moving from `start`
/// to `end` comes within `radius` of `center`
pub fn segment_circle_toi(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = end - start;
    let f = start - center;
    let a = d.dot(d);
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;

    if c <= 0.0 {
        // Already touching: a contact unless moving outward
        return (b <= 0.0).then_some(0.0);
    }
    if a < 1e-12 {
        return None;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Find the earliest peg hit along a segment, skipping pegs on cooldown
pub fn sweep_pegs(
    start: Vec2,
    end: Vec2,
    board: &Board,
    recent: &RecentCollisions,
    frame: u32,
    cooldown: u32,
) -> Option<(usize, f32)> {
    let radius = board.collision_radius();
    board
        .pegs
        .iter()
        .enumerate()
        .filter(|(_, peg)| !recent.is_cooling(peg.key(), frame, cooldown))
        .filter_map(|(i, peg)| segment_circle_toi(start, end, peg.pos, radius).map(|t| (i, t)))
        // Ties resolve to the lower index so peg order never changes physics
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
}

/// Pegs within the near-hit distance of `pos`
pub fn near_pegs(pos: Vec2, board: &Board, margin: f32) -> Vec<PegKey> {
    let near = board.collision_radius() + margin;
    let near_sq = near * near;
    board
        .pegs
        .iter()
        .filter(|peg| peg.pos.distance_squared(pos) <= near_sq)
        .map(|peg| peg.key())
        .collect()
}

/// Resolve the ball's motion from `old` to `new` against the pegs
///
/// At the earliest contact the ball is snapped to the impact point, its
/// velocity reflected about the contact normal, damped by restitution,
/// deflected by a random angle scaled by `bounce_randomness`, clamped into
/// `[min_bounce_velocity, max_speed]`, and pushed just outside the peg.
#[allow(clippy::too_many_arguments)]
pub fn resolve_peg_collision(
    old: &Ball,
    new: &Ball,
    board: &Board,
    physics: &PhysicsConfig,
    recent: &mut RecentCollisions,
    frame: u32,
    bounce_randomness: f32,
    rng: &mut SeededRng,
) -> CollisionResult {
    let hit = sweep_pegs(
        old.pos,
        new.pos,
        board,
        recent,
        frame,
        physics.peg_cooldown_frames,
    );

    let Some((index, t)) = hit else {
        return CollisionResult {
            contact: None,
            pos: new.pos,
            vel: new.vel,
            pegs_hit: near_pegs(new.pos, board, physics.near_peg_margin),
        };
    };

    let peg = board.pegs[index];
    let radius = board.collision_radius();
    let impact = old.pos.lerp(new.pos, t);
    let offset = impact - peg.pos;
    let dist = offset.length();

    let (pos, vel, normal) = if dist < 1e-4 {
        // Ball centre on the peg centre: no usable normal, slide off sideways
        (
            peg.pos + Vec2::new(radius, 0.0),
            Vec2::new(physics.min_bounce_velocity, 0.0),
            Vec2::X,
        )
    } else {
        let normal = offset / dist;
        let mut vel = new.vel;
        if vel.dot(normal) < 0.0 {
            vel = reflect_velocity(vel, normal) * physics.peg_restitution;
        }

        let angle = rng.next_signed() * bounce_randomness * physics.max_deflection;
        vel = rotate_vec(vel, angle);

        // Deflection must not point back into the peg
        let into = vel.dot(normal);
        if into < 0.0 {
            vel -= normal * into;
        }

        // A dead-centre landing on top of a peg would bounce in place forever
        if normal.x.abs() < 0.05 && vel.x.abs() < 0.3 {
            vel.x += if rng.next_f32() < 0.5 { -0.5 } else { 0.5 };
        }

        let speed = vel.length();
        let vel = if speed < 1e-6 {
            normal * physics.min_bounce_velocity
        } else {
            vel * (speed.clamp(physics.min_bounce_velocity, physics.max_speed) / speed)
        };

        (peg.pos + normal * (radius + SEPARATION_EPSILON), vel, normal)
    };

    recent.record(peg.key(), frame);

    CollisionResult {
        contact: Some(PegContact {
            peg: peg.key(),
            t,
            normal,
        }),
        pos,
        vel,
        pegs_hit: near_pegs(pos, board, physics.near_peg_margin),
    }
}

/// Final overlap pass: push the ball out of any peg it still overlaps
///
/// Strips the inward velocity component so the ball slides around the peg.
/// Returns the peg that was corrected, if any.
pub fn separate_from_pegs(ball: &mut Ball, board: &Board, physics: &PhysicsConfig) -> Option<PegKey> {
    let radius = board.collision_radius();
    let mut corrected = None;
    for peg in &board.pegs {
        let offset = ball.pos - peg.pos;
        let dist_sq = offset.length_squared();
        if dist_sq >= radius * radius {
            continue;
        }
        let dist = dist_sq.sqrt();
        if dist < 1e-4 {
            ball.pos = peg.pos + Vec2::new(radius + SEPARATION_EPSILON, 0.0);
            ball.vel = Vec2::new(ball.vel.x.abs().max(physics.min_bounce_velocity), 0.0);
        } else {
            let normal = offset / dist;
            ball.pos = peg.pos + normal * (radius + SEPARATION_EPSILON);
            let into = ball.vel.dot(normal);
            if into < 0.0 {
                ball.vel -= normal * into;
            }
        }
        corrected = Some(peg.key());
    }
    corrected
}
