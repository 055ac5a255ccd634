//! Collision detection and response for circles
//!
//! Pegs, balls and bucket walls are all circles or axis-aligned lines, so the
//! geometry stays simple; the interesting part is the response, which pushes
//! past the contact and over-corrects the reflection so a ball never sinks
//! back into the same peg on the next tick.

use glam::Vec2;

use super::state::Ball;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at contact, pointing toward the ball centre
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between a ball and a circular peg (or any other circle)
pub fn circle_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    other_pos: Vec2,
    other_radius: f32,
) -> CollisionResult {
    let delta = ball_pos - other_pos;
    let reach = ball_radius + other_radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Dead centre: push straight up, against gravity
    let normal = if dist > 1e-4 { delta / dist } else { Vec2::NEG_Y };
    CollisionResult {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Bounce velocity off a surface, losing energy along the normal
///
/// Only an approaching velocity is changed. The normal component comes out
/// with magnitude `|v·n| * ((1 + restitution) * overcorrection - 1)`.
#[inline]
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32, overcorrection: f32) -> Vec2 {
    let approach = velocity.dot(normal);
    if approach >= 0.0 {
        return velocity;
    }
    velocity - (1.0 + restitution) * overcorrection * approach * normal
}

/// Keep `x` within `[min_x, max_x]`, reflecting `vx` off the side it crossed
///
/// Returns the corrected `(x, vx)` and whether a wall was hit.
pub fn clamp_to_walls(x: f32, vx: f32, min_x: f32, max_x: f32, restitution: f32) -> (f32, f32, bool) {
    if x < min_x {
        (min_x, vx.abs() * restitution, true)
    } else if x > max_x {
        (max_x, -vx.abs() * restitution, true)
    } else {
        (x, vx, false)
    }
}

/// Separate two overlapping balls of equal radius and mass
///
/// Sleeping balls act as fixed obstacles and are never woken. Push-out is
/// bounded by the overlap, so crowding causes jitter at worst.
pub fn resolve_ball_pair(a: &mut Ball, b: &mut Ball, radius: f32, restitution: f32) -> bool {
    if a.asleep && b.asleep {
        return false;
    }
    let contact = circle_collision(a.pos, radius, b.pos, radius);
    if !contact.hit {
        return false;
    }
    let n = contact.normal;

    match (a.asleep, b.asleep) {
        (false, true) => {
            a.pos += n * contact.penetration;
            a.vel = bounce_velocity(a.vel, n, restitution, 1.0);
        }
        (true, false) => {
            b.pos -= n * contact.penetration;
            b.vel = bounce_velocity(b.vel, -n, restitution, 1.0);
        }
        _ => {
            a.pos += n * (contact.penetration / 2.0);
            b.pos -= n * (contact.penetration / 2.0);
            let closing = (a.vel - b.vel).dot(n);
            if closing < 0.0 {
                let impulse = -(1.0 + restitution) * closing / 2.0;
                a.vel += n * impulse;
                b.vel -= n * impulse;
            }
        }
    }
    true
}

/// Resolve every overlapping pair among `balls` selected by `indices`
///
/// Each pair is handled once per call, in index order.
pub fn resolve_ball_pairs(balls: &mut [Ball], indices: &[usize], radius: f32, restitution: f32) {
    for (k, &i) in indices.iter().enumerate() {
        for &j in &indices[k + 1..] {
            let (lo, hi) = if i < j { (i, j) } else { (j, i) };
            let (left, right) = balls.split_at_mut(hi);
            resolve_ball_pair(&mut left[lo], &mut right[0], radius, restitution);
        }
    }
}
