//! Fighter physics and collision against one-way platforms
//!
//! Each tick a fighter's intent becomes velocity, gravity is applied, the
//! position is integrated, and the result is resolved against platform
//! tops (landing), undersides (head bumps), sides, the ground and the arena
//! walls, in that order.

use glam::Vec2;

use super::state::{ArenaBounds, DashState, Fighter, Platform};
use super::tick::Intent;
use crate::tuning::PhysicsTuning;

/// Index of the platform a fighter is standing on, if any.
///
/// `feet_y` is compared against each platform top with `tolerance_y`; the
/// platform's horizontal span is widened by `tolerance_x`.
pub fn platform_under(platforms: &[Platform], x: f32, feet_y: f32, tolerance_x: f32, tolerance_y: f32) -> Option<usize> {
    platforms
        .iter()
        .position(|p| p.spans_x(x, tolerance_x) && (feet_y - p.y).abs() < tolerance_y)
}

/// Circle-vs-point overlap used by every hit check
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance(b) < radius
}

/// Advance one living fighter by `dt` seconds
pub fn step_fighter(
    fighter: &mut Fighter,
    intent: &Intent,
    platforms: &[Platform],
    bounds: ArenaBounds,
    physics: &PhysicsTuning,
    dt: f32,
) {
    if !fighter.alive {
        return;
    }

    let prev = fighter.pos;
    let axis = intent.horizontal_axis();

    // Facing follows input unless a dash owns it
    if !fighter.is_dashing() {
        if let Some(facing) = crate::Facing::from_sign(axis) {
            fighter.facing = facing;
        }
    }

    // Horizontal velocity: instant, or forced while dashing
    match fighter.dash {
        DashState::Active { direction, remaining } => {
            let remaining = remaining - dt;
            fighter.facing = direction;
            if remaining <= 0.0 {
                fighter.dash = DashState::Inactive;
                fighter.vel.x = 0.0;
            } else {
                fighter.dash = DashState::Active { direction, remaining };
                fighter.vel.x = direction.sign() * physics.dash_speed;
            }
        }
        DashState::Inactive => {
            fighter.vel.x = axis * fighter.speed();
        }
    }

    fighter.dash_cooldown = (fighter.dash_cooldown - dt).max(0.0);
    fighter.punch_cooldown = (fighter.punch_cooldown - dt).max(0.0);

    if intent.up && fighter.grounded {
        fighter.vel.y = -physics.jump_velocity;
        fighter.grounded = false;
    }

    fighter.vel.y += physics.gravity * dt;
    fighter.pos += fighter.vel * dt;
    // Contact is re-established below by landing or the ground clamp
    fighter.grounded = false;

    resolve_landing(fighter, prev, platforms, physics);
    resolve_head_bump(fighter, prev, platforms, physics);
    resolve_sides(fighter, prev, platforms, physics);

    // Ground (at-or-below, so a zero-length step keeps a resting fighter grounded)
    if fighter.feet_y(physics.feet_offset) >= bounds.ground_y {
        fighter.pos.y = bounds.ground_y - physics.feet_offset;
        fighter.vel.y = 0.0;
        fighter.grounded = true;
    }
    // Arena walls
    fighter.pos.x = fighter
        .pos
        .x
        .clamp(physics.world_margin, (bounds.width - physics.world_margin).max(physics.world_margin));
}

/// One-way landing: feet crossed a platform top from above while falling
fn resolve_landing(fighter: &mut Fighter, prev: Vec2, platforms: &[Platform], physics: &PhysicsTuning) {
    if fighter.vel.y < 0.0 {
        return;
    }
    let prev_feet = prev.y + physics.feet_offset;
    let feet = fighter.feet_y(physics.feet_offset);
    let landed_on = platforms.iter().find(|p| {
        p.spans_x(fighter.pos.x, physics.platform_edge_tolerance) && prev_feet <= p.y && feet >= p.y
    });
    if let Some(platform) = landed_on {
        fighter.pos.y = platform.y - physics.feet_offset;
        fighter.vel.y = 0.0;
        fighter.grounded = true;
    }
}

/// Stop upward motion at a platform underside
fn resolve_head_bump(fighter: &mut Fighter, prev: Vec2, platforms: &[Platform], physics: &PhysicsTuning) {
    if fighter.vel.y >= 0.0 {
        return;
    }
    let prev_head = prev.y - physics.head_offset;
    for platform in platforms {
        let head = fighter.pos.y - physics.head_offset;
        let bottom = platform.bottom();
        if platform.spans_x(fighter.pos.x, physics.platform_edge_tolerance)
            && prev_head >= bottom
            && head <= bottom
            && fighter.vel.y < 0.0
        {
            fighter.pos.y = bottom + physics.head_offset;
            fighter.vel.y = 0.0;
        }
    }
}

/// Block walking through a platform's left/right edge
fn resolve_sides(fighter: &mut Fighter, prev: Vec2, platforms: &[Platform], physics: &PhysicsTuning) {
    let half = physics.body_half_width;
    for platform in platforms {
        let body_top = fighter.pos.y - physics.head_offset;
        let body_bottom = fighter.feet_y(physics.feet_offset);
        let overlaps = body_bottom > platform.y - physics.side_block_margin
            && body_top < platform.bottom() + physics.side_block_margin;
        if !overlaps {
            continue;
        }
        if prev.x + half <= platform.left() && fighter.pos.x + half > platform.left() {
            fighter.pos.x = platform.left() - half;
            fighter.vel.x = 0.0;
        }
        if prev.x - half >= platform.right() && fighter.pos.x - half < platform.right() {
            fighter.pos.x = platform.right() + half;
            fighter.vel.x = 0.0;
        }
    }
}
