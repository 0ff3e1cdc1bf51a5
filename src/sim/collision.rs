//! Collision detection and response on the sheet
//!
//! Two kinds of contact: a stone against the boards (sides and the far end)
//! and stone against stone. Stones are unit-mass discs; boards are straight
//! lines, so every contact normal is axis-aligned or along the centre line.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::stone::{RemovalReason, Stone};
use crate::consts::*;

/// Which board a stone struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallHit {
    Left,
    Right,
    Back,
}

/// Result of a board check
#[derive(Debug, Clone)]
pub struct WallContact {
    pub wall: WallHit,
    /// Surface normal pointing back onto the ice
    pub normal: Vec2,
    /// Penetration depth past the contact line (for position correction)
    pub penetration: f32,
}

/// Outcome of boundary handling for one stone in one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundaryOutcome {
    pub wall: Option<WallHit>,
    /// Newly flagged for deferred removal this tick
    pub flagged: Option<RemovalReason>,
    /// Removed outright this tick
    pub removed: Option<RemovalReason>,
}

/// A stone-stone contact that exchanged momentum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: u32,
    pub b: u32,
    /// Magnitude of the normal impulse
    pub impulse: f32,
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Lossy bounce: the normal component reverses and is scaled by
/// `restitution`, the tangential component is scaled by `tangent_damping`.
/// With both factors at 1.0 this is `reflect_velocity`.
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32, tangent_damping: f32) -> Vec2 {
    let normal_part = velocity.dot(normal) * normal;
    let tangent_part = velocity - normal_part;
    -normal_part * restitution + tangent_part * tangent_damping
}

/// Check a stone against the side boards and the far board.
///
/// A contact is only reported while the stone moves toward the board, so a
/// stone already bouncing away is not caught twice.
pub fn sheet_wall_collision(pos: Vec2, vel: Vec2, radius: f32) -> Option<WallContact> {
    let side_limit = HALF_WIDTH - radius - SIDEWALL_HIT_MARGIN;
    if pos.x <= -side_limit && vel.x < 0.0 {
        return Some(WallContact {
            wall: WallHit::Left,
            normal: Vec2::X,
            penetration: (-HALF_WIDTH + radius) - pos.x,
        });
    }
    if pos.x >= side_limit && vel.x > 0.0 {
        return Some(WallContact {
            wall: WallHit::Right,
            normal: Vec2::NEG_X,
            penetration: pos.x - (HALF_WIDTH - radius),
        });
    }

    let back_limit = HALF_LENGTH - radius - BACKWALL_HIT_MARGIN;
    if pos.y >= back_limit && vel.y > 0.0 {
        return Some(WallContact {
            wall: WallHit::Back,
            normal: Vec2::NEG_Y,
            penetration: pos.y - (HALF_LENGTH - radius),
        });
    }

    None
}

/// Apply board bounces and out-of-bounds rules to one stone
pub fn collide_walls(stone: &mut Stone) -> BoundaryOutcome {
    let mut outcome = BoundaryOutcome::default();

    if let Some(contact) = sheet_wall_collision(stone.position, stone.velocity, STONE_RADIUS) {
        let (restitution, reason) = match contact.wall {
            WallHit::Left | WallHit::Right => (SIDEWALL_RESTITUTION, RemovalReason::Sidewall),
            WallHit::Back => (BACKWALL_RESTITUTION, RemovalReason::Backwall),
        };
        // Push back onto the ice if the stone overshot the contact line
        if contact.penetration > 0.0 {
            stone.position += contact.normal * contact.penetration;
        }
        stone.velocity = bounce_velocity(stone.velocity, contact.normal, restitution, WALL_TANGENT_DAMPING);
        outcome.wall = Some(contact.wall);
        if stone.flag_for_removal(reason) {
            outcome.flagged = Some(reason);
        }
    }

    if stone.position.y > BACK_LINE_Y + STONE_RADIUS && stone.flag_for_removal(RemovalReason::BackLine) {
        outcome.flagged = Some(RemovalReason::BackLine);
    }

    if stone.position.y < -HALF_LENGTH - STONE_RADIUS && stone.remove(RemovalReason::HackEnd) {
        outcome.removed = Some(RemovalReason::HackEnd);
    }

    outcome
}

/// Resolve overlapping stones pairwise.
///
/// Pairs are visited in creation order (i < j) and corrected one after the
/// other, so a stone touching two others is adjusted twice in the same tick.
/// Overlap is split evenly, then an impulse with restitution
/// `STONE_RESTITUTION` is applied if the pair is closing, plus a small
/// tangential friction impulse.
pub fn resolve_collisions(stones: &mut [Stone]) -> Vec<Contact> {
    let min_dist = STONE_RADIUS * 2.0;
    let mut contacts = Vec::new();

    for i in 0..stones.len() {
        let (head, tail) = stones.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_live() {
            continue;
        }

        for b in tail.iter_mut() {
            if !b.is_live() {
                continue;
            }

            let delta = b.position - a.position;
            let dist = delta.length();
            if dist <= 0.0 || dist >= min_dist {
                continue;
            }

            let normal = delta / dist;
            let overlap = min_dist - dist;
            a.position -= normal * overlap * 0.5;
            b.position += normal * overlap * 0.5;

            let relative = b.velocity - a.velocity;
            let vel_along_normal = relative.dot(normal);
            if vel_along_normal >= 0.0 {
                continue;
            }

            // Unit masses: j = -(1 + e) v_n / (1/m_a + 1/m_b)
            let impulse_mag = -(1.0 + STONE_RESTITUTION) * vel_along_normal / 2.0;
            let impulse = normal * impulse_mag;
            a.velocity -= impulse;
            b.velocity += impulse;

            let tangent = Vec2::new(-normal.y, normal.x);
            let friction = tangent * (relative.dot(tangent) * STONE_TANGENT_FRICTION);
            a.velocity += friction;
            b.velocity -= friction;

            a.moving = true;
            b.moving = true;
            a.touched_stone = true;
            b.touched_stone = true;

            contacts.push(Contact {
                a: a.id,
                b: b.id,
                impulse: impulse_mag,
            });
        }
    }

    contacts
}
