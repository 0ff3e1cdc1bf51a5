//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Bounded frame steps split into fixed-size micro-steps
//! - Seeded RNG only
//! - Stable iteration order (by stone creation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod flow;
pub mod physics;
pub mod planner;
pub mod rules;
pub mod shot;
pub mod state;
pub mod stone;
pub mod sweep;
pub mod tick;

pub use collision::{Contact, WallHit, resolve_collisions};
pub use flow::{next_end, start_match};
pub use planner::{AiShot, ShotKind, ShotPlan};
pub use rules::{EndScore, HouseStone, score_end, stones_in_house};
pub use shot::{ShotControls, ShotState, power_to_speed, speed_to_power};
pub use state::{
    CameraMode, EndReview, GameEvent, GameState, MatchResult, SimSpeed, Snapshot, StoneView, WallAlerts,
};
pub use stone::{Curl, CurlTier, RemovalReason, Side, Stone};
pub use sweep::{PointerPhase, SweepSample, SweepState};
pub use tick::{TickInput, tick};
