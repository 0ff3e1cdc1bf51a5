//! Shot controller: aiming states, power mapping and the delivery ramp

use serde::{Deserialize, Serialize};

use super::state::{CameraMode, GameEvent, GameState};
use super::stone::Curl;
use crate::consts::*;

/// Phase of the current shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShotState {
    /// No match running, or between ends before the first shot
    #[default]
    Idle,
    /// Choosing the lateral start position on the hack
    Positioning,
    /// Choosing release speed
    Power,
    /// Choosing curl, waiting for the throw
    CurlSetup,
    /// Stone pushing out of the hack toward its release speed
    Delivery,
    /// Released, sliding; sweeping is accepted
    Running,
    /// Every stone at rest, waiting for the next shot
    Settled,
    /// End scored, waiting for the players to continue
    EndReview,
    GameOver,
}

impl ShotState {
    /// The delivered stone (and possibly others) is in motion
    #[inline]
    pub fn in_motion(self) -> bool {
        matches!(self, ShotState::Delivery | ShotState::Running)
    }

    /// A player is still setting up the shot
    #[inline]
    pub fn is_aiming(self) -> bool {
        matches!(self, ShotState::Positioning | ShotState::Power | ShotState::CurlSetup)
    }
}

/// Raw control values as last written by the input layer.
/// Clamping happens when the shot is committed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotControls {
    /// Lateral offset on the hack (m)
    pub start_x: f32,
    /// Release power as a fraction (0..1)
    pub power: f32,
    /// Signed curl tier (-3..=3)
    pub curl: i8,
}

pub const DEFAULT_POWER: f32 = 0.65;

impl Default for ShotControls {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            power: DEFAULT_POWER,
            curl: 0,
        }
    }
}

/// Map a power fraction (0..1) to a release speed.
/// The curve keeps most of the slider in the draw-weight range.
pub fn power_to_speed(power: f32) -> f32 {
    let p = power.clamp(0.0, 1.0);
    MIN_SHOT_SPEED + (MAX_SHOT_SPEED - MIN_SHOT_SPEED) * p.powf(POWER_CURVE)
}

/// Inverse of [`power_to_speed`]; speeds outside the range clamp to 0 or 1
pub fn speed_to_power(speed: f32) -> f32 {
    let normalized = ((speed - MIN_SHOT_SPEED) / (MAX_SHOT_SPEED - MIN_SHOT_SPEED)).clamp(0.0, 1.0);
    normalized.powf(1.0 / POWER_CURVE)
}

fn human_may_act(state: &GameState, command: &str, expected: &[ShotState]) -> bool {
    if !state.started || state.is_planner_turn() {
        log::debug!("Ignoring {}: not a human turn", command);
        return false;
    }
    if !expected.contains(&state.shot_state) {
        log::debug!("Ignoring {} in {:?}", command, state.shot_state);
        return false;
    }
    true
}

/// Slide the waiting stone across the hack
pub fn set_start_x(state: &mut GameState, x: f32) -> bool {
    if !human_may_act(state, "set_start_x", &[ShotState::Positioning]) {
        return false;
    }
    state.controls.start_x = x;
    if let Some(stone) = state.active_stone_mut() {
        stone.position.x = x.clamp(-MAX_HACK_X, MAX_HACK_X);
    }
    true
}

/// Fix the start position and move on to power
pub fn lock_position(state: &mut GameState) -> bool {
    if !human_may_act(state, "lock_position", &[ShotState::Positioning]) {
        return false;
    }
    let x = state.controls.start_x.clamp(-MAX_HACK_X, MAX_HACK_X);
    if let Some(stone) = state.active_stone_mut() {
        stone.position.x = x;
    }
    state.shot_state = ShotState::Power;
    true
}

/// Set power from a slider percentage (0..100)
pub fn set_power(state: &mut GameState, percent: f32) -> bool {
    if !human_may_act(state, "set_power", &[ShotState::Power, ShotState::CurlSetup]) {
        return false;
    }
    state.controls.power = percent / 100.0;
    true
}

pub fn confirm_power(state: &mut GameState) -> bool {
    if !human_may_act(state, "confirm_power", &[ShotState::Power]) {
        return false;
    }
    state.shot_state = ShotState::CurlSetup;
    true
}

/// Choose a signed curl tier (-3..=3)
pub fn set_curl(state: &mut GameState, tier: i8) -> bool {
    if !human_may_act(state, "set_curl", &[ShotState::CurlSetup]) {
        return false;
    }
    state.controls.curl = tier;
    true
}

/// Commit the human's controls and release the stone
pub fn throw_stone(state: &mut GameState) -> bool {
    if !human_may_act(state, "throw_stone", &[ShotState::CurlSetup]) {
        return false;
    }
    let controls = state.controls;
    begin_delivery(state, controls.power, Curl::from_signed(controls.curl), 0.4);
    true
}

/// Push the active stone out of the hack. `power` is clamped to 0..1 here.
pub fn begin_delivery(state: &mut GameState, power: f32, curl: Curl, ai_sweep: f32) {
    let power = power.clamp(0.0, 1.0);
    let side = state.active_side;
    let target_speed = power_to_speed(power);

    let Some(stone) = state.active_stone_mut() else {
        log::warn!("begin_delivery without an active stone");
        return;
    };
    stone.deliver(target_speed, curl, ai_sweep);
    let id = stone.id;
    let start_x = stone.position.x;

    state.controls.power = power;
    state.controls.curl = curl.signed();
    state.shot_state = ShotState::Delivery;
    state.camera_mode = CameraMode::Delivery;
    state.strategy_view = false;

    log::debug!(
        "{} delivers stone {} from x={:.2} power={:.2} curl={}",
        side.label(),
        id,
        start_x,
        power,
        curl.signed()
    );
    state.emit(GameEvent::StoneDelivered {
        id,
        side,
        speed: target_speed,
        curl: curl.signed(),
    });
}

/// Delivery ramp: accelerate toward the target speed until the release line
pub fn update_delivery(state: &mut GameState, dt: f32) {
    if state.shot_state != ShotState::Delivery {
        return;
    }
    let Some(stone) = state.active_stone_mut() else {
        return;
    };
    if stone.removed {
        return;
    }

    let speed = stone.speed();
    let next_speed = (speed + DELIVERY_ACCEL * dt).min(stone.target_speed);
    if speed > 0.001 {
        stone.velocity *= next_speed / speed;
    } else {
        stone.velocity = glam::Vec2::new(0.0, next_speed);
    }

    if stone.position.y >= RELEASE_LINE_Y {
        state.shot_state = ShotState::Running;
        state.camera_mode = CameraMode::Follow;
    }
}
