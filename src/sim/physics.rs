//! Per-stone integration: settling, ice friction, curl and boards
//!
//! `advance` moves one stone by one increment. Stone-stone contact is not
//! handled here; the tick runs `collision::resolve_collisions` once after
//! every stone has been advanced.

use glam::Vec2;

use super::collision::{BoundaryOutcome, collide_walls};
use super::rules::enforce_stopped_rules;
use super::stone::{CurlTier, RemovalReason, Stone};
use crate::consts::*;

/// What happened to a stone during one `advance`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    /// The stone came to rest this tick
    pub stopped: bool,
    /// Removed by the stop rules or by leaving the hack end
    pub removed: Option<RemovalReason>,
    /// Board contact and deferred-removal flags
    pub boundary: BoundaryOutcome,
}

/// Effective friction coefficient for a stone at `speed`
pub fn friction_coefficient(stone: &Stone, speed: f32, sweep_boost: f32) -> f32 {
    let sweep = 1.0 - sweep_boost.clamp(0.0, 1.0) * SWEEP_FRICTION_CUT;
    let low_speed_gain =
        1.0 + ((LOW_SPEED_GRAB - speed) / LOW_SPEED_GRAB).clamp(0.0, 1.0) * LOW_SPEED_GRAB_GAIN;
    let backend_gain = if stone.position.y > FAR_HOG_Y { BACKEND_GAIN } else { 1.0 };
    (BASE_MU * stone.friction_scale * sweep * low_speed_gain * backend_gain)
        .clamp(MIN_MU, BASE_MU * MAX_MU_FACTOR)
}

/// Lateral direction for curl: the velocity direction turned 90° clockwise
#[inline]
pub fn curl_direction(velocity: Vec2) -> Vec2 {
    let dir = velocity.normalize_or_zero();
    Vec2::new(dir.y, -dir.x)
}

/// Lateral acceleration (along `curl_direction`) for the current state
pub fn curl_acceleration(stone: &Stone, speed: f32) -> f32 {
    if stone.curl_tier == CurlTier::None {
        // No handle: an unpredictable drift rather than a directional curl
        let wave = (stone.wobble_phase + stone.distance_travelled * WOBBLE_FREQUENCY).sin();
        return WOBBLE_AMPLITUDE * wave + stone.wobble_bias;
    }

    let progress = ((stone.position.y - RELEASE_LINE_Y) / (TEE_Y - RELEASE_LINE_Y + 8.0)).clamp(0.0, 1.0);
    let late_gain = 0.08 + progress * 0.68;
    let speed_loss = ((stone.initial_speed - speed) / stone.initial_speed.max(0.2)).clamp(0.0, 1.1);
    CURL_COEFFICIENT * stone.curl_factor * stone.spin_sign * (late_gain + 0.22 + speed_loss * 0.36)
}

/// Advance one moving stone by `dt` seconds with the given sweep boost (0..1)
pub fn advance(stone: &mut Stone, dt: f32, sweep_boost: f32) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    if !stone.moving || stone.removed {
        return outcome;
    }

    if stone.position.y >= RELEASE_LINE_Y {
        stone.crossed_near_hog = true;
    }
    if stone.position.y >= FAR_HOG_Y {
        stone.crossed_far_hog = true;
    }

    // Settle: either nearly stationary, or slow for the whole window
    let speed = stone.speed();
    if speed < LOW_SPEED_SETTLE {
        stone.low_speed_time += dt;
    } else {
        stone.low_speed_time = 0.0;
    }
    if speed <= STOP_SPEED || stone.low_speed_time > SETTLE_WINDOW {
        stone.velocity = Vec2::ZERO;
        stone.moving = false;
        stone.low_speed_time = 0.0;
        outcome.stopped = true;
        outcome.removed = enforce_stopped_rules(stone);
        return outcome;
    }

    // Friction only ever removes speed
    let mu = friction_coefficient(stone, speed, sweep_boost);
    let next_speed = (speed - mu * GRAVITY * dt).max(0.0);
    stone.velocity = stone.velocity.normalize_or_zero() * next_speed;

    if stone.crossed_near_hog && stone.velocity.length_squared() > CURL_MIN_SPEED_SQ {
        let lateral = curl_direction(stone.velocity);
        stone.velocity += lateral * curl_acceleration(stone, next_speed) * dt;
    }

    let movement = stone.velocity * dt;
    stone.position += movement;
    stone.distance_travelled += movement.length();
    spin_handle(stone, dt);

    outcome.boundary = collide_walls(stone);
    outcome.removed = outcome.boundary.removed;
    outcome
}

/// Visual handle rotation: slow idle drift plus the delivered spin
fn spin_handle(stone: &mut Stone, dt: f32) {
    let speed_pct = (stone.speed() / 3.0).clamp(0.0, 1.0);
    let rate = stone.idle_spin_dir * HANDLE_IDLE_ROTATION_SPEED * crate::lerp(0.45, 1.0, speed_pct)
        + stone.spin_sign * stone.spin_strength * 7.0;
    stone.handle_spin += rate * dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::stone::{Curl, Side};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 120.0;

    fn moving_stone(pos: Vec2, vel: Vec2) -> Stone {
        let mut s = Stone::new(1, Side::Red, &mut Pcg32::seed_from_u64(3));
        s.position = pos;
        s.velocity = vel;
        s.moving = true;
        s
    }

    /// Release a stone at the near hog line and run it to rest
    fn slide(curl: Curl, speed: f32, seed: u64) -> (Vec<Vec2>, f32, Stone) {
        let mut s = Stone::new(1, Side::Red, &mut Pcg32::seed_from_u64(seed));
        s.deliver(speed, curl, 0.0);
        s.position = Vec2::new(0.0, RELEASE_LINE_Y);
        s.velocity = Vec2::new(0.0, speed);
        let mut track = vec![s.position];
        let mut elapsed = 0.0;
        for _ in 0..(120 * 60) {
            if !s.moving || s.flagged_for_removal {
                break;
            }
            advance(&mut s, DT, 0.0);
            elapsed += DT;
            track.push(s.position);
        }
        (track, elapsed, s)
    }

    #[test]
    fn test_stone_decelerates_and_stops() {
        let mut s = moving_stone(Vec2::new(0.0, -15.0), Vec2::new(0.0, 1.0));
        let mut ticks = 0;
        while s.moving && ticks < 120 * 60 {
            advance(&mut s, DT, 0.0);
            ticks += 1;
        }
        assert!(!s.moving);
        assert_eq!(s.velocity, Vec2::ZERO);
        assert!(s.distance_travelled > 0.5);
    }

    #[test]
    fn test_settle_window() {
        // Slow but above STOP_SPEED: stops once the window elapses
        let mut s = moving_stone(Vec2::new(0.0, -15.0), Vec2::new(0.0, 0.05));
        let outcome = advance(&mut s, 0.1, 0.0);
        assert!(!outcome.stopped);
        let outcome = advance(&mut s, 0.1, 0.0);
        assert!(outcome.stopped);
        assert!(!s.moving);
    }

    #[test]
    fn test_sweeping_reduces_friction() {
        let s = moving_stone(Vec2::new(0.0, 0.0), Vec2::new(0.0, 2.0));
        let plain = friction_coefficient(&s, 2.0, 0.0);
        let swept = friction_coefficient(&s, 2.0, 1.0);
        assert!((swept - plain * (1.0 - SWEEP_FRICTION_CUT)).abs() < 1e-6);
    }

    #[test]
    fn test_friction_grabs_at_low_speed_and_backend() {
        let mut s = moving_stone(Vec2::new(0.0, 0.0), Vec2::new(0.0, 2.0));
        let fast = friction_coefficient(&s, 2.0, 0.0);
        let slow = friction_coefficient(&s, 0.2, 0.0);
        assert!(slow > fast);
        assert!(slow <= BASE_MU * MAX_MU_FACTOR);

        s.position.y = FAR_HOG_Y + 1.0;
        let backend = friction_coefficient(&s, 2.0, 0.0);
        assert!((backend - fast * BACKEND_GAIN).abs() < 1e-6);
    }

    #[test]
    fn test_hog_flags_set_once() {
        let mut s = moving_stone(Vec2::new(0.0, FAR_HOG_Y - 0.001), Vec2::new(0.0, 2.0));
        advance(&mut s, DT, 0.0);
        advance(&mut s, DT, 0.0);
        assert!(s.crossed_near_hog);
        assert!(s.crossed_far_hog);
        // Sliding back does not clear the flag
        s.velocity = Vec2::new(0.0, -2.0);
        s.position.y = FAR_HOG_Y - 1.0;
        advance(&mut s, DT, 0.0);
        assert!(s.crossed_far_hog);
    }

    #[test]
    fn test_no_curl_before_release_line() {
        let mut s = moving_stone(Vec2::new(0.0, -15.0), Vec2::new(0.0, 2.0));
        s.set_curl(Curl::from_signed(3));
        s.initial_speed = 2.0;
        for _ in 0..60 {
            advance(&mut s, DT, 0.0);
        }
        assert_eq!(s.position.x, 0.0);
        assert_eq!(s.velocity.x, 0.0);
    }

    #[test]
    fn test_curl_drift_is_sign_consistent() {
        for (signed, expect_right) in [(1_i8, true), (2, true), (3, true), (-1, false), (-3, false)] {
            let (track, _, _) = slide(Curl::from_signed(signed), 2.2, 11);
            for pair in track.windows(2) {
                if expect_right {
                    assert!(pair[1].x >= pair[0].x, "tier {} drifted left", signed);
                } else {
                    assert!(pair[1].x <= pair[0].x, "tier {} drifted right", signed);
                }
            }
            let end_x = track.last().map(|p| p.x).unwrap_or(0.0);
            assert!(end_x.abs() > 0.05, "tier {} barely curled: {}", signed, end_x);
        }
    }

    #[test]
    fn test_stronger_tier_curls_further() {
        let (light, _, _) = slide(Curl::from_signed(1), 2.2, 5);
        let (strong, _, _) = slide(Curl::from_signed(3), 2.2, 5);
        let light_x = light.last().map(|p| p.x).unwrap_or(0.0);
        let strong_x = strong.last().map(|p| p.x).unwrap_or(0.0);
        assert!(strong_x > light_x);
    }

    #[test]
    fn test_no_handle_wobble_is_bounded() {
        for seed in [1_u64, 2, 3, 4] {
            let (track, elapsed, stone) = slide(Curl::STRAIGHT, 2.2, seed);
            let end_x = track.last().map(|p| p.x).unwrap_or(0.0);
            // Lateral acceleration never exceeds amplitude + |bias|
            let bound = 0.5 * (WOBBLE_AMPLITUDE + stone.wobble_bias.abs()) * elapsed * elapsed;
            assert!(end_x != 0.0);
            assert!(end_x.abs() <= bound + 1e-3, "seed {}: {} > {}", seed, end_x, bound);
        }
    }

    #[test]
    fn test_handle_spin_follows_curl_direction() {
        let (_, _, cw) = slide(Curl::from_signed(2), 2.0, 9);
        let (_, _, ccw) = slide(Curl::from_signed(-2), 2.0, 9);
        assert!(cw.handle_spin > 0.0);
        assert!(ccw.handle_spin < 0.0);
    }

    proptest! {
        #[test]
        fn friction_never_accelerates(
            speed in 0.1f32..3.5,
            angle in -0.4f32..0.4,
            y in -19.0f32..-10.5,
            boost in 0.0f32..1.0,
        ) {
            // Behind the release line there is no curl, so only friction acts
            let vel = Vec2::new(angle.sin(), angle.cos()) * speed;
            let mut s = moving_stone(Vec2::new(0.0, y), vel);
            let before = s.speed();
            advance(&mut s, DT, boost);
            prop_assert!(s.speed() <= before + 1e-6);
        }

        #[test]
        fn friction_coefficient_clamped(speed in 0.0f32..4.0, boost in 0.0f32..1.0, y in -20.0f32..22.0) {
            let s = moving_stone(Vec2::new(0.0, y), Vec2::new(0.0, speed));
            let mu = friction_coefficient(&s, speed, boost);
            prop_assert!(mu >= MIN_MU);
            prop_assert!(mu <= BASE_MU * MAX_MU_FACTOR);
        }
    }
}
