//! Frame stepping
//!
//! `tick` applies one frame of input, then advances the simulation in
//! micro-steps no longer than `MAX_STEP_DT`.

use super::collision::resolve_collisions;
use super::flow;
use super::physics;
use super::shot::{self, ShotState};
use super::state::{GameEvent, GameState};
use super::sweep::{SweepSample, ai_sweep_boost};
use crate::consts::*;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lateral start position on the hack (m)
    pub start_x: Option<f32>,
    pub lock_position: bool,
    /// Power slider value (0..100)
    pub power_percent: Option<f32>,
    pub confirm_power: bool,
    /// Signed curl tier (-3..=3)
    pub curl: Option<i8>,
    pub throw: bool,
    /// Pointer samples from the sweep pad since the last frame
    pub sweep: Vec<SweepSample>,
    /// Continue from the end review
    pub next_end: bool,
    /// Start (or restart) a match with the current settings
    pub new_match: bool,
    pub toggle_strategy_view: bool,
    /// Cycle the fast-forward speed of a planner shot
    pub cycle_speed: bool,
    /// Demo mode: the planner plays both sides
    pub autoplay: bool,
}

/// Advance the game by one rendered frame of `frame_dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, frame_dt: f32) {
    if input.new_match {
        flow::start_match(state);
    }
    flow::set_autoplay(state, input.autoplay);
    apply_input(state, input);

    let frame_dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
    let speed = if state.planner_shot_in_motion() {
        state.sim_speed.factor()
    } else {
        1.0
    };

    let mut remaining = frame_dt * speed;
    while remaining > 1e-6 {
        let dt = remaining.min(MAX_STEP_DT);
        step(state, dt);
        remaining -= dt;
    }
}

fn apply_input(state: &mut GameState, input: &TickInput) {
    if input.cycle_speed {
        if state.planner_shot_in_motion() {
            state.sim_speed = state.sim_speed.next();
        } else {
            log::debug!("Fast forward only applies to planner shots");
        }
    }

    if input.toggle_strategy_view && state.can_use_strategy_view() {
        state.strategy_view = !state.strategy_view;
    }

    if let Some(x) = input.start_x {
        shot::set_start_x(state, x);
    }
    if input.lock_position {
        shot::lock_position(state);
    }
    if let Some(percent) = input.power_percent {
        shot::set_power(state, percent);
    }
    if input.confirm_power {
        shot::confirm_power(state);
    }
    if let Some(curl) = input.curl {
        shot::set_curl(state, curl);
    }
    if input.throw {
        shot::throw_stone(state);
    }

    if !input.sweep.is_empty() {
        if state.shot_state == ShotState::Running && !state.is_planner_turn() {
            for sample in &input.sweep {
                state.sweep.apply(sample);
            }
        } else {
            log::debug!("Ignoring {} sweep samples in {:?}", input.sweep.len(), state.shot_state);
        }
    }

    // Nobody is there to press "next end" in demo mode
    if input.next_end || (state.autoplay && state.shot_state == ShotState::EndReview) {
        flow::next_end(state);
    }
}

/// One fixed micro-step
fn step(state: &mut GameState, dt: f32) {
    state.clock += dt as f64;
    flow::run_due_tasks(state);
    if !state.started {
        return;
    }

    let running = state.shot_state == ShotState::Running;
    let planner_turn = state.is_planner_turn();
    state.sweep.decay(dt, running);
    shot::update_delivery(state, dt);

    let active = state.active_stone;
    let mut events = Vec::new();
    for (index, stone) in state.stones.iter_mut().enumerate() {
        if stone.removed || !stone.moving {
            continue;
        }
        let boost = if running && Some(index) == active {
            if planner_turn {
                state.sweep.ai_boost = ai_sweep_boost(stone);
                state.sweep.ai_boost
            } else {
                state.sweep.boost
            }
        } else {
            0.0
        };

        let outcome = physics::advance(stone, dt, boost);
        if let Some(wall) = outcome.boundary.wall {
            state.wall_alerts.mark(wall);
            events.push(GameEvent::WallHit { id: stone.id, wall });
        }
        if let Some(reason) = outcome.boundary.flagged {
            log::debug!("Stone {} flagged ({:?})", stone.id, reason);
            events.push(GameEvent::StoneFlagged { id: stone.id, reason });
        }
        if let Some(reason) = outcome.removed {
            log::debug!("Stone {} removed ({:?})", stone.id, reason);
            events.push(GameEvent::StoneRemoved { id: stone.id, reason });
        }
    }

    for contact in resolve_collisions(&mut state.stones) {
        log::debug!("Stones {} and {} collide (impulse {:.3})", contact.a, contact.b, contact.impulse);
        events.push(GameEvent::StoneCollision {
            a: contact.a,
            b: contact.b,
            impulse: contact.impulse,
        });
    }

    for stone in state.stones.iter_mut().filter(|s| s.flagged_for_removal && !s.removed) {
        stone.flash_phase += dt * FLASH_RATE;
    }

    if running && !planner_turn && state.sweep.track_reminder(dt) {
        events.push(GameEvent::SweepReminder);
    }
    state.events.extend(events);

    flow::maybe_resolve_shot_stop(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MatchMode, MatchSettings};
    use crate::sim::state::{CameraMode, SimSpeed};
    use crate::sim::stone::RemovalReason;

    const FRAME: f32 = 1.0 / 60.0;

    fn run_until(state: &mut GameState, input: &TickInput, max_frames: usize, done: impl Fn(&GameState) -> bool) {
        for _ in 0..max_frames {
            if done(state) {
                return;
            }
            tick(state, input, FRAME);
        }
    }

    #[test]
    fn test_frame_dt_clamped() {
        let mut state = GameState::new(1, MatchSettings::default());
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.clock - MAX_FRAME_DT as f64).abs() < 1e-6);
    }

    #[test]
    fn test_human_shot_through_ticks() {
        let mut state = GameState::new(5, MatchSettings::new(MatchMode::HumanVsHuman, 1, 4));
        let start = TickInput {
            new_match: true,
            ..Default::default()
        };
        tick(&mut state, &start, FRAME);
        let idle = TickInput::default();
        run_until(&mut state, &idle, 120, |s| s.shot_state == ShotState::Positioning);
        assert_eq!(state.shot_state, ShotState::Positioning);

        let aim = TickInput {
            start_x: Some(0.3),
            lock_position: true,
            power_percent: Some(70.0),
            confirm_power: true,
            curl: Some(1),
            throw: true,
            ..Default::default()
        };
        tick(&mut state, &aim, FRAME);
        assert!(state.shot_state.in_motion());

        run_until(&mut state, &idle, 60 * 60, |s| s.shot_state == ShotState::Settled);
        assert_eq!(state.shot_state, ShotState::Settled);
        let stone = &state.stones[0];
        assert!(!stone.moving);
        assert!(stone.crossed_near_hog);
    }

    #[test]
    fn test_zero_power_stone_voided() {
        let mut state = GameState::new(8, MatchSettings::new(MatchMode::HumanVsHuman, 1, 4));
        flow::start_match(&mut state);
        let idle = TickInput::default();
        run_until(&mut state, &idle, 120, |s| s.shot_state == ShotState::Positioning);

        let aim = TickInput {
            lock_position: true,
            power_percent: Some(0.0),
            confirm_power: true,
            curl: Some(0),
            throw: true,
            ..Default::default()
        };
        tick(&mut state, &aim, FRAME);
        run_until(&mut state, &idle, 60 * 60, |s| s.shot_state == ShotState::Settled);

        let stone = &state.stones[0];
        assert!(stone.removed);
        assert_eq!(stone.removal_reason, Some(RemovalReason::HogLine));
        assert!(stone.position.y < FAR_HOG_Y);
    }

    #[test]
    fn test_sweep_ignored_outside_running() {
        let mut state = GameState::new(2, MatchSettings::new(MatchMode::HumanVsHuman, 1, 4));
        flow::start_match(&mut state);
        let input = TickInput {
            sweep: vec![SweepSample::down(0.0, 0.0), SweepSample::moved(400.0, 10.0)],
            ..Default::default()
        };
        tick(&mut state, &input, FRAME);
        assert_eq!(state.sweep.boost, 0.0);
    }

    #[test]
    fn test_strategy_view_only_while_aiming() {
        let mut state = GameState::new(6, MatchSettings::new(MatchMode::HumanVsHuman, 1, 4));
        let toggle = TickInput {
            toggle_strategy_view: true,
            ..Default::default()
        };
        tick(&mut state, &toggle, FRAME);
        assert!(!state.strategy_view);

        flow::start_match(&mut state);
        run_until(&mut state, &TickInput::default(), 120, |s| s.shot_state == ShotState::Positioning);
        tick(&mut state, &toggle, FRAME);
        assert!(state.strategy_view);
        assert_eq!(state.camera_hint(), CameraMode::Strategy);

        // Throwing leaves the overhead view
        let aim = TickInput {
            lock_position: true,
            confirm_power: true,
            throw: true,
            ..Default::default()
        };
        tick(&mut state, &aim, FRAME);
        assert!(!state.strategy_view);
        assert_ne!(state.camera_hint(), CameraMode::Strategy);
    }

    #[test]
    fn test_fast_forward_only_for_planner_shots() {
        let mut state = GameState::new(4, MatchSettings::new(MatchMode::HumanVsHuman, 1, 4));
        flow::start_match(&mut state);
        let cycle = TickInput {
            cycle_speed: true,
            ..Default::default()
        };
        tick(&mut state, &cycle, FRAME);
        assert_eq!(state.sim_speed, SimSpeed::X1);

        // Planner delivering: fast forward doubles simulated time
        let auto = TickInput {
            autoplay: true,
            ..Default::default()
        };
        run_until(&mut state, &auto, 600, |s| s.shot_state.in_motion());
        assert!(state.planner_shot_in_motion());
        let cycle_auto = TickInput {
            autoplay: true,
            cycle_speed: true,
            ..Default::default()
        };
        tick(&mut state, &cycle_auto, FRAME);
        assert_eq!(state.sim_speed, SimSpeed::X2);
        let before = state.clock;
        tick(&mut state, &auto, FRAME);
        assert!((state.clock - before - 2.0 * FRAME as f64).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_match() {
        let settings = MatchSettings::new(MatchMode::HumanVsAi, 1, 1);
        let auto = TickInput {
            autoplay: true,
            ..Default::default()
        };
        let play = |seed: u64| {
            let mut state = GameState::new(seed, settings.clone());
            flow::start_match(&mut state);
            run_until(&mut state, &auto, 60 * 120, |s| s.result.is_some());
            state
        };

        let a = play(21);
        let b = play(21);
        assert!(a.result.is_some());
        assert_eq!(a.result, b.result);
        assert_eq!(a.stones.len(), b.stones.len());
        for (sa, sb) in a.stones.iter().zip(&b.stones) {
            assert_eq!(sa.position, sb.position);
            assert_eq!(sa.removed, sb.removed);
        }
    }

    #[test]
    fn test_autoplay_runs_multi_end_match() {
        let mut state = GameState::new(77, MatchSettings::new(MatchMode::HumanVsAi, 2, 1));
        let auto = TickInput {
            autoplay: true,
            ..Default::default()
        };
        flow::start_match(&mut state);
        run_until(&mut state, &auto, 60 * 240, |s| s.result.is_some());

        let result = state.result.clone().unwrap();
        assert_eq!(result.ends_played, 2);
        assert_eq!(state.shot_state, ShotState::GameOver);
        let ended = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::EndScored(_)))
            .count();
        assert_eq!(ended, 2);
    }
}
