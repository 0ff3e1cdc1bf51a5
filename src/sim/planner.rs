//! Opponent shot selection
//!
//! A rule cascade over the house situation picks a target and shot type,
//! then the target is turned into hack position, power, curl and sweep with
//! a little random error so the opponent is beatable.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::rules::{HouseStone, stones_in_house};
use super::shot::speed_to_power;
use super::state::GameState;
use super::stone::{Curl, Side};
use crate::consts::*;

/// Kind of shot the planner is attempting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotKind {
    /// Come to rest at the target
    Draw,
    /// Stop in front of the house to protect it
    Guard,
    /// Hit the target stone hard enough to remove it
    Takeout,
}

/// Where the planner wants the stone to end up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotPlan {
    pub kind: ShotKind,
    pub target: Vec2,
    /// Intended sweep level (0..1)
    pub sweep: f32,
}

/// Concrete controls for one planner delivery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiShot {
    pub start_x: f32,
    /// Power fraction (0..1)
    pub power: f32,
    pub curl: Curl,
    pub sweep: f32,
}

/// What the planner knows when choosing a shot
#[derive(Debug, Clone)]
pub struct Situation {
    pub side: Side,
    /// Delivered stones still on the sheet (flagged ones included)
    pub live: usize,
    /// Scoring-eligible stones in the house, nearest first
    pub in_house: Vec<HouseStone>,
    /// Live stones sitting between the far hog line and the house
    pub guards: usize,
    /// Stones this side still has to throw, including this one
    pub stones_left: u32,
    pub has_hammer: bool,
    /// Own score minus opponent score
    pub score_diff: i64,
}

impl Situation {
    pub fn from_state(state: &GameState, side: Side) -> Self {
        let live: Vec<_> = state
            .stones
            .iter()
            .filter(|s| !s.removed && s.was_delivered)
            .collect();
        let guards = live
            .iter()
            .filter(|s| !s.in_house() && s.position.y > FAR_HOG_Y + 0.6 && s.position.y < TEE_Y - 0.8)
            .count();
        let remaining_shots = state.total_shots().saturating_sub(state.current_shot);

        Self {
            side,
            live: live.len(),
            in_house: stones_in_house(&state.stones),
            guards,
            stones_left: remaining_shots.div_ceil(2),
            has_hammer: state.hammer_side == side,
            score_diff: state.scores[side.index()] as i64 - state.scores[side.other().index()] as i64,
        }
    }

    fn own_in_house(&self) -> usize {
        self.in_house.iter().filter(|s| s.side == self.side).count()
    }

    fn opponent_in_house(&self) -> usize {
        self.in_house.len() - self.own_in_house()
    }
}

fn jitter(rng: &mut impl Rng, half_width: f32) -> f32 {
    rng.random_range(-half_width..=half_width)
}

/// Pick a target for the next delivery
pub fn plan_shot(situation: &Situation, rng: &mut impl Rng) -> ShotPlan {
    let mut plan = if situation.live == 0 {
        ShotPlan {
            kind: ShotKind::Draw,
            target: Vec2::new(jitter(rng, 0.125), TEE_Y),
            sweep: 0.44,
        }
    } else if let Some(shot_rock) = situation.in_house.first().copied() {
        plan_around_house(situation, shot_rock, rng)
    } else if situation.score_diff < 0 && !situation.has_hammer && situation.stones_left > 2 {
        ShotPlan {
            kind: ShotKind::Guard,
            target: Vec2::new(jitter(rng, 0.35), 14.2),
            sweep: 0.3,
        }
    } else {
        ShotPlan {
            kind: ShotKind::Draw,
            target: Vec2::new(jitter(rng, 0.225), TEE_Y + 0.25),
            sweep: 0.4,
        }
    };

    // A crowded front of the house is not worth adding to
    if plan.kind == ShotKind::Guard && situation.guards > 1 {
        plan.kind = ShotKind::Draw;
        plan.target.y = TEE_Y + 0.45;
    }

    plan
}

fn plan_around_house(situation: &Situation, shot_rock: HouseStone, rng: &mut impl Rng) -> ShotPlan {
    if shot_rock.side != situation.side {
        let danger = shot_rock.distance < 0.9
            || situation.opponent_in_house() >= 2
            || situation.stones_left <= 2
            || situation.score_diff < 0;
        if danger {
            return ShotPlan {
                kind: ShotKind::Takeout,
                target: Vec2::new(
                    shot_rock.position.x,
                    (shot_rock.position.y - 0.15).clamp(FAR_HOG_Y + 0.9, BACK_LINE_Y - 0.5),
                ),
                sweep: 0.24,
            };
        }
        let wing = if shot_rock.position.x > 0.0 { -0.6 } else { 0.6 };
        return ShotPlan {
            kind: ShotKind::Draw,
            target: Vec2::new(wing, TEE_Y + 0.7),
            sweep: 0.4,
        };
    }

    if situation.has_hammer && situation.stones_left > 3 {
        return ShotPlan {
            kind: ShotKind::Guard,
            target: Vec2::new(
                (shot_rock.position.x * 0.4).clamp(-0.6, 0.6),
                14.4 + rng.random_range(0.0..0.4),
            ),
            sweep: 0.25,
        };
    }

    // Freeze onto the shot rock from whichever side is closer to the tee
    let offset = if shot_rock.position.y > TEE_Y { -0.18 } else { 0.18 };
    ShotPlan {
        kind: ShotKind::Draw,
        target: Vec2::new(
            (shot_rock.position.x + jitter(rng, 0.08)).clamp(-1.1, 1.1),
            (shot_rock.position.y + offset).clamp(FAR_HOG_Y + 0.7, TEE_Y + 1.2),
        ),
        sweep: 0.36,
    }
}

/// Power fraction needed to carry from the release line to `target_y`
pub fn estimate_power(target_y: f32, kind: ShotKind, lateral: f32, sweep: f32) -> f32 {
    let effective_mu = BASE_MU * (1.0 - sweep * 0.12);
    let distance = (target_y - RELEASE_LINE_Y).max(4.0);
    let mut speed = (2.0 * effective_mu * GRAVITY * distance).sqrt();
    speed += match kind {
        ShotKind::Takeout => 1.05,
        ShotKind::Guard => 0.18,
        ShotKind::Draw => 0.0,
    };
    speed += lateral * 0.08;
    speed_to_power(speed).clamp(0.2, 0.99)
}

/// Curl that bends the stone from `start_x` toward `target_x`
pub fn estimate_curl(start_x: f32, target_x: f32, kind: ShotKind) -> Curl {
    let delta = target_x - start_x;
    if delta.abs() < 0.08 {
        return Curl::STRAIGHT;
    }
    let mut amount = (delta * 0.7).clamp(-1.0, 1.0);
    match kind {
        ShotKind::Takeout => amount *= 0.5,
        ShotKind::Guard => amount *= 1.1,
        ShotKind::Draw => {}
    }
    Curl::from_amount(amount.clamp(-1.0, 1.0))
}

/// Turn a plan into delivery controls, with execution error
pub fn shot_from_plan(plan: &ShotPlan, rng: &mut impl Rng) -> AiShot {
    let start_x = (plan.target.x * 0.45 + jitter(rng, 0.16)).clamp(-MAX_HACK_X, MAX_HACK_X);
    let curl = estimate_curl(start_x, plan.target.x, plan.kind);
    let power = estimate_power(plan.target.y, plan.kind, (plan.target.x - start_x).abs(), plan.sweep);
    AiShot {
        start_x,
        power: (power + jitter(rng, 0.025)).clamp(0.22, 0.99),
        curl,
        sweep: (plan.sweep + jitter(rng, 0.04)).clamp(0.12, 0.62),
    }
}

/// Plan and execute a shot for `side` using the match RNG
pub fn choose_shot(state: &mut GameState, side: Side) -> AiShot {
    let situation = Situation::from_state(state, side);
    let plan = plan_shot(&situation, &mut state.rng);
    let shot = shot_from_plan(&plan, &mut state.rng);
    log::debug!(
        "{} plans {:?} at ({:.2}, {:.2}) -> start {:.2} power {:.2} curl {} sweep {:.2}",
        side.label(),
        plan.kind,
        plan.target.x,
        plan.target.y,
        shot.start_x,
        shot.power,
        shot.curl.signed(),
        shot.sweep
    );
    shot
}
