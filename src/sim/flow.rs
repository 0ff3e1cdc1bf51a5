//! Turn, end and match progression
//!
//! Every delayed transition goes through [`schedule`]; a task captures the
//! current `turn_token` and is dropped if the token has moved on by the
//! time it falls due.

use rand::Rng;

use super::planner;
use super::rules::{enforce_stopped_rules, score_end};
use super::shot::{self, ShotControls, ShotState};
use super::state::{
    CameraMode, Deferred, EndReview, GameEvent, GameState, MatchResult, ScheduledTask, SimSpeed,
};
use super::stone::{RemovalReason, Side};
use crate::consts::*;

/// Queue `action` to run `delay` simulated seconds from now
pub fn schedule(state: &mut GameState, delay: f64, action: Deferred) {
    state.scheduled.push(ScheduledTask {
        due: state.clock + delay,
        token: state.turn_token,
        action,
    });
}

/// Run every task that has fallen due, discarding stale ones
pub fn run_due_tasks(state: &mut GameState) {
    if state.scheduled.is_empty() {
        return;
    }
    let now = state.clock;
    let (mut due, pending): (Vec<_>, Vec<_>) = state.scheduled.drain(..).partition(|t| t.due <= now);
    state.scheduled = pending;
    due.sort_by(|a, b| a.due.total_cmp(&b.due));

    for task in due {
        if !state.started || task.token != state.turn_token {
            log::debug!("Dropping stale {:?} (token {} != {})", task.action, task.token, state.turn_token);
            continue;
        }
        match task.action {
            Deferred::FirstShot => start_next_shot(state),
            Deferred::AiCommit => commit_ai_shot(state),
            Deferred::AdvanceShot => advance_shot(state),
        }
    }
}

/// Reset scores and stones, draw the hammer and schedule the first shot
pub fn start_match(state: &mut GameState) {
    state.scores = [0, 0];
    state.end = 1;
    state.current_shot = 0;
    state.stones.clear();
    state.active_stone = None;
    state.controls = ShotControls::default();
    state.sweep.reset();
    state.scheduled.clear();
    state.last_review = None;
    state.result = None;
    state.strategy_view = false;
    state.sim_speed = SimSpeed::X1;
    state.wall_alerts.reset();

    state.hammer_side = if state.rng.random_bool(0.5) { Side::Red } else { Side::Yellow };
    state.first_throw_side = state.hammer_side.other();
    state.active_side = state.first_throw_side;
    state.started = true;
    state.shot_state = ShotState::Idle;
    state.camera_mode = CameraMode::Overview;
    state.turn_token += 1;

    log::info!(
        "Match start: {} ends, {} stones per side, {} has hammer",
        state.settings.max_ends,
        state.settings.stones_per_side,
        state.hammer_side.label()
    );
    state.emit(GameEvent::MatchStarted {
        hammer: state.hammer_side,
    });
    schedule(state, MATCH_START_DELAY, Deferred::FirstShot);
}

/// Take flagged stones off the sheet (done at the start of each shot)
fn remove_flagged(state: &mut GameState) {
    let mut removed = Vec::new();
    for stone in state.stones.iter_mut().filter(|s| s.flagged_for_removal && !s.removed) {
        let reason = stone.removal_reason.unwrap_or(RemovalReason::OutOfPlay);
        if stone.remove(reason) {
            removed.push((stone.id, reason));
        }
    }
    for (id, reason) in removed {
        log::debug!("Stone {} removed ({:?})", id, reason);
        state.emit(GameEvent::StoneRemoved { id, reason });
    }
}

/// Open the next delivery, or score the end once every stone is thrown
pub fn start_next_shot(state: &mut GameState) {
    if !state.started {
        return;
    }
    remove_flagged(state);
    state.wall_alerts.reset();
    state.sim_speed = SimSpeed::X1;
    state.strategy_view = false;

    if state.current_shot >= state.total_shots() {
        finish_end(state);
        return;
    }

    state.turn_token += 1;
    state.active_side = if state.current_shot % 2 == 0 {
        state.first_throw_side
    } else {
        state.first_throw_side.other()
    };
    let index = state.spawn_stone(state.active_side);
    state.active_stone = Some(index);
    state.controls = ShotControls::default();
    state.sweep.reset();
    state.shot_state = ShotState::Positioning;
    state.camera_mode = CameraMode::Start;

    let planner = state.is_planner_turn();
    state.emit(GameEvent::ShotStarted {
        end: state.end,
        shot: state.current_shot,
        side: state.active_side,
        planner,
    });

    if planner {
        let delay = AI_THINK_DELAY + state.rng.random_range(0.0..AI_THINK_JITTER);
        schedule(state, delay, Deferred::AiCommit);
    }
}

/// Planner chooses and releases its shot
pub fn commit_ai_shot(state: &mut GameState) {
    if !state.shot_state.is_aiming() || !state.is_planner_turn() {
        return;
    }
    let side = state.active_side;
    let shot = planner::choose_shot(state, side);
    state.controls.start_x = shot.start_x;
    if let Some(stone) = state.active_stone_mut() {
        stone.position.x = shot.start_x;
    }
    shot::begin_delivery(state, shot.power, shot.curl, shot.sweep);
}

/// Called every step: settle the shot once nothing is moving
pub fn maybe_resolve_shot_stop(state: &mut GameState) {
    if !state.shot_state.in_motion() || state.any_moving() {
        return;
    }

    state.shot_state = ShotState::Settled;
    state.camera_mode = CameraMode::Overview;
    state.sim_speed = SimSpeed::X1;

    let mut settled_id = None;
    let mut removal = None;
    if let Some(stone) = state.active_stone_mut() {
        settled_id = Some(stone.id);
        removal = enforce_stopped_rules(stone).map(|reason| (stone.id, reason));
        stone.active_this_shot = false;
    }
    if let Some((id, reason)) = removal {
        log::debug!("Stone {} removed at rest ({:?})", id, reason);
        state.emit(GameEvent::StoneRemoved { id, reason });
    }
    state.emit(GameEvent::ShotSettled { id: settled_id });
    schedule(state, TURN_RESOLVE_DELAY, Deferred::AdvanceShot);
}

/// Count the settled shot and move on
pub fn advance_shot(state: &mut GameState) {
    if state.shot_state != ShotState::Settled {
        return;
    }
    state.current_shot += 1;
    start_next_shot(state);
}

/// Score the end, rotate hammer and either wait for review or end the match
pub fn finish_end(state: &mut GameState) {
    let score = score_end(&state.stones);
    let ended = state.end;

    let scored = score.scoring_side.filter(|_| score.points > 0);
    if let Some(side) = scored {
        state.scores[side.index()] += score.points;
        state.hammer_side = side.other();
    }
    state.first_throw_side = state.hammer_side.other();
    state.current_shot = 0;
    state.active_stone = None;
    state.strategy_view = false;
    state.sim_speed = SimSpeed::X1;

    let review = EndReview {
        end: ended,
        is_final: ended >= state.settings.max_ends,
        scoring_side: scored,
        points: score.points,
        scores: state.scores,
        hammer: state.hammer_side,
        counted: score.counted.clone(),
        nearest_opponent: score.nearest_opponent().map(|s| s.id),
        in_house: score.in_house.clone(),
    };
    match review.scoring_side {
        Some(side) => log::info!(
            "End {}: {} scores {} ({}-{})",
            ended,
            side.label(),
            review.points,
            state.scores[0],
            state.scores[1]
        ),
        None => log::info!("End {}: blank", ended),
    }

    let is_final = review.is_final;
    state.last_review = Some(review.clone());
    state.emit(GameEvent::EndScored(review));

    if is_final {
        finish_match(state);
    } else {
        state.shot_state = ShotState::EndReview;
        state.camera_mode = CameraMode::HouseOverhead;
    }
}

/// Leave the end review and start the next end
pub fn next_end(state: &mut GameState) -> bool {
    if !state.started || state.shot_state != ShotState::EndReview {
        log::debug!("Ignoring next_end in {:?}", state.shot_state);
        return false;
    }
    state.end += 1;
    state.stones.clear();
    state.active_stone = None;
    state.sweep.reset();
    state.shot_state = ShotState::Idle;
    start_next_shot(state);
    true
}

/// Conclude the match after the final end
pub fn finish_match(state: &mut GameState) {
    let [red, yellow] = state.scores;
    let winner = match red.cmp(&yellow) {
        std::cmp::Ordering::Greater => Some(Side::Red),
        std::cmp::Ordering::Less => Some(Side::Yellow),
        std::cmp::Ordering::Equal => None,
    };
    let result = MatchResult {
        winner,
        scores: state.scores,
        ends_played: state.end,
    };

    state.started = false;
    state.shot_state = ShotState::GameOver;
    state.camera_mode = CameraMode::HouseOverhead;
    state.strategy_view = false;
    state.scheduled.clear();

    log::info!("Match over: {}", result.summary(&state.settings));
    state.result = Some(result.clone());
    state.emit(GameEvent::MatchOver(result));
}

/// Switch planner control of both sides on or off
pub fn set_autoplay(state: &mut GameState, on: bool) {
    if state.autoplay == on {
        return;
    }
    state.autoplay = on;
    log::info!("Autoplay {}", if on { "on" } else { "off" });

    // Hand an in-progress human aim over to the planner
    if on && state.started && state.shot_state.is_aiming() {
        state.strategy_view = false;
        schedule(state, AI_THINK_DELAY, Deferred::AiCommit);
    }
}
