//! Game state definitions
//!
//! `GameState` is the single owned simulation context. Everything the
//! presentation layer needs is exposed through [`GameState::snapshot`] and
//! the drained [`GameEvent`] queue.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::WallHit;
use super::rules::HouseStone;
use super::shot::{ShotControls, ShotState};
use super::stone::{RemovalReason, Side, Stone};
use super::sweep::SweepState;
use crate::settings::{MatchMode, MatchSettings};
use crate::teams;

/// Camera hint for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Overview,
    /// Behind the hack while aiming
    Start,
    Delivery,
    /// Tracking the running stone
    Follow,
    /// Looking down on the house (end review, game over)
    HouseOverhead,
    /// Player-requested house view while aiming
    Strategy,
}

/// Fast-forward factor for planner shots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimSpeed {
    #[default]
    X1,
    X2,
    X4,
}

impl SimSpeed {
    pub fn factor(self) -> f32 {
        match self {
            SimSpeed::X1 => 1.0,
            SimSpeed::X2 => 2.0,
            SimSpeed::X4 => 4.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            SimSpeed::X1 => SimSpeed::X2,
            SimSpeed::X2 => SimSpeed::X4,
            SimSpeed::X4 => SimSpeed::X1,
        }
    }
}

/// Boards struck during the current shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WallAlerts {
    pub left: bool,
    pub right: bool,
    pub back: bool,
}

impl WallAlerts {
    pub fn mark(&mut self, wall: WallHit) {
        match wall {
            WallHit::Left => self.left = true,
            WallHit::Right => self.right = true,
            WallHit::Back => self.back = true,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.back
    }
}

/// Summary of a completed end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndReview {
    pub end: u32,
    pub is_final: bool,
    /// `None` for a blank end
    pub scoring_side: Option<Side>,
    pub points: u32,
    /// Scores after this end
    pub scores: [u32; 2],
    /// Hammer for the following end
    pub hammer: Side,
    /// Stones that counted
    pub counted: Vec<u32>,
    /// Nearest opposing stone that limited the count
    pub nearest_opponent: Option<u32>,
    pub in_house: Vec<HouseStone>,
}

/// Final outcome of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// `None` for a draw
    pub winner: Option<Side>,
    pub scores: [u32; 2],
    pub ends_played: u32,
}

impl MatchResult {
    pub fn summary(&self, settings: &MatchSettings) -> String {
        let names = [teams::label(settings.teams[0]), teams::label(settings.teams[1])];
        match self.winner {
            Some(side) => {
                let loser = side.other();
                format!(
                    "{} beat {} {}-{}",
                    names[side.index()],
                    names[loser.index()],
                    self.scores[side.index()],
                    self.scores[loser.index()]
                )
            }
            None => format!(
                "{} and {} drew {}-{}",
                names[0], names[1], self.scores[0], self.scores[1]
            ),
        }
    }
}

/// Work deferred on the simulated clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deferred {
    /// Open the first shot after the match intro
    FirstShot,
    /// Planner commits its delivery after thinking
    AiCommit,
    /// Move on after a settled shot
    AdvanceShot,
}

/// A deferred action, valid only while `turn_token` still matches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub due: f64,
    pub token: u64,
    pub action: Deferred,
}

/// Notifications for the presentation layer (sound, HUD, banners)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    MatchStarted { hammer: Side },
    ShotStarted { end: u32, shot: u32, side: Side, planner: bool },
    StoneDelivered { id: u32, side: Side, speed: f32, curl: i8 },
    WallHit { id: u32, wall: WallHit },
    StoneCollision { a: u32, b: u32, impulse: f32 },
    StoneFlagged { id: u32, reason: RemovalReason },
    StoneRemoved { id: u32, reason: RemovalReason },
    ShotSettled { id: Option<u32> },
    EndScored(EndReview),
    MatchOver(MatchResult),
    /// The player has not swept a running stone yet
    SweepReminder,
}

/// Complete simulation context for one match
#[derive(Debug, Clone)]
pub struct GameState {
    /// Match seed for reproducibility
    pub seed: u64,
    pub settings: MatchSettings,
    /// A match is in progress (false before the first match and after game over)
    pub started: bool,
    pub scores: [u32; 2],
    /// Current end (1-based)
    pub end: u32,
    /// Deliveries completed this end
    pub current_shot: u32,
    pub hammer_side: Side,
    pub first_throw_side: Side,
    pub active_side: Side,
    /// Stones of the current end, in delivery order
    pub stones: Vec<Stone>,
    /// Index into `stones` of the stone being thrown
    pub active_stone: Option<usize>,
    pub shot_state: ShotState,
    /// Bumped on every turn change; stale scheduled tasks are discarded
    pub turn_token: u64,
    pub controls: ShotControls,
    pub sweep: SweepState,
    /// Simulated seconds since creation
    pub clock: f64,
    pub scheduled: Vec<ScheduledTask>,
    pub camera_mode: CameraMode,
    pub strategy_view: bool,
    pub sim_speed: SimSpeed,
    pub wall_alerts: WallAlerts,
    pub last_review: Option<EndReview>,
    pub result: Option<MatchResult>,
    pub events: Vec<GameEvent>,
    /// Planner drives both sides
    pub autoplay: bool,
    pub rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create an idle state; call `flow::start_match` to begin playing
    pub fn new(seed: u64, settings: MatchSettings) -> Self {
        Self {
            seed,
            settings: settings.sanitized(),
            started: false,
            scores: [0, 0],
            end: 1,
            current_shot: 0,
            hammer_side: Side::Yellow,
            first_throw_side: Side::Red,
            active_side: Side::Red,
            stones: Vec::new(),
            active_stone: None,
            shot_state: ShotState::Idle,
            turn_token: 0,
            controls: ShotControls::default(),
            sweep: SweepState::default(),
            clock: 0.0,
            scheduled: Vec::new(),
            camera_mode: CameraMode::Overview,
            strategy_view: false,
            sim_speed: SimSpeed::X1,
            wall_alerts: WallAlerts::default(),
            last_review: None,
            result: None,
            events: Vec::new(),
            autoplay: false,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 0,
        }
    }

    /// Deliveries per end
    #[inline]
    pub fn total_shots(&self) -> u32 {
        self.settings.total_shots()
    }

    /// Side driven by the planner rather than a person
    pub fn is_planner_side(&self, side: Side) -> bool {
        self.autoplay || (self.settings.mode == MatchMode::HumanVsAi && side == Side::Yellow)
    }

    pub fn is_planner_turn(&self) -> bool {
        self.is_planner_side(self.active_side)
    }

    /// A planner-thrown stone is in motion (fast forward allowed)
    pub fn planner_shot_in_motion(&self) -> bool {
        self.started && self.is_planner_turn() && self.shot_state.in_motion()
    }

    pub fn can_use_strategy_view(&self) -> bool {
        self.started && !self.is_planner_turn() && self.shot_state.is_aiming()
    }

    /// Camera hint, with the strategy view taking priority
    pub fn camera_hint(&self) -> CameraMode {
        if self.strategy_view {
            CameraMode::Strategy
        } else {
            self.camera_mode
        }
    }

    /// Create a resting stone at the hack and return its index
    pub fn spawn_stone(&mut self, side: Side) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let stone = Stone::new(id, side, &mut self.rng);
        self.stones.push(stone);
        self.stones.len() - 1
    }

    pub fn active_stone(&self) -> Option<&Stone> {
        self.active_stone.and_then(|i| self.stones.get(i))
    }

    pub fn active_stone_mut(&mut self) -> Option<&mut Stone> {
        self.active_stone.and_then(|i| self.stones.get_mut(i))
    }

    pub fn any_moving(&self) -> bool {
        self.stones.iter().any(|s| !s.removed && s.moving)
    }

    /// Stones `side` has not yet delivered this end
    pub fn stones_remaining(&self, side: Side) -> u32 {
        let thrown = self
            .stones
            .iter()
            .filter(|s| s.side == side && s.was_delivered)
            .count() as u32;
        self.settings.stones_per_side.saturating_sub(thrown)
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serialisable view for rendering and HUD
    pub fn snapshot(&self) -> Snapshot {
        let planner_turn = self.started && self.is_planner_turn();
        Snapshot {
            stones: self
                .stones
                .iter()
                .filter(|s| !s.removed)
                .map(|s| StoneView {
                    id: s.id,
                    side: s.side,
                    position: s.position,
                    velocity: s.velocity,
                    handle_spin: s.handle_spin,
                    spin_strength: s.spin_strength,
                    moving: s.moving,
                    flagged: s.flagged_for_removal,
                    alpha: s.flash_alpha(),
                    active: s.active_this_shot,
                })
                .collect(),
            shot_state: self.shot_state,
            started: self.started,
            scores: self.scores,
            end: self.end,
            max_ends: self.settings.max_ends,
            shot: self.current_shot,
            total_shots: self.total_shots(),
            active_side: self.active_side,
            hammer_side: self.hammer_side,
            planner_turn,
            stones_remaining: [
                self.stones_remaining(Side::Red),
                self.stones_remaining(Side::Yellow),
            ],
            sweep_meter: self.sweep.meter(planner_turn),
            camera: self.camera_hint(),
            sim_speed: self.sim_speed,
            wall_alerts: self.wall_alerts,
            last_review: self.last_review.clone(),
            result: self.result.clone(),
        }
    }
}

/// Render-facing view of one stone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoneView {
    pub id: u32,
    pub side: Side,
    pub position: Vec2,
    pub velocity: Vec2,
    pub handle_spin: f32,
    pub spin_strength: f32,
    pub moving: bool,
    pub flagged: bool,
    /// Opacity (flashes while flagged)
    pub alpha: f32,
    pub active: bool,
}

/// Everything a renderer or HUD reads in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stones: Vec<StoneView>,
    pub shot_state: ShotState,
    pub started: bool,
    pub scores: [u32; 2],
    pub end: u32,
    pub max_ends: u32,
    pub shot: u32,
    pub total_shots: u32,
    pub active_side: Side,
    pub hammer_side: Side,
    pub planner_turn: bool,
    pub stones_remaining: [u32; 2],
    pub sweep_meter: f32,
    pub camera: CameraMode,
    pub sim_speed: SimSpeed,
    pub wall_alerts: WallAlerts,
    pub last_review: Option<EndReview>,
    pub result: Option<MatchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_idle() {
        let state = GameState::new(42, MatchSettings::default());
        assert!(!state.started);
        assert_eq!(state.shot_state, ShotState::Idle);
        assert!(state.stones.is_empty());
        assert_eq!(state.snapshot().camera, CameraMode::Overview);
    }

    #[test]
    fn test_planner_side() {
        let mut state = GameState::new(1, MatchSettings::new(MatchMode::HumanVsAi, 2, 4));
        assert!(!state.is_planner_side(Side::Red));
        assert!(state.is_planner_side(Side::Yellow));

        state.settings.mode = MatchMode::HumanVsHuman;
        assert!(!state.is_planner_side(Side::Yellow));
        state.autoplay = true;
        assert!(state.is_planner_side(Side::Red));
    }

    #[test]
    fn test_spawn_ids_increase() {
        let mut state = GameState::new(1, MatchSettings::default());
        let a = state.spawn_stone(Side::Red);
        let b = state.spawn_stone(Side::Yellow);
        assert!(state.stones[b].id > state.stones[a].id);
        assert_eq!(state.stones[a].position, Vec2::new(0.0, crate::consts::HACK_Y));
    }

    #[test]
    fn test_stones_remaining_counts_deliveries() {
        let mut state = GameState::new(1, MatchSettings::new(MatchMode::HumanVsHuman, 1, 4));
        let idx = state.spawn_stone(Side::Red);
        // Waiting at the hack does not count as thrown
        assert_eq!(state.stones_remaining(Side::Red), 4);
        state.stones[idx].was_delivered = true;
        assert_eq!(state.stones_remaining(Side::Red), 3);
        assert_eq!(state.stones_remaining(Side::Yellow), 4);
    }

    #[test]
    fn test_sim_speed_cycle() {
        assert_eq!(SimSpeed::X1.next(), SimSpeed::X2);
        assert_eq!(SimSpeed::X4.next(), SimSpeed::X1);
        assert_eq!(SimSpeed::X4.factor(), 4.0);
    }

    #[test]
    fn test_drain_events() {
        let mut state = GameState::new(1, MatchSettings::default());
        state.emit(GameEvent::SweepReminder);
        assert_eq!(state.drain_events(), vec![GameEvent::SweepReminder]);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_result_summary() {
        let settings = MatchSettings::default();
        let result = MatchResult {
            winner: Some(Side::Yellow),
            scores: [2, 5],
            ends_played: 5,
        };
        let text = result.summary(&settings);
        assert!(text.contains("Sweden"));
        assert!(text.ends_with("5-2"));

        let draw = MatchResult {
            winner: None,
            scores: [3, 3],
            ends_played: 5,
        };
        assert!(draw.summary(&settings).contains("drew 3-3"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(9, MatchSettings::default());
        state.spawn_stone(Side::Red);
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"shot_state\":\"Idle\""));
    }
}
