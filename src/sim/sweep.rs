//! Sweeping: gesture-driven friction boost and the planner's synthetic sweep

use serde::{Deserialize, Serialize};

use super::stone::Stone;
use crate::consts::{RELEASE_LINE_Y, TEE_Y};

/// Pointer speed (px/ms) below which a stroke does nothing
pub const SWEEP_SPEED_THRESHOLD: f32 = 0.38;
/// Boost gained per px/ms above the threshold
pub const SWEEP_GAIN: f32 = 0.055;
/// Per-second decay applied every frame
pub const SWEEP_DECAY: f32 = 2.25;
/// Extra per-second decay while the stone is running
pub const SWEEP_RUNNING_DECAY: f32 = 0.08;
/// Unswept running time before the player is nudged
pub const SWEEP_REMINDER_AFTER: f32 = 2.5;

/// Phase of a pointer gesture on the sweep pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    /// Release, cancel and leave all end the stroke
    Up,
}

/// One pointer sample: horizontal position in pixels, timestamp in ms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepSample {
    pub phase: PointerPhase,
    pub x: f32,
    pub t_ms: f64,
}

impl SweepSample {
    pub fn down(x: f32, t_ms: f64) -> Self {
        Self { phase: PointerPhase::Down, x, t_ms }
    }

    pub fn moved(x: f32, t_ms: f64) -> Self {
        Self { phase: PointerPhase::Move, x, t_ms }
    }

    pub fn up(x: f32, t_ms: f64) -> Self {
        Self { phase: PointerPhase::Up, x, t_ms }
    }
}

/// Sweep bookkeeping for the current shot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepState {
    /// Human sweep level (0..1)
    pub boost: f32,
    /// Last synthetic level used for a planner stone
    pub ai_boost: f32,
    pub active_pointer: bool,
    pub last_x: f32,
    pub last_t: f64,
    /// Any stroke added boost during this shot
    pub swept_this_shot: bool,
    pub reminder_sent: bool,
    /// Seconds the active stone has been running this shot
    pub running_time: f32,
}

impl SweepState {
    /// Clear everything for a fresh shot
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one gesture sample. Returns the boost added.
    pub fn apply(&mut self, sample: &SweepSample) -> f32 {
        match sample.phase {
            PointerPhase::Down => {
                self.active_pointer = true;
                self.last_x = sample.x;
                self.last_t = sample.t_ms;
                0.0
            }
            PointerPhase::Move => self.stroke(sample.x, sample.t_ms),
            PointerPhase::Up => {
                self.active_pointer = false;
                0.0
            }
        }
    }

    fn stroke(&mut self, x: f32, t_ms: f64) -> f32 {
        if !self.active_pointer {
            return 0.0;
        }
        let dt = (t_ms - self.last_t).max(1.0) as f32;
        let speed = (x - self.last_x).abs() / dt;
        self.last_x = x;
        self.last_t = t_ms;

        let before = self.boost;
        let effective = (speed - SWEEP_SPEED_THRESHOLD).max(0.0);
        self.boost = (self.boost + effective * SWEEP_GAIN).clamp(0.0, 1.0);
        let gained = self.boost - before;
        if gained > 0.0 {
            self.swept_this_shot = true;
        }
        gained
    }

    /// Frame decay; `running` adds the slower running-phase decay
    pub fn decay(&mut self, dt: f32, running: bool) {
        let mut rate = SWEEP_DECAY;
        if running {
            rate += SWEEP_RUNNING_DECAY;
        }
        self.boost = (self.boost - rate * dt).clamp(0.0, 1.0);
    }

    /// Advance the unswept timer for a human-run stone. Returns true exactly
    /// once per shot, when the player should be reminded to sweep.
    pub fn track_reminder(&mut self, dt: f32) -> bool {
        self.running_time += dt;
        if self.reminder_sent || self.swept_this_shot {
            return false;
        }
        if self.running_time >= SWEEP_REMINDER_AFTER {
            self.reminder_sent = true;
            return true;
        }
        false
    }

    /// Level shown on the sweep meter
    pub fn meter(&self, planner_turn: bool) -> f32 {
        let level = if planner_turn { self.ai_boost } else { self.boost };
        level.clamp(0.0, 1.0)
    }
}

/// Synthetic sweep for a planner-thrown stone at its current position.
///
/// Strongest just past the release line, easing off approaching the tee and
/// fading out entirely a few metres past it.
pub fn ai_sweep_boost(stone: &Stone) -> f32 {
    let y = stone.position.y;
    let approach = ((y - RELEASE_LINE_Y) / (TEE_Y - RELEASE_LINE_Y)).clamp(0.0, 1.0);
    let late_reduce = 1.0 - ((y - TEE_Y + 2.5) / 7.0).clamp(0.0, 1.0);
    stone.ai_sweep * (0.8 + 0.2 * (1.0 - approach)) * late_reduce
}
