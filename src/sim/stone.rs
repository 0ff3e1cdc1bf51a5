//! Stone model: kinematic state, spin profile and lifecycle flags

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// One of the two teams on the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Red = 0,
    Yellow = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Red, Side::Yellow];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Red => Side::Yellow,
            Side::Yellow => Side::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Red => "P1",
            Side::Yellow => "P2",
        }
    }
}

/// Why a stone left (or is leaving) play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Touched a side board
    Sidewall,
    /// Hit the board behind the house
    Backwall,
    /// Slid fully past the back line
    BackLine,
    /// Slid back out past the hack end
    HackEnd,
    /// Delivered stone stopped short of the far hog line without contact
    HogLine,
    /// Came to rest beyond a back line
    OutOfPlay,
}

/// Discrete curl magnitude. Real throws only have a few turns of handle,
/// so curl is picked from four tiers rather than a continuous range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CurlTier {
    /// No handle: no directional curl, only a small random wobble
    #[default]
    None = 0,
    Light = 1,
    Medium = 2,
    Strong = 3,
}

/// Fixed parameters attached to a curl tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurlProfile {
    /// Multiplier on `CURL_COEFFICIENT`
    pub curl_factor: f32,
    /// Multiplier on ice friction (spinning stones run slightly heavier)
    pub friction_scale: f32,
    /// Handle rotation strength for rendering (0..1)
    pub visual_strength: f32,
}

impl CurlTier {
    pub const ALL: [CurlTier; 4] = [CurlTier::None, CurlTier::Light, CurlTier::Medium, CurlTier::Strong];

    pub fn from_index(index: u8) -> Self {
        match index {
            0 => CurlTier::None,
            1 => CurlTier::Light,
            2 => CurlTier::Medium,
            _ => CurlTier::Strong,
        }
    }

    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Quantize a continuous curl magnitude (0..1) into a tier
    pub fn from_magnitude(magnitude: f32) -> Self {
        let m = magnitude.abs().min(1.0);
        if m < CURL_DEAD_ZONE {
            CurlTier::None
        } else if m <= 1.0 / 3.0 {
            CurlTier::Light
        } else if m <= 2.0 / 3.0 {
            CurlTier::Medium
        } else {
            CurlTier::Strong
        }
    }

    pub fn profile(self) -> CurlProfile {
        match self {
            CurlTier::None => CurlProfile {
                curl_factor: 0.0,
                friction_scale: 1.0,
                visual_strength: 0.0,
            },
            CurlTier::Light => CurlProfile {
                curl_factor: 0.3,
                friction_scale: 1.02,
                visual_strength: 0.33,
            },
            CurlTier::Medium => CurlProfile {
                curl_factor: 0.55,
                friction_scale: 1.05,
                visual_strength: 0.66,
            },
            CurlTier::Strong => CurlProfile {
                curl_factor: 0.8,
                friction_scale: 1.09,
                visual_strength: 1.0,
            },
        }
    }
}

/// Curl selection for a delivery: magnitude tier plus rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curl {
    pub tier: CurlTier,
    /// +1 clockwise (drifts toward +x), -1 counter-clockwise
    pub sign: f32,
}

impl Default for Curl {
    fn default() -> Self {
        Self::STRAIGHT
    }
}

impl Curl {
    pub const STRAIGHT: Curl = Curl {
        tier: CurlTier::None,
        sign: 1.0,
    };

    /// From a signed tier selection (-3..=3, clamped)
    pub fn from_signed(value: i8) -> Self {
        let clamped = value.clamp(-3, 3);
        Self {
            tier: CurlTier::from_index(clamped.unsigned_abs()),
            sign: if clamped < 0 { -1.0 } else { 1.0 },
        }
    }

    /// From a continuous signed curl amount (-1..1)
    pub fn from_amount(amount: f32) -> Self {
        Self {
            tier: CurlTier::from_magnitude(amount),
            sign: if amount < 0.0 { -1.0 } else { 1.0 },
        }
    }

    /// Signed tier (-3..=3)
    pub fn signed(&self) -> i8 {
        self.tier.index() as i8 * if self.sign < 0.0 { -1 } else { 1 }
    }
}

/// A curling stone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stone {
    /// Creation index, also the stable collision ordering key
    pub id: u32,
    pub side: Side,
    pub position: Vec2,
    pub velocity: Vec2,
    pub moving: bool,

    // Lifecycle
    pub removed: bool,
    pub flagged_for_removal: bool,
    pub removal_reason: Option<RemovalReason>,
    /// Render hint for stones pending removal
    pub flash_phase: f32,
    pub was_delivered: bool,
    /// Set only during the shot that delivered this stone
    pub active_this_shot: bool,
    pub touched_stone: bool,
    pub crossed_near_hog: bool,
    pub crossed_far_hog: bool,

    // Spin
    pub spin_sign: f32,
    pub curl_tier: CurlTier,
    pub curl_factor: f32,
    pub friction_scale: f32,
    pub spin_strength: f32,
    pub wobble_phase: f32,
    pub wobble_bias: f32,

    // Delivery bookkeeping
    pub target_speed: f32,
    pub initial_speed: f32,
    pub distance_travelled: f32,
    pub low_speed_time: f32,
    /// Synthetic sweep level when the planner throws this stone
    pub ai_sweep: f32,

    // Visual
    pub handle_spin: f32,
    pub idle_spin_dir: f32,
}

impl Stone {
    /// Create a resting stone at the hack; wobble and idle spin come from `rng`
    pub fn new(id: u32, side: Side, rng: &mut impl Rng) -> Self {
        let profile = CurlTier::None.profile();
        Self {
            id,
            side,
            position: Vec2::new(0.0, HACK_Y),
            velocity: Vec2::ZERO,
            moving: false,
            removed: false,
            flagged_for_removal: false,
            removal_reason: None,
            flash_phase: 0.0,
            was_delivered: false,
            active_this_shot: false,
            touched_stone: false,
            crossed_near_hog: false,
            crossed_far_hog: false,
            spin_sign: 1.0,
            curl_tier: CurlTier::None,
            curl_factor: profile.curl_factor,
            friction_scale: profile.friction_scale,
            spin_strength: profile.visual_strength,
            wobble_phase: rng.random_range(0.0..std::f32::consts::TAU),
            wobble_bias: rng.random_range(-WOBBLE_BIAS_MAX..=WOBBLE_BIAS_MAX),
            target_speed: 0.0,
            initial_speed: 0.0,
            distance_travelled: 0.0,
            low_speed_time: 0.0,
            ai_sweep: 0.3,
            handle_spin: 0.0,
            idle_spin_dir: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
        }
    }

    /// In play: not removed (flagged stones are still simulated)
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.removed
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Apply the tier table and direction of a curl selection
    pub fn set_curl(&mut self, curl: Curl) {
        let profile = curl.tier.profile();
        self.curl_tier = curl.tier;
        self.spin_sign = if curl.sign < 0.0 { -1.0 } else { 1.0 };
        self.curl_factor = profile.curl_factor;
        self.friction_scale = profile.friction_scale;
        self.spin_strength = profile.visual_strength;
    }

    /// Release the stone from the hack toward `target_speed`
    pub fn deliver(&mut self, target_speed: f32, curl: Curl, ai_sweep: f32) {
        self.was_delivered = true;
        self.active_this_shot = true;
        self.position.x = self.position.x.clamp(-MAX_HACK_X, MAX_HACK_X);
        self.velocity = Vec2::new(0.0, DELIVERY_SPEED);
        self.moving = true;
        self.set_curl(curl);
        self.target_speed = target_speed;
        self.initial_speed = target_speed;
        self.crossed_far_hog = false;
        self.crossed_near_hog = false;
        self.touched_stone = false;
        self.distance_travelled = 0.0;
        self.low_speed_time = 0.0;
        self.ai_sweep = ai_sweep;
    }

    /// Mark for removal at the start of the next shot; the stone keeps
    /// sliding and flashes until then. First reason wins.
    pub fn flag_for_removal(&mut self, reason: RemovalReason) -> bool {
        if self.removed || self.flagged_for_removal {
            return false;
        }
        self.flagged_for_removal = true;
        self.removal_reason = Some(reason);
        self.flash_phase = 0.0;
        true
    }

    /// Take the stone out of play permanently. Returns false if already removed.
    pub fn remove(&mut self, reason: RemovalReason) -> bool {
        if self.removed {
            return false;
        }
        self.removed = true;
        self.moving = false;
        self.velocity = Vec2::ZERO;
        if self.removal_reason.is_none() {
            self.removal_reason = Some(reason);
        }
        true
    }

    /// Opacity for flashing stones (1.0 when not flagged)
    pub fn flash_alpha(&self) -> f32 {
        if !self.flagged_for_removal {
            return 1.0;
        }
        ((self.flash_phase.sin() + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Distance from the tee point
    #[inline]
    pub fn tee_distance(&self) -> f32 {
        self.position.distance(crate::tee_point())
    }

    /// Centre within the house radius plus one stone radius
    #[inline]
    pub fn in_house(&self) -> bool {
        self.tee_distance() <= HOUSE_RADIUS + STONE_RADIUS
    }
}
