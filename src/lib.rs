//! Curling Sim - a deterministic curling simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stone physics, collisions, shot and match flow, AI)
//! - `settings`: Match configuration (mode, ends, stones per side, teams)
//! - `teams`: National team roster used for labels and result summaries
//!
//! Rendering, audio and widget wiring live outside this crate; they read
//! [`sim::Snapshot`] and feed [`sim::TickInput`].

pub mod settings;
pub mod sim;
pub mod teams;

pub use settings::{ConfigError, MatchMode, MatchSettings};
pub use teams::{COUNTRIES, Country};

/// Rink geometry and simulation tuning constants
///
/// Coordinates: x runs across the sheet (0 = centre line), y runs along it
/// with the hack at negative y and the scoring house at positive y.
/// Units are metres and seconds.
pub mod consts {
    /// Sheet dimensions
    pub const SHEET_WIDTH: f32 = 4.75;
    pub const SHEET_LENGTH: f32 = 45.72;
    pub const HALF_WIDTH: f32 = SHEET_WIDTH / 2.0;
    pub const HALF_LENGTH: f32 = SHEET_LENGTH / 2.0;

    /// Stone size
    pub const STONE_RADIUS: f32 = 0.145;

    /// Lateral range of the hack (start position offset)
    pub const MAX_HACK_X: f32 = 1.7;

    /// Line positions along the sheet
    pub const HACK_Y: f32 = -20.3;
    /// Near hog line, where the stone is released
    pub const RELEASE_LINE_Y: f32 = -10.0;
    pub const FAR_HOG_Y: f32 = 10.0;
    pub const TEE_Y: f32 = 20.0;
    pub const BACK_LINE_Y: f32 = 22.4;
    pub const HOUSE_RADIUS: f32 = 1.83;

    /// Ice model
    pub const GRAVITY: f32 = 9.81;
    pub const BASE_MU: f32 = 0.0142;
    pub const MIN_MU: f32 = 0.0065;
    pub const MAX_MU_FACTOR: f32 = 2.7;
    /// Fraction of friction removed by a full sweep boost
    pub const SWEEP_FRICTION_CUT: f32 = 0.45;
    /// Below this speed friction ramps up (stone "grabs")
    pub const LOW_SPEED_GRAB: f32 = 1.25;
    pub const LOW_SPEED_GRAB_GAIN: f32 = 1.4;
    /// Extra friction past the far hog line
    pub const BACKEND_GAIN: f32 = 1.15;

    /// Delivery speeds (m/s)
    pub const MIN_SHOT_SPEED: f32 = 1.55;
    pub const MAX_SHOT_SPEED: f32 = 3.1;
    pub const DELIVERY_SPEED: f32 = 1.2;
    pub const DELIVERY_ACCEL: f32 = 2.1;
    /// Power slider curve exponent (> 1: most of the range is moderate speed)
    pub const POWER_CURVE: f32 = 1.55;

    /// Curl model
    pub const CURL_COEFFICIENT: f32 = 0.13;
    pub const CURL_DEAD_ZONE: f32 = 0.06;
    /// Curl is only applied above this squared speed
    pub const CURL_MIN_SPEED_SQ: f32 = 0.03;
    /// Handle-less (tier 0) wobble
    pub const WOBBLE_AMPLITUDE: f32 = 0.006;
    pub const WOBBLE_BIAS_MAX: f32 = 0.004;
    pub const WOBBLE_FREQUENCY: f32 = 0.9;

    /// Settling
    pub const STOP_SPEED: f32 = 0.012;
    pub const LOW_SPEED_SETTLE: f32 = 0.09;
    pub const SETTLE_WINDOW: f32 = 0.18;

    /// Walls
    pub const SIDEWALL_HIT_MARGIN: f32 = 0.03;
    pub const BACKWALL_HIT_MARGIN: f32 = 0.035;
    pub const SIDEWALL_RESTITUTION: f32 = 0.72;
    pub const BACKWALL_RESTITUTION: f32 = 0.64;
    pub const WALL_TANGENT_DAMPING: f32 = 0.985;

    /// Stone-stone contact
    pub const STONE_RESTITUTION: f32 = 0.86;
    pub const STONE_TANGENT_FRICTION: f32 = 0.02;

    /// Visual handle rotation when the stone carries no curl
    pub const HANDLE_IDLE_ROTATION_SPEED: f32 = 0.11;
    /// Flash rate of stones pending removal (radians/sec)
    pub const FLASH_RATE: f32 = 12.0;

    /// Frame stepping
    pub const MAX_FRAME_DT: f32 = 0.03;
    pub const MAX_STEP_DT: f32 = 0.03;

    /// Scheduled delays (seconds of simulated time)
    pub const MATCH_START_DELAY: f64 = 0.95;
    pub const TURN_RESOLVE_DELAY: f64 = 1.5;
    pub const AI_THINK_DELAY: f64 = 0.9;
    pub const AI_THINK_JITTER: f64 = 0.6;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Tee point (centre of the scoring house)
#[inline]
pub fn tee_point() -> glam::Vec2 {
    glam::Vec2::new(0.0, consts::TEE_Y)
}
