//! Match configuration
//!
//! Settings are validated here, at the boundary. The simulation core assumes
//! a sanitized `MatchSettings` (supported stone count, at least one end,
//! two distinct teams).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::teams;

/// Stones-per-side options offered to players
pub const STONE_OPTIONS: [u32; 4] = [1, 4, 8, 16];
pub const DEFAULT_STONES_PER_SIDE: u32 = 16;
pub const DEFAULT_MAX_ENDS: u32 = 5;

/// Errors raised while loading settings from disk or JSON
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Who controls the second side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchMode {
    /// Yellow is driven by the opponent planner
    #[default]
    HumanVsAi,
    HumanVsHuman,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::HumanVsAi => "1p",
            MatchMode::HumanVsHuman => "2p",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1p" | "ai" | "human-vs-ai" => Some(MatchMode::HumanVsAi),
            "2p" | "pvp" | "human-vs-human" => Some(MatchMode::HumanVsHuman),
            _ => None,
        }
    }
}

/// Match configuration chosen before a match starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub mode: MatchMode,
    /// Number of ends in the match
    pub max_ends: u32,
    /// Stones each side delivers per end (one of `STONE_OPTIONS`)
    pub stones_per_side: u32,
    /// Roster indices for side 0 (red) and side 1 (yellow)
    pub teams: [usize; 2],
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            mode: MatchMode::HumanVsAi,
            max_ends: DEFAULT_MAX_ENDS,
            stones_per_side: DEFAULT_STONES_PER_SIDE,
            teams: [0, 1],
        }
    }
}

impl MatchSettings {
    pub fn new(mode: MatchMode, max_ends: u32, stones_per_side: u32) -> Self {
        Self {
            mode,
            max_ends,
            stones_per_side,
            ..Self::default()
        }
        .sanitized()
    }

    /// Total deliveries in one end
    pub fn total_shots(&self) -> u32 {
        self.stones_per_side * 2
    }

    /// Replace unsupported values with defaults
    pub fn sanitized(mut self) -> Self {
        if !STONE_OPTIONS.contains(&self.stones_per_side) {
            log::warn!(
                "Unsupported stones per side {}, using {}",
                self.stones_per_side,
                DEFAULT_STONES_PER_SIDE
            );
            self.stones_per_side = DEFAULT_STONES_PER_SIDE;
        }
        if self.max_ends == 0 {
            log::warn!("Match needs at least one end, using {}", DEFAULT_MAX_ENDS);
            self.max_ends = DEFAULT_MAX_ENDS;
        }
        for (side, team) in self.teams.iter_mut().enumerate() {
            if teams::country(*team).is_none() {
                log::warn!("Unknown team index {} for side {}, using {}", team, side, side);
                *team = side;
            }
        }
        self.teams = teams::ensure_distinct(self.teams);
        self
    }

    /// Parse settings from JSON (missing fields take defaults) and sanitize
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: MatchSettings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded match settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_stones_per_side() {
        let settings = MatchSettings::new(MatchMode::HumanVsHuman, 3, 5);
        assert_eq!(settings.stones_per_side, DEFAULT_STONES_PER_SIDE);
        assert_eq!(settings.max_ends, 3);

        let settings = MatchSettings::new(MatchMode::HumanVsHuman, 3, 8);
        assert_eq!(settings.stones_per_side, 8);
        assert_eq!(settings.total_shots(), 16);
    }

    #[test]
    fn test_sanitize_zero_ends() {
        let settings = MatchSettings::new(MatchMode::HumanVsAi, 0, 4);
        assert_eq!(settings.max_ends, DEFAULT_MAX_ENDS);
    }

    #[test]
    fn test_from_json_partial() {
        let settings = MatchSettings::from_json(r#"{"max_ends": 2, "stones_per_side": 4}"#).unwrap();
        assert_eq!(settings.mode, MatchMode::HumanVsAi);
        assert_eq!(settings.max_ends, 2);
        assert_eq!(settings.stones_per_side, 4);
        assert_eq!(settings.teams, [0, 1]);
    }

    #[test]
    fn test_from_json_duplicate_teams() {
        let settings = MatchSettings::from_json(r#"{"teams": [2, 2]}"#).unwrap();
        assert_eq!(settings.teams, [2, 3]);

        let settings = MatchSettings::from_json(r#"{"teams": [0, 99]}"#).unwrap();
        assert_eq!(settings.teams, [0, 1]);
    }

    #[test]
    fn test_from_json_malformed() {
        let err = MatchSettings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = MatchSettings::new(MatchMode::HumanVsHuman, 8, 1);
        let json = settings.to_json().unwrap();
        assert_eq!(MatchSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(MatchMode::from_str("1P"), Some(MatchMode::HumanVsAi));
        assert_eq!(MatchMode::from_str("pvp"), Some(MatchMode::HumanVsHuman));
        assert_eq!(MatchMode::from_str("bots"), None);
        assert_eq!(MatchMode::HumanVsHuman.as_str(), "2p");
    }
}
