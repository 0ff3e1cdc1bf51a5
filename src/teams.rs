//! National team roster
//!
//! Teams are cosmetic: they label sides in result summaries and logs.

use serde::Serialize;

/// A selectable national team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

pub const COUNTRIES: [Country; 8] = [
    Country { code: "CAN", name: "Canada", flag: "🇨🇦" },
    Country { code: "SWE", name: "Sweden", flag: "🇸🇪" },
    Country { code: "SUI", name: "Switzerland", flag: "🇨🇭" },
    Country { code: "SCO", name: "Scotland", flag: "🏴" },
    Country { code: "USA", name: "United States", flag: "🇺🇸" },
    Country { code: "NOR", name: "Norway", flag: "🇳🇴" },
    Country { code: "JPN", name: "Japan", flag: "🇯🇵" },
    Country { code: "ITA", name: "Italy", flag: "🇮🇹" },
];

/// Look up a team by roster index
pub fn country(index: usize) -> Option<&'static Country> {
    COUNTRIES.get(index)
}

/// Look up a team by its three-letter code (case-insensitive)
pub fn find_by_code(code: &str) -> Option<usize> {
    COUNTRIES
        .iter()
        .position(|c| c.code.eq_ignore_ascii_case(code))
}

/// Make the two selections distinct: if both sides picked the same team,
/// the second side moves to the next team in the roster.
pub fn ensure_distinct(teams: [usize; 2]) -> [usize; 2] {
    if teams[0] != teams[1] {
        return teams;
    }
    [teams[0], (teams[1] + 1) % COUNTRIES.len()]
}

/// "🇨🇦 Canada" style label
pub fn label(index: usize) -> String {
    match country(index) {
        Some(c) => format!("{} {}", c.flag, c.name),
        None => format!("Team {}", index + 1),
    }
}
