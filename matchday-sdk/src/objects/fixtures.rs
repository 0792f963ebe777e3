//! Fixture objects as served by the football-data provider proxy.
//!
//! The same [`Fixture`] shape is stored as the denormalized snapshot of a
//! room's live match (`match_data`).

use serde::{Deserialize, Serialize};

/// Normalized match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
}

impl MatchStatus {
    /// Map a provider status short code (`NS`, `1H`, `FT`, ...) to a
    /// normalized status.
    ///
    /// Unknown codes are treated as finished so that a match never keeps
    /// polling on a status the service does not understand.
    pub fn from_short_code(code: &str) -> Self {
        match code {
            "TBD" | "NS" => MatchStatus::Upcoming,
            "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "SUSP" | "INT" | "LIVE" => MatchStatus::Live,
            _ => MatchStatus::Finished,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Upcoming => write!(f, "upcoming"),
            MatchStatus::Live => write!(f, "live"),
            MatchStatus::Finished => write!(f, "finished"),
        }
    }
}

/// One scheduled or played match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Provider fixture id.
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_logo: Option<String>,
    #[serde(default)]
    pub away_logo: Option<String>,
    #[serde(default)]
    pub home_score: Option<i32>,
    #[serde(default)]
    pub away_score: Option<i32>,
    pub status: MatchStatus,
    /// Elapsed minutes, only meaningful while live.
    #[serde(default)]
    pub minute: Option<i32>,
    pub league: String,
    #[serde(default)]
    pub league_logo: Option<String>,
    /// Unix timestamp of the scheduled kickoff.
    #[serde(default)]
    pub kickoff: Option<i64>,
}

/// Query parameters for `GET /fixtures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureQuery {
    #[serde(default = "default_status")]
    pub status: MatchStatus,
    /// Calendar date in `YYYY-MM-DD` form. Ignored for live queries.
    #[serde(default)]
    pub date: Option<String>,
}

fn default_status() -> MatchStatus {
    MatchStatus::Live
}

impl FixtureQuery {
    /// Query for every currently live fixture.
    pub fn live() -> Self {
        Self {
            status: MatchStatus::Live,
            date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_map_to_status() {
        assert_eq!(MatchStatus::from_short_code("NS"), MatchStatus::Upcoming);
        assert_eq!(MatchStatus::from_short_code("HT"), MatchStatus::Live);
        assert_eq!(MatchStatus::from_short_code("2H"), MatchStatus::Live);
        assert_eq!(MatchStatus::from_short_code("FT"), MatchStatus::Finished);
        assert_eq!(MatchStatus::from_short_code("PST"), MatchStatus::Finished);
        assert_eq!(MatchStatus::from_short_code("???"), MatchStatus::Finished);
    }

    #[test]
    fn fixture_snapshot_tolerates_missing_optionals() {
        let json = r#"{
            "id": 100,
            "home_team": "Al Ahly",
            "away_team": "Zamalek",
            "status": "live",
            "league": "Egyptian Premier League"
        }"#;
        let fixture: Fixture = serde_json::from_str(json).unwrap();
        assert_eq!(fixture.id, 100);
        assert_eq!(fixture.status, MatchStatus::Live);
        assert_eq!(fixture.home_score, None);
        assert_eq!(fixture.minute, None);
    }
}
