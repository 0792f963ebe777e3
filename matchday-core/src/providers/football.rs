//! Football fixture provider.
//!
//! [`ApiFootballProvider`] talks to the API-Football v3 `fixtures` endpoint
//! and maps each entry onto the snapshot shape stored in live-match rows.

use crate::config::FootballConfig;
use async_trait::async_trait;
use matchday_sdk::objects::{Fixture, FixtureQuery, MatchStatus};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider answered with status {status}")]
    Status { status: u16 },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
}

/// Source of fixture lists.
#[async_trait]
pub trait MatchDataProvider: Send + Sync {
    async fn fixtures(&self, query: &FixtureQuery) -> Result<Vec<Fixture>, ProviderError>;
}

pub struct ApiFootballProvider {
    api_key: String,
    base_url: url::Url,
    http_client: reqwest::Client,
}

impl ApiFootballProvider {
    const API_KEY_HEADER: &str = "x-apisports-key";

    pub fn new(config: &FootballConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn query_params(query: &FixtureQuery) -> Vec<(&'static str, String)> {
        let mut params = match query.status {
            MatchStatus::Live => vec![("live", "all".to_string())],
            MatchStatus::Upcoming => vec![("status", "NS-TBD".to_string())],
            MatchStatus::Finished => vec![("status", "FT-AET-PEN".to_string())],
        };
        match (query.status, &query.date) {
            (MatchStatus::Live, _) | (_, None) => {}
            (_, Some(date)) => params.push(("date", date.clone())),
        }
        params
    }
}

#[async_trait]
impl MatchDataProvider for ApiFootballProvider {
    #[tracing::instrument(skip_all, err, fields(status = %query.status))]
    async fn fixtures(&self, query: &FixtureQuery) -> Result<Vec<Fixture>, ProviderError> {
        let url = self.base_url.join("fixtures")?;
        let response = self
            .http_client
            .get(url)
            .header(Self::API_KEY_HEADER, &self.api_key)
            .query(&Self::query_params(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let body: ApiFootballResponse = response.json().await?;
        body.into_fixtures()
    }
}

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiFootballResponse {
    /// `[]` on success, `{"field": "message"}` on failure.
    #[serde(default)]
    errors: serde_json::Value,
    #[serde(default)]
    response: Vec<ApiFixtureItem>,
}

impl ApiFootballResponse {
    fn into_fixtures(self) -> Result<Vec<Fixture>, ProviderError> {
        let has_errors = match &self.errors {
            serde_json::Value::Array(a) => !a.is_empty(),
            serde_json::Value::Object(o) => !o.is_empty(),
            _ => false,
        };
        if has_errors {
            return Err(ProviderError::ApiError {
                message: self.errors.to_string(),
            });
        }
        Ok(self.response.into_iter().map(Fixture::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiFixtureItem {
    fixture: ApiFixture,
    league: ApiLeague,
    teams: ApiTeams,
    goals: ApiGoals,
}

#[derive(Debug, Deserialize)]
struct ApiFixture {
    id: i64,
    #[serde(default)]
    timestamp: Option<i64>,
    status: ApiFixtureStatus,
}

#[derive(Debug, Deserialize)]
struct ApiFixtureStatus {
    short: String,
    #[serde(default)]
    elapsed: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ApiLeague {
    name: String,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTeams {
    home: ApiTeam,
    away: ApiTeam,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    name: String,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiGoals {
    home: Option<i32>,
    away: Option<i32>,
}

impl From<ApiFixtureItem> for Fixture {
    fn from(item: ApiFixtureItem) -> Self {
        Fixture {
            id: item.fixture.id,
            home_team: item.teams.home.name,
            away_team: item.teams.away.name,
            home_logo: item.teams.home.logo,
            away_logo: item.teams.away.logo,
            home_score: item.goals.home,
            away_score: item.goals.away,
            status: MatchStatus::from_short_code(&item.fixture.status.short),
            minute: item.fixture.status.elapsed,
            league: item.league.name,
            league_logo: item.league.logo,
            kickoff: item.fixture.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE_BODY: &str = r#"{
        "get": "fixtures",
        "parameters": { "live": "all" },
        "errors": [],
        "results": 2,
        "response": [
            {
                "fixture": { "id": 100, "timestamp": 1714557600,
                             "status": { "long": "Second Half", "short": "2H", "elapsed": 63 } },
                "league": { "id": 233, "name": "Premier League", "logo": "https://media.example/l/233.png" },
                "teams": {
                    "home": { "id": 1, "name": "Al Ahly", "logo": "https://media.example/t/1.png" },
                    "away": { "id": 2, "name": "Zamalek", "logo": null }
                },
                "goals": { "home": 2, "away": 1 }
            },
            {
                "fixture": { "id": 101, "timestamp": null,
                             "status": { "short": "NS", "elapsed": null } },
                "league": { "name": "Cup" },
                "teams": { "home": { "name": "A" }, "away": { "name": "B" } },
                "goals": { "home": null, "away": null }
            }
        ]
    }"#;

    #[test]
    fn maps_provider_entries() {
        let body: ApiFootballResponse = serde_json::from_str(LIVE_BODY).unwrap();
        let fixtures = body.into_fixtures().unwrap();
        assert_eq!(fixtures.len(), 2);

        let live = &fixtures[0];
        assert_eq!(live.id, 100);
        assert_eq!(live.status, MatchStatus::Live);
        assert_eq!(live.minute, Some(63));
        assert_eq!((live.home_score, live.away_score), (Some(2), Some(1)));
        assert_eq!(live.away_logo, None);
        assert_eq!(live.league, "Premier League");
        assert_eq!(live.kickoff, Some(1714557600));

        let upcoming = &fixtures[1];
        assert_eq!(upcoming.status, MatchStatus::Upcoming);
        assert_eq!(upcoming.home_score, None);
    }

    #[test]
    fn error_object_is_an_api_error() {
        let body: ApiFootballResponse = serde_json::from_str(
            r#"{ "errors": { "token": "Error/Missing application key" }, "response": [] }"#,
        )
        .unwrap();
        assert!(matches!(
            body.into_fixtures(),
            Err(ProviderError::ApiError { .. })
        ));
    }

    #[test]
    fn query_parameters_per_status() {
        let live = ApiFootballProvider::query_params(&FixtureQuery {
            status: MatchStatus::Live,
            date: Some("2024-05-01".into()),
        });
        assert_eq!(live, vec![("live", "all".to_string())]);

        let finished = ApiFootballProvider::query_params(&FixtureQuery {
            status: MatchStatus::Finished,
            date: Some("2024-05-01".into()),
        });
        assert_eq!(
            finished,
            vec![
                ("status", "FT-AET-PEN".to_string()),
                ("date", "2024-05-01".to_string())
            ]
        );
    }
}
