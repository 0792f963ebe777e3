use url::Url;

/// Default API-Football v3 endpoint.
pub const DEFAULT_FOOTBALL_BASE_URL: &str = "https://v3.football.api-sports.io";

/// Refresh interval used when a live-match row does not carry one.
pub const DEFAULT_REFRESH_MINUTES: u32 = 2;

/// Match data provider credentials and polling defaults.
#[derive(Debug, Clone)]
pub struct FootballConfig {
    pub api_key: String,
    pub base_url: Url,
    pub default_refresh_minutes: u32,
}
