//! Fixture list proxy.
//!
//! # Endpoints
//!
//! - `GET /fixtures?status=live|upcoming|finished&date=YYYY-MM-DD`

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use matchday_core::providers::ProviderError;
use matchday_sdk::objects::{Fixture, FixtureQuery};

use crate::state::AppState;

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]");

pub fn router() -> Router<AppState> {
    Router::new().route("/fixtures", get(list_fixtures))
}

/// `GET /fixtures` — fixtures from the match data provider, mapped to
/// the snapshot shape moderators activate from.
async fn list_fixtures(
    state: State<AppState>,
    Query(query): Query<FixtureQuery>,
) -> Result<Json<Vec<Fixture>>, FixturesApiError> {
    if let Some(date) = &query.date {
        time::Date::parse(date, DATE_FORMAT).map_err(|_| FixturesApiError::InvalidDate)?;
    }
    let provider = state.provider().await;
    let fixtures = provider
        .fixtures(&query)
        .await
        .map_err(FixturesApiError::Provider)?;
    Ok(Json(fixtures))
}

#[derive(Debug)]
enum FixturesApiError {
    InvalidDate,
    Provider(ProviderError),
}

impl IntoResponse for FixturesApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            FixturesApiError::InvalidDate => {
                (StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD").into_response()
            }
            FixturesApiError::Provider(e) => {
                tracing::warn!(error = %e, "Fixture provider request failed");
                (StatusCode::BAD_GATEWAY, "match data provider unavailable").into_response()
            }
        }
    }
}
