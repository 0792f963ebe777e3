//! Room live-match association objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fixtures::Fixture;

/// A room's live-match association as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMatchResponse {
    pub id: i64,
    pub room_id: Uuid,
    pub match_id: i64,
    /// Denormalized fixture snapshot.
    pub match_data: Fixture,
    pub is_active: bool,
    pub activated_by: Option<Uuid>,
    pub update_interval_minutes: Option<i32>,
    /// Unix timestamp (milliseconds) of the last snapshot write.
    pub updated_at: i64,
}

/// Request body for `POST /rooms/{room_id}/live-match`.
///
/// The moderator picks a fixture from the fixture list; its current state
/// becomes the initial snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateLiveMatchRequest {
    pub fixture: Fixture,
    #[serde(default)]
    pub activated_by: Option<Uuid>,
    #[serde(default)]
    pub update_interval_minutes: Option<i32>,
}
