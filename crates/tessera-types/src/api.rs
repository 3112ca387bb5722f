use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Design, SaveStatus, Theme, VoteType};

// -- JWT Claims --

/// JWT claims issued at login and checked by the API middleware. These are
/// the server's notion of "the current user".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Designs --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDesignRequest {
    /// Defaults to the current theme.
    pub theme_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceAssetRequest {
    pub asset_id: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveAssetRequest {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackgroundColorRequest {
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct SaveStatusResponse {
    pub design_id: Uuid,
    pub status: SaveStatus,
    pub last_save_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_per_page() -> usize {
    20
}

#[derive(Debug, Serialize)]
pub struct DesignPage {
    pub designs: Vec<Design>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub design_id: Uuid,
    pub user_vote: Option<VoteType>,
    pub delta: i64,
}

// -- Leaderboard --

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

fn default_top_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub user_id: Uuid,
    pub theme_id: Uuid,
    /// 1-based, or -1 when the user has no submission for the theme.
    pub rank: i64,
}

#[derive(Debug, Serialize)]
pub struct SubmissionStatusResponse {
    pub theme_id: Uuid,
    pub submitted: bool,
}

// -- Themes --

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
    pub time_remaining_secs: i64,
}
