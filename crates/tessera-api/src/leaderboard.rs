use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tessera_types::api::{Claims, RankResponse, SubmissionStatusResponse, TopQuery};
use tessera_types::models::{Design, LeaderboardEntry};
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiResult;

/// Largest `limit` honored by the top-designs endpoint.
const MAX_TOP: usize = 100;

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.leaderboard.get_leaderboard_by_theme(theme_id)?))
}

pub async fn get_top_designs(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<Vec<Design>>> {
    let limit = query.limit.min(MAX_TOP);
    Ok(Json(state.leaderboard.get_top_designs(theme_id, limit)?))
}

pub async fn get_my_rank(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<RankResponse>> {
    let rank = state.leaderboard.get_user_rank(claims.sub, theme_id)?;
    Ok(Json(RankResponse {
        user_id: claims.sub,
        theme_id,
        rank,
    }))
}

pub async fn get_my_submission(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<SubmissionStatusResponse>> {
    let submitted = state.submissions.has_user_submitted(claims.sub, theme_id)?;
    Ok(Json(SubmissionStatusResponse {
        theme_id,
        submitted,
    }))
}
