use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tessera_types::api::{Claims, VoteRequest, VoteResponse};
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiResult;

pub async fn cast_vote(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let delta = state
        .voting
        .cast_vote(&claims, claims.sub, design_id, req.vote_type)?;
    Ok(Json(VoteResponse {
        design_id,
        user_vote: Some(req.vote_type),
        delta,
    }))
}

pub async fn change_vote(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let delta = state
        .voting
        .change_vote(&claims, claims.sub, design_id, req.vote_type)?;
    Ok(Json(VoteResponse {
        design_id,
        user_vote: Some(req.vote_type),
        delta,
    }))
}

pub async fn remove_vote(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<VoteResponse>> {
    let delta = state.voting.remove_vote(&claims, claims.sub, design_id)?;
    Ok(Json(VoteResponse {
        design_id,
        user_vote: None,
        delta,
    }))
}

pub async fn get_vote(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<VoteResponse>> {
    let user_vote = state.voting.get_user_vote(claims.sub, design_id)?;
    Ok(Json(VoteResponse {
        design_id,
        user_vote,
        delta: 0,
    }))
}
