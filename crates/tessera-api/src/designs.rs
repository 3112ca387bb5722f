use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tessera_core::identity::{CurrentUser, IdentityProvider};
use tessera_types::api::{
    BackgroundColorRequest, Claims, CreateDesignRequest, DesignPage, MoveAssetRequest, PageQuery,
    PlaceAssetRequest, SaveStatusResponse,
};
use tessera_types::models::Design;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

fn caller(claims: &Claims) -> ApiResult<CurrentUser> {
    Ok(claims.require_auth()?)
}

pub async fn create_design(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateDesignRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = caller(&claims)?;

    let theme_id = match req.theme_id {
        Some(id) => state.themes.require_theme(id)?.id,
        None => state.themes.get_current_theme()?.ok_or(ApiError::NoActiveTheme)?.id,
    };

    let design = state.workspace.create(&user, theme_id)?;
    Ok((StatusCode::CREATED, Json(design)))
}

pub async fn get_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
) -> ApiResult<Json<Design>> {
    Ok(Json(state.workspace.current(design_id)?))
}

pub async fn my_designs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Design>>> {
    let user = caller(&claims)?;
    let designs = state
        .designs
        .get_user_designs(user.id)?
        .into_iter()
        .map(|design| state.workspace.current(design.id).unwrap_or(design))
        .collect();
    Ok(Json(designs))
}

pub async fn place_asset(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PlaceAssetRequest>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    let design = state.workspace.edit(&user, design_id, |manager| {
        manager.place_asset(design_id, &req.asset_id, req.x, req.y).cloned()
    })?;
    Ok(Json(design))
}

pub async fn move_asset(
    State(state): State<AppState>,
    Path((design_id, index)): Path<(Uuid, usize)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MoveAssetRequest>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    let design = state.workspace.edit(&user, design_id, |manager| {
        manager.move_asset(design_id, index, req.x, req.y).cloned()
    })?;
    Ok(Json(design))
}

pub async fn rotate_asset(
    State(state): State<AppState>,
    Path((design_id, index)): Path<(Uuid, usize)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    let design = state.workspace.edit(&user, design_id, |manager| {
        manager.rotate_asset(design_id, index).cloned()
    })?;
    Ok(Json(design))
}

pub async fn remove_asset(
    State(state): State<AppState>,
    Path((design_id, index)): Path<(Uuid, usize)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    let design = state.workspace.edit(&user, design_id, |manager| {
        manager.remove_asset(design_id, index).cloned()
    })?;
    Ok(Json(design))
}

pub async fn set_background(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BackgroundColorRequest>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    let design = state.workspace.edit(&user, design_id, |manager| {
        manager.update_background_color(design_id, &req.color).cloned()
    })?;
    Ok(Json(design))
}

/// Explicit save: writes the working copy without waiting for the debounce.
pub async fn save_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    Ok(Json(state.workspace.flush(&user, design_id)?))
}

pub async fn save_status(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
) -> Json<SaveStatusResponse> {
    Json(state.workspace.status(design_id))
}

pub async fn cancel_save(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    let user = caller(&claims)?;
    state.workspace.cancel(&user, design_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn close_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    Ok(Json(state.workspace.close(&user, design_id)?))
}

/// Writes the latest edits, then enters the design for its theme.
pub async fn submit_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Design>> {
    let user = caller(&claims)?;
    let design = state.workspace.flush(&user, design_id)?;
    Ok(Json(state.submissions.submit_design(&claims, &design)?))
}

pub async fn submitted_designs(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<DesignPage>> {
    let (designs, total) = state
        .designs
        .get_submitted_designs(theme_id, query.page, query.per_page)?;
    Ok(Json(DesignPage {
        designs,
        page: query.page,
        per_page: query.per_page.clamp(1, 100),
        total,
    }))
}
