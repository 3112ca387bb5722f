use axum::{
    Json,
    extract::{Path, State},
};
use tessera_types::api::ThemeResponse;
use tessera_types::models::Theme;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

fn with_remaining(state: &AppState, theme: Theme) -> ThemeResponse {
    let time_remaining_secs = state.themes.get_time_remaining(&theme).num_seconds();
    ThemeResponse {
        theme,
        time_remaining_secs,
    }
}

pub async fn current_theme(State(state): State<AppState>) -> ApiResult<Json<ThemeResponse>> {
    let theme = state
        .themes
        .get_current_theme()?
        .ok_or(ApiError::NoActiveTheme)?;
    Ok(Json(with_remaining(&state, theme)))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
) -> ApiResult<Json<ThemeResponse>> {
    let theme = state.themes.require_theme(theme_id)?;
    Ok(Json(with_remaining(&state, theme)))
}

pub async fn list_themes(State(state): State<AppState>) -> ApiResult<Json<Vec<Theme>>> {
    Ok(Json(state.themes.list_themes()?))
}
