use axum::{Json, extract::State};
use tessera_types::models::Asset;

use crate::auth::AppState;

pub async fn list_assets(State(state): State<AppState>) -> Json<Vec<Asset>> {
    Json(state.catalog.load_assets())
}
