use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::MenuResponse;
use super::services::{fetch_all_menu_items, menu_options, today};
use crate::state::AppState;

pub fn menu_routes() -> Router<AppState> {
    Router::new().route("/menu", get(get_menu))
}

/// Today's menus across all halls. Partial results come back with a warning
/// per failed hall/meal instead of an error status.
#[instrument(skip(state))]
pub async fn get_menu(State(state): State<AppState>) -> Json<MenuResponse> {
    let ingestion = fetch_all_menu_items(state.menu.as_ref(), today()).await;
    let options = menu_options(&ingestion.items);
    Json(MenuResponse {
        date: ingestion.date,
        items: ingestion.items,
        options,
        warnings: ingestion.warnings,
    })
}
