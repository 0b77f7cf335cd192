mod app;
mod config;
mod db;
mod error;
mod journal;
mod menu;
mod nutrition;
mod state;
mod users;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "food_journal=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    tracing::info!(
        database = %app_state.config.database_url,
        menu_api = %app_state.config.menu.base_url,
        "state ready"
    );

    db::ensure_schema(&app_state.db).await?;

    let app = app::build_app(app_state);
    app::serve(app).await
}
