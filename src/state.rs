use crate::config::AppConfig;
use crate::db;
use crate::menu::client::{HttpMenuClient, MenuClient};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub menu: Arc<dyn MenuClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config).await?;

        let menu = Arc::new(HttpMenuClient::new(
            &config.menu.base_url,
            Duration::from_secs(config.menu.timeout_secs),
        )?) as Arc<dyn MenuClient>;

        Ok(Self::from_parts(db, config, menu))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, menu: Arc<dyn MenuClient>) -> Self {
        Self { db, config, menu }
    }

    /// In-memory database and a canned menu feed.
    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::{MenuApiConfig, DEFAULT_MENU_API_URL};
        use crate::menu::services::tests::FakeMenu;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            menu: MenuApiConfig {
                base_url: DEFAULT_MENU_API_URL.into(),
                timeout_secs: 1,
            },
        });
        let menu = Arc::new(FakeMenu::new(vec![])) as Arc<dyn MenuClient>;
        Self::from_parts(db::memory_pool().await, config, menu)
    }
}
