use serde::Deserialize;

pub const DEFAULT_MENU_API_URL: &str = "https://dish.avifoodsystems.com/api/menu-items/week";

#[derive(Debug, Clone, Deserialize)]
pub struct MenuApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub menu: MenuApiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://food_journal.db?mode=rwc".into());
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);
        let menu = MenuApiConfig {
            base_url: std::env::var("MENU_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_MENU_API_URL.into()),
            timeout_secs: std::env::var("MENU_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            max_connections,
            menu,
        })
    }
}
