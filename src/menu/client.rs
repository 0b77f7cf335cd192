use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::Date;
use tracing::debug;

use crate::error::MenuFetchError;

/// One dish object as the menu API returns it. Only `name` and
/// `nutritionals` are read; everything else is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMenuItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nutritionals: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
pub trait MenuClient: Send + Sync {
    async fn fetch_menu(
        &self,
        date: Date,
        location_id: u32,
        meal_id: u32,
    ) -> Result<Vec<RawMenuItem>, MenuFetchError>;
}

#[derive(Clone)]
pub struct HttpMenuClient {
    client: Client,
    base_url: Url,
}

impl HttpMenuClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("menu api url {base_url}"))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build menu http client")?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl MenuClient for HttpMenuClient {
    async fn fetch_menu(
        &self,
        date: Date,
        location_id: u32,
        meal_id: u32,
    ) -> Result<Vec<RawMenuItem>, MenuFetchError> {
        let response = self
            .client
            .get(self.base_url.clone())
            .header(ACCEPT, "application/json")
            .query(&[
                ("date", format_menu_date(date)),
                ("locationId", location_id.to_string()),
                ("mealId", meal_id.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MenuFetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!(location_id, meal_id, bytes = body.len(), "menu fetched");
        parse_menu_items(&body)
    }
}

/// The menu API wants dates as `MM-DD-YYYY`.
pub fn format_menu_date(date: Date) -> String {
    format!(
        "{:02}-{:02}-{:04}",
        u8::from(date.month()),
        date.day(),
        date.year()
    )
}

pub fn parse_menu_items(body: &[u8]) -> Result<Vec<RawMenuItem>, MenuFetchError> {
    serde_json::from_slice(body).map_err(|e| MenuFetchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn menu_date_is_month_day_year() {
        assert_eq!(format_menu_date(date!(2025 - 03 - 07)), "03-07-2025");
        assert_eq!(format_menu_date(date!(2024 - 12 - 31)), "12-31-2024");
    }

    #[test]
    fn parses_array_and_keeps_unknown_fields() {
        let body = br#"[
            {"name": "Veggie Omelet", "id": 4411, "nutritionals": {"calories": "210", "protein": 14}},
            {"name": "Toast", "allergens": [{"name": "Wheat"}]},
            {"stationName": "Grill"}
        ]"#;
        let items = parse_menu_items(body).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name.as_deref(), Some("Veggie Omelet"));
        assert_eq!(items[0].extra.get("id"), Some(&Value::from(4411)));
        assert!(items[1].nutritionals.is_none());
        assert!(items[2].name.is_none());
    }

    #[test]
    fn non_array_body_is_a_decode_error() {
        let err = parse_menu_items(br#"{"error": "closed"}"#).unwrap_err();
        assert!(matches!(err, MenuFetchError::Decode(_)));
        assert!(matches!(
            parse_menu_items(b"<html>").unwrap_err(),
            MenuFetchError::Decode(_)
        ));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(HttpMenuClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpMenuClient::new(crate::config::DEFAULT_MENU_API_URL, Duration::from_secs(1)).is_ok());
    }
}
