use serde::Serialize;
use time::Date;

use super::services::{IngestionWarning, MenuDish, MenuOption};

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub date: Date,
    pub items: Vec<MenuDish>,
    pub options: Vec<MenuOption>,
    pub warnings: Vec<IngestionWarning>,
}
