use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::JournalEntry;
use super::services::JournalDay;
use crate::nutrition::Nutrition;

/// A single hand-entered journal line. `meal_type` is free text.
#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    pub date: Date,
    pub meal_type: String,
    pub food_item: String,
    #[serde(default)]
    pub dining_hall: String,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
}

#[derive(Debug, Serialize)]
pub struct EntryIdResponse {
    pub entry_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EntryIdsResponse {
    pub entry_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    pub date: Option<Date>,
}

/// A grouped day when a date was asked for, every entry otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JournalView {
    Day(JournalDay),
    All(Vec<JournalEntry>),
}
