use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::{Date, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use super::repo;
use super::repo_types::{JournalEntry, MealType, NewEntry};
use crate::error::StorageError;
use crate::menu::services::MenuDish;
use crate::nutrition::{sum_nutrition, HasNutrition, Nutrition};

/// A dish picked for the meal being assembled, with its nutrition fixed at
/// selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedDish {
    pub name: String,
    #[serde(default)]
    pub dining_hall: String,
    #[serde(default)]
    pub meal_type: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
}

impl SelectedDish {
    pub fn from_menu_dish(dish: &MenuDish) -> Self {
        Self {
            name: dish.name.clone(),
            dining_hall: dish.dining_hall.to_string(),
            meal_type: dish.meal_type.to_string(),
            nutrition: dish.nutrition(),
        }
    }
}

impl HasNutrition for SelectedDish {
    fn nutrition(&self) -> Nutrition {
        self.nutrition
    }
}

/// A meal under construction. Lives only for the request that logs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDraft {
    pub date: Date,
    pub meal_type: MealType,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub dishes: Vec<SelectedDish>,
}

pub fn draft_totals(draft: &MealDraft) -> Nutrition {
    sum_nutrition(&draft.dishes)
}

/// Write one journal entry per dish. All entries share the draft's date,
/// meal type, notes and creation time.
pub async fn log_meal(
    db: &SqlitePool,
    user_id: i64,
    draft: &MealDraft,
) -> Result<Vec<Uuid>, StorageError> {
    let created_at = OffsetDateTime::now_utc();
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(draft.dishes.len());
    for dish in &draft.dishes {
        let entry = NewEntry {
            user_id,
            date: draft.date,
            meal_type: draft.meal_type.to_string(),
            food_item: dish.name.clone(),
            dining_hall: dish.dining_hall.clone(),
            notes: draft.notes.clone(),
            nutrition: dish.nutrition,
        };
        ids.push(repo::insert_entry(&mut tx, &entry, created_at).await?);
    }
    tx.commit().await?;

    info!(user_id, date = %draft.date, meal = %draft.meal_type, items = ids.len(), "meal logged");
    Ok(ids)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealGroup {
    pub meal_type: String,
    pub entries: Vec<JournalEntry>,
    pub totals: Nutrition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalDay {
    pub date: Date,
    pub meals: Vec<MealGroup>,
    pub totals: Nutrition,
}

/// Bucket entries by meal type in first-seen order, with per-bucket totals.
pub fn group_by_meal(entries: Vec<JournalEntry>) -> Vec<MealGroup> {
    let mut groups: Vec<MealGroup> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|g| g.meal_type == entry.meal_type) {
            Some(group) => group.entries.push(entry),
            None => groups.push(MealGroup {
                meal_type: entry.meal_type.clone(),
                entries: vec![entry],
                totals: Nutrition::ZERO,
            }),
        }
    }
    for group in &mut groups {
        group.totals = sum_nutrition(&group.entries);
    }
    groups
}

pub async fn journal_day(
    db: &SqlitePool,
    user_id: i64,
    date: Date,
) -> Result<JournalDay, StorageError> {
    let entries = repo::list_entries(db, user_id, Some(date)).await?;
    let totals = sum_nutrition(&entries);
    Ok(JournalDay {
        date,
        meals: group_by_meal(entries),
        totals,
    })
}
