use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::StorageError;
use crate::nutrition::{HasNutrition, Nutrition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `food_journal` row as stored.
#[derive(Debug, FromRow)]
pub struct JournalEntryRow {
    pub entry_id: String,
    pub user_id: i64,
    pub date: Date,
    pub meal_type: String,
    pub food_item: String,
    pub dining_hall: String,
    pub notes: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub created_at: OffsetDateTime,
}

/// One logged food item with its nutrition snapshot. `meal_type` is kept as
/// written; the store does not restrict it to [`MealType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub user_id: i64,
    pub date: Date,
    pub meal_type: String,
    pub food_item: String,
    pub dining_hall: String,
    pub notes: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<JournalEntryRow> for JournalEntry {
    type Error = StorageError;

    fn try_from(r: JournalEntryRow) -> Result<Self, Self::Error> {
        let entry_id = Uuid::parse_str(&r.entry_id).map_err(|e| StorageError::CorruptRow {
            table: "food_journal",
            reason: format!("entry_id {:?}: {e}", r.entry_id),
        })?;
        Ok(Self {
            entry_id,
            user_id: r.user_id,
            date: r.date,
            meal_type: r.meal_type,
            food_item: r.food_item,
            dining_hall: r.dining_hall,
            notes: r.notes,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
            created_at: r.created_at,
        })
    }
}

impl HasNutrition for JournalEntry {
    fn nutrition(&self) -> Nutrition {
        Nutrition::new(self.calories, self.protein, self.carbs, self.fat)
    }
}

/// Values for a journal insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: i64,
    pub date: Date,
    pub meal_type: String,
    pub food_item: String,
    pub dining_hall: String,
    pub notes: String,
    pub nutrition: Nutrition,
}
