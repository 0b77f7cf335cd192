use serde::Serialize;
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use super::catalog::{menu_slots, DiningHall, MealPeriod};
use super::client::MenuClient;
use crate::journal::services::SelectedDish;
use crate::nutrition::{extract_nutrition, HasNutrition, Nutrition};

/// A dish on today's menu, tagged with where and when it is served.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuDish {
    pub name: String,
    pub dining_hall: DiningHall,
    pub meal_type: MealPeriod,
    pub nutritionals: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HasNutrition for MenuDish {
    fn nutrition(&self) -> Nutrition {
        extract_nutrition(self.nutritionals.as_ref())
    }
}

/// A (hall, period) request that failed during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionWarning {
    pub dining_hall: DiningHall,
    pub meal_type: MealPeriod,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuIngestion {
    pub date: Date,
    pub items: Vec<MenuDish>,
    pub warnings: Vec<IngestionWarning>,
}

/// Entry in the dish picker: `"{name} ({hall} - {meal})"`, carrying the dish
/// in the shape a meal draft accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuOption {
    pub label: String,
    #[serde(flatten)]
    pub dish: SelectedDish,
}

/// Local calendar date, falling back to UTC when the offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Fetch every hall's breakfast, lunch and dinner for `date`. A failing
/// request is recorded as a warning and the remaining ones still run.
pub async fn fetch_all_menu_items(client: &dyn MenuClient, date: Date) -> MenuIngestion {
    let mut items = Vec::new();
    let mut warnings = Vec::new();

    for slot in menu_slots() {
        match client
            .fetch_menu(date, slot.location_id(), slot.meal_id())
            .await
        {
            Ok(raw) => items.extend(raw.into_iter().map(|item| MenuDish {
                name: item.name.unwrap_or_default(),
                dining_hall: slot.hall,
                meal_type: slot.period,
                nutritionals: item.nutritionals,
                extra: item.extra,
            })),
            Err(e) => {
                warn!(
                    error = %e,
                    dining_hall = %slot.hall,
                    meal = %slot.period,
                    "menu fetch failed"
                );
                warnings.push(IngestionWarning {
                    dining_hall: slot.hall,
                    meal_type: slot.period,
                    message: format!("Error fetching menu for {} {}: {}", slot.hall, slot.period, e),
                });
            }
        }
    }

    info!(%date, items = items.len(), failed = warnings.len(), "menu ingestion finished");
    MenuIngestion {
        date,
        items,
        warnings,
    }
}

/// Named dishes as picker entries, sorted by label.
pub fn menu_options(items: &[MenuDish]) -> Vec<MenuOption> {
    let mut options: Vec<MenuOption> = items
        .iter()
        .filter(|dish| !dish.name.is_empty())
        .map(|dish| MenuOption {
            label: format!("{} ({} - {})", dish.name, dish.dining_hall, dish.meal_type),
            dish: SelectedDish::from_menu_dish(dish),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::MenuFetchError;
    use crate::menu::client::RawMenuItem;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use time::macros::date;

    /// Serves two dishes per slot, except for the meal ids listed in `failing`.
    pub(crate) struct FakeMenu {
        pub failing: Vec<u32>,
        pub calls: Mutex<Vec<(Date, u32, u32)>>,
    }

    impl FakeMenu {
        pub(crate) fn new(failing: Vec<u32>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MenuClient for FakeMenu {
        async fn fetch_menu(
            &self,
            date: Date,
            location_id: u32,
            meal_id: u32,
        ) -> Result<Vec<RawMenuItem>, MenuFetchError> {
            self.calls.lock().unwrap().push((date, location_id, meal_id));
            if self.failing.contains(&meal_id) {
                return Err(MenuFetchError::Status { status: 503 });
            }
            Ok(vec![
                RawMenuItem {
                    name: Some(format!("Dish {meal_id}")),
                    nutritionals: Some(json!({ "calories": 100, "protein": "5" })),
                    ..Default::default()
                },
                RawMenuItem {
                    name: None,
                    nutritionals: None,
                    ..Default::default()
                },
            ])
        }
    }

    #[tokio::test]
    async fn queries_all_twelve_slots_for_the_date() {
        let fake = FakeMenu::new(vec![]);
        let day = date!(2025 - 04 - 02);
        let result = fetch_all_menu_items(&fake, day).await;

        assert_eq!(result.items.len(), 24);
        assert!(result.warnings.is_empty());
        let calls = fake.calls.lock().unwrap();
        assert_eq!(calls.len(), 12);
        assert!(calls.iter().all(|(d, _, _)| *d == day));
        assert_eq!(calls[0], (day, 96, 148));
    }

    #[tokio::test]
    async fn one_failing_slot_leaves_the_other_eleven() {
        // Bates lunch
        let fake = FakeMenu::new(vec![146]);
        let result = fetch_all_menu_items(&fake, date!(2025 - 04 - 02)).await;

        assert_eq!(result.items.len(), 22);
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.dining_hall, DiningHall::Bates);
        assert_eq!(warning.meal_type, MealPeriod::Lunch);
        assert!(warning.message.contains("503"));
        assert!(!result
            .items
            .iter()
            .any(|d| d.dining_hall == DiningHall::Bates && d.meal_type == MealPeriod::Lunch));
    }

    #[tokio::test]
    async fn dishes_are_tagged_with_hall_and_meal() {
        let fake = FakeMenu::new(vec![]);
        let result = fetch_all_menu_items(&fake, date!(2025 - 04 - 02)).await;
        let dish = result
            .items
            .iter()
            .find(|d| d.name == "Dish 263")
            .unwrap();
        assert_eq!(dish.dining_hall, DiningHall::StoneD);
        assert_eq!(dish.meal_type, MealPeriod::Dinner);
        assert_eq!(dish.nutrition(), Nutrition::new(100.0, 5.0, 0.0, 0.0));
    }

    #[tokio::test]
    async fn options_skip_nameless_dishes_and_sort_by_label() {
        let fake = FakeMenu::new(vec![]);
        let result = fetch_all_menu_items(&fake, date!(2025 - 04 - 02)).await;
        let options = menu_options(&result.items);

        assert_eq!(options.len(), 12);
        assert!(options.windows(2).all(|w| w[0].label <= w[1].label));
        let bae = options
            .iter()
            .find(|o| o.label == "Dish 148 (Bae - Breakfast)")
            .unwrap();
        assert_eq!(bae.dish.dining_hall, "Bae");
        assert_eq!(bae.dish.nutrition, Nutrition::new(100.0, 5.0, 0.0, 0.0));
    }
}
