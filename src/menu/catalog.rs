use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiningHall {
    Bae,
    Bates,
    StoneD,
    Tower,
}

impl DiningHall {
    pub const ALL: [DiningHall; 4] = [
        DiningHall::Bae,
        DiningHall::Bates,
        DiningHall::StoneD,
        DiningHall::Tower,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DiningHall::Bae => "Bae",
            DiningHall::Bates => "Bates",
            DiningHall::StoneD => "StoneD",
            DiningHall::Tower => "Tower",
        }
    }

    /// `locationId` used by the menu API.
    pub fn location_id(self) -> u32 {
        match self {
            DiningHall::Bae => 96,
            DiningHall::Bates => 95,
            DiningHall::StoneD => 131,
            DiningHall::Tower => 97,
        }
    }
}

impl fmt::Display for DiningHall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meal periods served by the halls. Snacks are logged but never on a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealPeriod {
    pub const ALL: [MealPeriod; 3] = [MealPeriod::Breakfast, MealPeriod::Lunch, MealPeriod::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealPeriod::Breakfast => "Breakfast",
            MealPeriod::Lunch => "Lunch",
            MealPeriod::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `mealId` for a hall's meal period. Each hall numbers its periods separately.
pub fn meal_id(hall: DiningHall, period: MealPeriod) -> u32 {
    use DiningHall::*;
    use MealPeriod::*;
    match (hall, period) {
        (Bae, Breakfast) => 148,
        (Bae, Lunch) => 149,
        (Bae, Dinner) => 312,
        (Bates, Breakfast) => 145,
        (Bates, Lunch) => 146,
        (Bates, Dinner) => 311,
        (StoneD, Breakfast) => 261,
        (StoneD, Lunch) => 262,
        (StoneD, Dinner) => 263,
        (Tower, Breakfast) => 153,
        (Tower, Lunch) => 154,
        (Tower, Dinner) => 310,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSlot {
    pub hall: DiningHall,
    pub period: MealPeriod,
}

impl MenuSlot {
    pub fn location_id(&self) -> u32 {
        self.hall.location_id()
    }

    pub fn meal_id(&self) -> u32 {
        meal_id(self.hall, self.period)
    }
}

/// Every (hall, period) pair fetched on ingestion, hall by hall.
pub fn menu_slots() -> impl Iterator<Item = MenuSlot> {
    DiningHall::ALL.into_iter().flat_map(|hall| {
        MealPeriod::ALL
            .into_iter()
            .map(move |period| MenuSlot { hall, period })
    })
}
