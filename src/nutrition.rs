//! Nutrition snapshot shared by menu dishes, meal drafts and journal entries,
//! plus the fold that totals them.

use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrition {
    pub const ZERO: Nutrition = Nutrition {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };

    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }
}

impl Add for Nutrition {
    type Output = Nutrition;

    fn add(self, rhs: Nutrition) -> Nutrition {
        Nutrition {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl Sum for Nutrition {
    fn sum<I: Iterator<Item = Nutrition>>(iter: I) -> Self {
        iter.fold(Nutrition::ZERO, Add::add)
    }
}

impl From<Nutrition> for (f64, f64, f64, f64) {
    fn from(n: Nutrition) -> Self {
        (n.calories, n.protein, n.carbs, n.fat)
    }
}

/// Anything carrying the four tracked nutrition fields.
pub trait HasNutrition {
    fn nutrition(&self) -> Nutrition;
}

impl HasNutrition for Nutrition {
    fn nutrition(&self) -> Nutrition {
        *self
    }
}

/// Field-wise total over `records`. Empty input gives [`Nutrition::ZERO`].
pub fn sum_nutrition<'a, T, I>(records: I) -> Nutrition
where
    T: HasNutrition + 'a,
    I: IntoIterator<Item = &'a T>,
{
    records.into_iter().map(HasNutrition::nutrition).sum()
}

/// Read calories, protein, carbohydrates and fat out of a menu item's
/// `nutritionals` object. Missing, null or unreadable values count as zero.
pub fn extract_nutrition(payload: Option<&Value>) -> Nutrition {
    let Some(Value::Object(fields)) = payload else {
        return Nutrition::ZERO;
    };

    Nutrition {
        calories: coerce(fields.get("calories")),
        protein: coerce(fields.get("protein")),
        carbs: coerce(fields.get("carbohydrates")),
        fat: coerce(fields.get("fat")),
    }
}

fn coerce(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}
