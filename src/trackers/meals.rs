use crate::error::{AppError, Result};
use crate::models::UserId;
use crate::trackers::log_store::JsonLogStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// One logged meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub meal_type: MealType,
    pub food: String,
    pub servings: f64,
    pub calories: f64,
}

/// Fields supplied by the caller when logging a meal
#[derive(Debug, Clone, Deserialize)]
pub struct NewMeal {
    pub meal_type: MealType,
    pub food: String,
    pub servings: f64,
    pub calories: f64,
}

/// Calorie totals for one day
#[derive(Debug, Clone, Serialize)]
pub struct MealDaySummary {
    pub date: NaiveDate,
    pub entries: usize,
    pub total_calories: f64,
}

/// Per-user meal log
pub struct MealLog {
    store: JsonLogStore<MealEntry>,
}

impl MealLog {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self {
            store: JsonLogStore::new(root, "meals")?,
        })
    }

    pub fn add(&self, user: &UserId, meal: NewMeal) -> Result<MealEntry> {
        let food = meal.food.trim();
        if food.is_empty() {
            return Err(AppError::validation("food", "food name must not be empty"));
        }
        if !(meal.servings.is_finite() && meal.servings > 0.0) {
            return Err(AppError::validation("servings", "must be a positive number"));
        }
        if !(meal.calories.is_finite() && meal.calories >= 0.0) {
            return Err(AppError::validation(
                "calories",
                "must be a non-negative number",
            ));
        }

        let entry = MealEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            meal_type: meal.meal_type,
            food: food.to_string(),
            servings: meal.servings,
            calories: meal.calories,
        };
        self.store.append(user, entry.clone())?;
        tracing::debug!(user = %user, food = %entry.food, "Meal logged");
        Ok(entry)
    }

    /// All meals for one user, most recent first
    pub fn list(&self, user: &UserId) -> Result<Vec<MealEntry>> {
        let mut entries = self.store.load(user)?;
        entries.reverse();
        Ok(entries)
    }

    pub fn daily_summary(&self, user: &UserId, date: NaiveDate) -> Result<MealDaySummary> {
        let entries = self.store.load(user)?;
        let day_entries: Vec<&MealEntry> = entries
            .iter()
            .filter(|e| e.timestamp.date_naive() == date)
            .collect();

        Ok(MealDaySummary {
            date,
            entries: day_entries.len(),
            total_calories: day_entries.iter().map(|e| e.calories * e.servings).sum(),
        })
    }

    pub fn clear(&self, user: &UserId) -> Result<()> {
        self.store.clear(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log() -> (MealLog, TempDir) {
        let dir = TempDir::new().unwrap();
        let log = MealLog::new(dir.path()).unwrap();
        (log, dir)
    }

    fn meal(food: &str, calories: f64) -> NewMeal {
        NewMeal {
            meal_type: MealType::Lunch,
            food: food.to_string(),
            servings: 1.0,
            calories,
        }
    }

    #[test]
    fn test_add_and_list() {
        let (log, _dir) = log();
        let user = UserId::new("alice@example.com").unwrap();

        log.add(&user, meal("dal", 180.0)).unwrap();
        log.add(&user, meal("rice", 210.0)).unwrap();

        let entries = log.list(&user).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].food, "rice"); // most recent first
    }

    #[test]
    fn test_rejects_empty_food() {
        let (log, _dir) = log();
        let user = UserId::new("alice@example.com").unwrap();
        assert!(log.add(&user, meal("  ", 100.0)).is_err());
    }

    #[test]
    fn test_rejects_negative_calories() {
        let (log, _dir) = log();
        let user = UserId::new("alice@example.com").unwrap();
        assert!(log.add(&user, meal("dal", -5.0)).is_err());
    }

    #[test]
    fn test_daily_summary_counts_servings() {
        let (log, _dir) = log();
        let user = UserId::new("alice@example.com").unwrap();

        log.add(
            &user,
            NewMeal {
                meal_type: MealType::Breakfast,
                food: "idli".to_string(),
                servings: 2.0,
                calories: 60.0,
            },
        )
        .unwrap();
        log.add(&user, meal("dal", 180.0)).unwrap();

        let today = Utc::now().date_naive();
        let summary = log.daily_summary(&user, today).unwrap();
        assert_eq!(summary.entries, 2);
        assert!((summary.total_calories - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_users_are_isolated() {
        let (log, _dir) = log();
        let alice = UserId::new("alice@example.com").unwrap();
        let bob = UserId::new("bob@example.com").unwrap();

        log.add(&alice, meal("dal", 180.0)).unwrap();

        assert_eq!(log.list(&alice).unwrap().len(), 1);
        assert!(log.list(&bob).unwrap().is_empty());
    }
}
