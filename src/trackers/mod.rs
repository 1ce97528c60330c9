//! Per-user lifestyle logs: meals with calories, and blood-sugar
//! readings. Both share one JSON-file store and the same ownership rule
//! as prediction history: every operation is scoped by user identifier.

mod log_store;
pub mod meals;
pub mod sugar;

pub use meals::{MealEntry, MealLog, MealType, NewMeal};
pub use sugar::{NewReading, ReadingContext, SugarLog, SugarReading, SugarSummary};
