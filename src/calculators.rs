//! Pure health calculators: BMI classification, a family-history
//! diabetes-pedigree estimate, and calorie-burn estimation. These are
//! self-contained formulas; none of them ever stands in for the risk
//! classifier.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

#[derive(Debug, Clone, Serialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub category: BmiCategory,
}

/// BMI from weight and height, with WHO classification
pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<BmiReport> {
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err(AppError::validation("weight_kg", "must be a positive number"));
    }
    if !(height_cm.is_finite() && height_cm > 0.0) {
        return Err(AppError::validation("height_cm", "must be a positive number"));
    }

    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);

    let category = if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    };

    Ok(BmiReport { bmi, category })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Parent,
    Sibling,
    Grandparent,
    AuntUncle,
    Cousin,
}

impl Relation {
    /// Genetic relatedness coefficient
    fn kinship(&self) -> f64 {
        match self {
            Relation::Parent | Relation::Sibling => 0.5,
            Relation::Grandparent | Relation::AuntUncle => 0.25,
            Relation::Cousin => 0.125,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Relative {
    pub relation: Relation,
    pub diabetic: bool,
}

/// Simplified diabetes-pedigree estimate: kinship-weighted share of
/// diabetic relatives.
pub fn pedigree_estimate(family: &[Relative]) -> Result<f64> {
    if family.is_empty() {
        return Err(AppError::validation(
            "family",
            "at least one relative is required",
        ));
    }

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for member in family {
        let coeff = member.relation.kinship();
        if member.diabetic {
            numerator += coeff;
        }
        denominator += coeff;
    }

    Ok(numerator / denominator)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Estimate calories burned during exercise from heart rate (Keytel
/// regression). This estimation formula is acceptable for the calorie
/// feature only; risk prediction always goes through the classifier.
pub fn calories_burned(
    gender: Gender,
    age_years: f64,
    weight_kg: f64,
    heart_rate_bpm: f64,
    duration_min: f64,
) -> Result<f64> {
    if !(age_years.is_finite() && (1.0..=120.0).contains(&age_years)) {
        return Err(AppError::validation("age_years", "must be between 1 and 120"));
    }
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err(AppError::validation("weight_kg", "must be a positive number"));
    }
    if !(heart_rate_bpm.is_finite() && (30.0..=250.0).contains(&heart_rate_bpm)) {
        return Err(AppError::validation(
            "heart_rate_bpm",
            "must be between 30 and 250",
        ));
    }
    if !(duration_min.is_finite() && duration_min > 0.0) {
        return Err(AppError::validation(
            "duration_min",
            "must be a positive number",
        ));
    }

    let per_minute = match gender {
        Gender::Male => {
            (-55.0969 + 0.6309 * heart_rate_bpm + 0.1988 * weight_kg + 0.2017 * age_years) / 4.184
        }
        Gender::Female => {
            (-20.4022 + 0.4472 * heart_rate_bpm - 0.1263 * weight_kg + 0.074 * age_years) / 4.184
        }
    };

    Ok((per_minute * duration_min).max(0.0))
}
