use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// One user-submitted medical record. Field bounds mirror the intake form;
/// every field is mandatory and is re-checked before classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedicalInput {
    /// Number of pregnancies
    pub pregnancies: u32,

    /// Plasma glucose concentration (mg/dL)
    pub glucose: u32,

    /// Diastolic blood pressure (mmHg)
    pub blood_pressure: u32,

    /// Triceps skin fold thickness (mm)
    pub skin_thickness: u32,

    /// 2-hour serum insulin (mu U/ml)
    pub insulin: u32,

    /// Body mass index (kg/m^2)
    pub bmi: f64,

    /// Family-history likelihood score
    pub diabetes_pedigree_function: f64,

    /// Age in years
    pub age: u32,
}

/// Documented bound for one input field
#[derive(Debug, Clone, Copy)]
pub struct FieldBound {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Bounds in canonical feature order
pub const INPUT_BOUNDS: [FieldBound; 8] = [
    FieldBound { field: "pregnancies", min: 0.0, max: 20.0 },
    FieldBound { field: "glucose", min: 0.0, max: 200.0 },
    FieldBound { field: "blood_pressure", min: 0.0, max: 150.0 },
    FieldBound { field: "skin_thickness", min: 0.0, max: 100.0 },
    FieldBound { field: "insulin", min: 0.0, max: 900.0 },
    FieldBound { field: "bmi", min: 0.0, max: 67.0 },
    FieldBound { field: "diabetes_pedigree_function", min: 0.0, max: 2.5 },
    FieldBound { field: "age", min: 1.0, max: 120.0 },
];

impl MedicalInput {
    /// Field values in canonical feature order
    pub fn ordered_values(&self) -> [f64; 8] {
        [
            self.pregnancies as f64,
            self.glucose as f64,
            self.blood_pressure as f64,
            self.skin_thickness as f64,
            self.insulin as f64,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age as f64,
        ]
    }

    /// Check every field against its documented bound, naming the first
    /// offending field
    pub fn check_bounds(&self) -> Result<()> {
        for (bound, value) in INPUT_BOUNDS.iter().zip(self.ordered_values()) {
            if !value.is_finite() {
                return Err(AppError::validation(
                    bound.field,
                    "value must be a finite number",
                ));
            }
            if value < bound.min || value > bound.max {
                return Err(AppError::validation(
                    bound.field,
                    format!(
                        "value {} is outside the allowed range [{}, {}]",
                        value, bound.min, bound.max
                    ),
                ));
            }
        }
        Ok(())
    }
}
