use crate::error::Result;
use crate::models::MedicalInput;
use serde::Serialize;

/// Number of input features the classifier was trained on
pub const FEATURE_COUNT: usize = 8;

/// Canonical feature names in training order. This order is fixed by the
/// trained classifier's schema; the artifact loader rejects any artifact
/// whose own schema disagrees, and the builder always emits values in this
/// order. Reordering here without retraining the model silently corrupts
/// every prediction.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Ordered numeric encoding of one medical record, ready for classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build directly from raw values already in canonical order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        FeatureVector { values }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Value for a canonical feature name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx])
    }

    /// Iterate (name, value) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

/// Assembles validated medical inputs into the canonical feature vector.
/// This is the single enforcement point for input bounds: values arrive
/// pre-checked by the intake form but are re-validated here, and nothing
/// is ever silently defaulted.
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Validate the input and assemble the ordered feature vector.
    /// No side effects; fails with the offending field named.
    pub fn build(input: &MedicalInput) -> Result<FeatureVector> {
        input.check_bounds()?;
        Ok(FeatureVector::from_values(input.ordered_values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> MedicalInput {
        MedicalInput {
            pregnancies: 2,
            glucose: 150,
            blood_pressure: 80,
            skin_thickness: 25,
            insulin: 100,
            bmi: 32.0,
            diabetes_pedigree_function: 0.6,
            age: 45,
        }
    }

    #[test]
    fn test_build_preserves_canonical_order() {
        let vector = FeatureVectorBuilder::build(&sample_input()).unwrap();
        assert_eq!(
            vector.values(),
            &[2.0, 150.0, 80.0, 25.0, 100.0, 32.0, 0.6, 45.0]
        );
    }

    #[test]
    fn test_get_by_name() {
        let vector = FeatureVectorBuilder::build(&sample_input()).unwrap();
        assert_eq!(vector.get("Glucose"), Some(150.0));
        assert_eq!(vector.get("Age"), Some(45.0));
        assert_eq!(vector.get("Cholesterol"), None);
    }

    #[test]
    fn test_iter_pairs_names_with_values() {
        let vector = FeatureVectorBuilder::build(&sample_input()).unwrap();
        let pairs: Vec<_> = vector.iter().collect();
        assert_eq!(pairs[0], ("Pregnancies", 2.0));
        assert_eq!(pairs[6], ("DiabetesPedigreeFunction", 0.6));
    }

    #[test]
    fn test_out_of_bounds_input_never_builds() {
        let input = MedicalInput { age: 0, ..sample_input() };
        assert!(FeatureVectorBuilder::build(&input).is_err());
    }
}
