//! Dosage rule engine.
//!
//! Pure functions computing the recommended daily dose for a
//! (patient, drug) pair. The weight tiers partition the whole weight range:
//! every weight maps to exactly one tier, with no gaps.

use crate::{Drug, Patient};

/// Patient weight tier selecting which per-kilogram coefficient applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightTier {
    /// Below 25 kg
    Light,
    /// 25 kg up to (not including) 120 kg
    Normal,
    /// 120 kg and above
    Heavy,
}

impl WeightTier {
    /// Select the tier for a weight in kilograms.
    pub fn for_weight(weight_kg: f64) -> Self {
        if weight_kg < 25.0 {
            WeightTier::Light
        } else if weight_kg < 120.0 {
            WeightTier::Normal
        } else {
            WeightTier::Heavy
        }
    }
}

/// The recommended dose per day for this patient and drug.
///
/// The patient's weight selects a tier, and the result is weight times the
/// drug's coefficient for that tier. The unit is whatever the drug record
/// carries. No side effects, no hidden state.
pub fn recommended_daily_dose(patient: &Patient, drug: &Drug) -> f64 {
    let coefficient = match WeightTier::for_weight(patient.weight_kg) {
        WeightTier::Light => drug.per_kg_light,
        WeightTier::Normal => drug.per_kg_normal,
        WeightTier::Heavy => drug.per_kg_heavy,
    };
    patient.weight_kg * coefficient
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_drug() -> Drug {
        Drug::new("Testol", 0.1, 0.15, 0.2, "pcs")
    }

    fn patient_weighing(weight_kg: f64) -> Patient {
        Patient::new("000000-0000", "Test Patient", weight_kg)
    }

    #[test]
    fn test_tier_boundaries_are_inclusive_exclusive() {
        assert_eq!(WeightTier::for_weight(24.9), WeightTier::Light);
        assert_eq!(WeightTier::for_weight(25.0), WeightTier::Normal);
        assert_eq!(WeightTier::for_weight(119.9), WeightTier::Normal);
        assert_eq!(WeightTier::for_weight(120.0), WeightTier::Heavy);
    }

    #[test]
    fn test_every_weight_maps_to_a_tier() {
        for w in [0.0, 1.0, 24.999, 25.0, 63.4, 119.999, 120.0, 250.0] {
            // Must not panic and must be deterministic
            assert_eq!(WeightTier::for_weight(w), WeightTier::for_weight(w));
        }
    }

    #[test]
    fn test_recommended_dose_uses_tier_coefficient() {
        let drug = test_drug();

        let light = patient_weighing(20.0);
        assert!((recommended_daily_dose(&light, &drug) - 2.0).abs() < 1e-9);

        let normal = patient_weighing(63.4);
        assert!((recommended_daily_dose(&normal, &drug) - 9.51).abs() < 1e-9);

        let heavy = patient_weighing(130.0);
        assert!((recommended_daily_dose(&heavy, &drug) - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommended_dose_monotonic_within_tier() {
        let drug = test_drug();
        let weights = [26.0, 40.0, 80.0, 119.0];
        let doses: Vec<f64> = weights
            .iter()
            .map(|&w| recommended_daily_dose(&patient_weighing(w), &drug))
            .collect();

        for pair in doses.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}
