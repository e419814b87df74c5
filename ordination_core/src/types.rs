//! Core domain types for the Ordination system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Drugs and their per-kilogram dosing coefficients
//! - Patients and the prescriptions they own
//! - The three prescription variants (PN, fixed daily, variable daily)
//! - Administration outcomes for PN recording

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Drug and Patient
// ============================================================================

/// A drug with per-kilogram-per-day dosing coefficients keyed by weight tier.
///
/// Immutable after creation. The unit is stored verbatim on the record;
/// no conversion is performed anywhere in the system.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Drug {
    pub id: Uuid,
    pub name: String,
    pub per_kg_light: f64,
    pub per_kg_normal: f64,
    pub per_kg_heavy: f64,
    pub unit: String,
}

impl Drug {
    pub fn new(
        name: impl Into<String>,
        per_kg_light: f64,
        per_kg_normal: f64,
        per_kg_heavy: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            per_kg_light,
            per_kg_normal,
            per_kg_heavy,
            unit: unit.into(),
        }
    }
}

/// A patient and the ordered list of prescription ids they own.
///
/// The patient is the authority for "which prescriptions belong to me";
/// prescriptions never hold a back-reference. The list is append-only and
/// grows only through prescription creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub ssn: String,
    pub name: String,
    pub weight_kg: f64,
    pub prescriptions: Vec<Uuid>,
}

impl Patient {
    pub fn new(ssn: impl Into<String>, name: impl Into<String>, weight_kg: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            ssn: ssn.into(),
            name: name.into(),
            weight_kg,
            prescriptions: Vec::new(),
        }
    }
}

// ============================================================================
// Prescription Types
// ============================================================================

/// A single scheduled administration amount tied to a time of day.
///
/// Only used by the variable-daily variant. Within one prescription all
/// times are pairwise distinct.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Dose {
    pub time: NaiveTime,
    pub amount: f64,
}

impl Dose {
    pub fn new(time: NaiveTime, amount: f64) -> Self {
        Self { time, amount }
    }
}

/// The variant-specific part of a prescription.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// As-needed (pro re nata): a fixed amount per administration, with the
    /// set of dates on which an administration was recorded.
    Pn {
        units_per_dose: f64,
        administered: BTreeSet<NaiveDate>,
    },
    /// Four fixed amounts per day, one per time slot.
    FixedDaily {
        morning: f64,
        noon: f64,
        evening: f64,
        night: f64,
    },
    /// Arbitrary per-time amounts, sorted ascending by time of day.
    VariableDaily { doses: Vec<Dose> },
}

/// Discriminant for listing and reporting.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionKind {
    Pn,
    FixedDaily,
    VariableDaily,
}

impl fmt::Display for PrescriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrescriptionKind::Pn => "pn",
            PrescriptionKind::FixedDaily => "fixed_daily",
            PrescriptionKind::VariableDaily => "variable_daily",
        };
        f.write_str(s)
    }
}

/// A prescription for a drug over a validity window.
///
/// Constructed only through the validated service operations. Immutable
/// afterwards except for the PN administered-date set, which grows through
/// `record_administration`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub drug_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Schedule,
}

impl Prescription {
    pub fn kind(&self) -> PrescriptionKind {
        match self.schedule {
            Schedule::Pn { .. } => PrescriptionKind::Pn,
            Schedule::FixedDaily { .. } => PrescriptionKind::FixedDaily,
            Schedule::VariableDaily { .. } => PrescriptionKind::VariableDaily,
        }
    }

    /// Number of days in the validity window, both endpoints counted.
    pub fn days_inclusive(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Dose for one day.
    ///
    /// For the daily variants this is the sum of the scheduled amounts. For
    /// PN it is the mean over the distinct dates administered so far, which
    /// is undefined until the first administration is recorded.
    pub fn daily_dose(&self) -> Option<f64> {
        match &self.schedule {
            Schedule::Pn { administered, .. } => {
                if administered.is_empty() {
                    None
                } else {
                    Some(self.total_dose() / administered.len() as f64)
                }
            }
            Schedule::FixedDaily {
                morning,
                noon,
                evening,
                night,
            } => Some(morning + noon + evening + night),
            Schedule::VariableDaily { doses } => {
                Some(doses.iter().map(|d| d.amount).sum())
            }
        }
    }

    /// Cumulative dose over the whole prescription.
    ///
    /// For the daily variants this is the daily dose times the inclusive day
    /// count; for PN it is the per-administration amount times the number of
    /// distinct dates recorded.
    pub fn total_dose(&self) -> f64 {
        match &self.schedule {
            Schedule::Pn {
                units_per_dose,
                administered,
            } => units_per_dose * administered.len() as f64,
            Schedule::FixedDaily { .. } | Schedule::VariableDaily { .. } => {
                // daily_dose is always Some for these variants
                self.daily_dose().unwrap_or(0.0) * self.days_inclusive() as f64
            }
        }
    }
}

// ============================================================================
// Administration Outcomes
// ============================================================================

/// Outcome of recording a PN administration for a calendar date.
///
/// These are normal results of the state machine, not errors: a caller must
/// be able to tell them apart without anything being thrown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrationOutcome {
    /// The date was added to the administered set.
    Recorded,
    /// The date was already present; nothing changed.
    AlreadyRecorded,
    /// The date lies outside the prescription's validity window; nothing changed.
    OutOfRange,
}

impl fmt::Display for AdministrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdministrationOutcome::Recorded => "administration recorded",
            AdministrationOutcome::AlreadyRecorded => "date already recorded",
            AdministrationOutcome::OutOfRange => "date outside the validity window",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_fixed_daily_dose_computation() {
        let p = Prescription {
            id: Uuid::new_v4(),
            drug_id: Uuid::new_v4(),
            start_date: date(2024, 11, 27),
            end_date: date(2024, 11, 30),
            schedule: Schedule::FixedDaily {
                morning: 2.0,
                noon: 1.0,
                evening: 3.0,
                night: 1.5,
            },
        };

        assert_eq!(p.days_inclusive(), 4);
        assert_eq!(p.daily_dose(), Some(7.5));
        assert_eq!(p.total_dose(), 30.0);
    }

    #[test]
    fn test_variable_daily_dose_computation() {
        let p = Prescription {
            id: Uuid::new_v4(),
            drug_id: Uuid::new_v4(),
            start_date: date(2024, 11, 27),
            end_date: date(2024, 11, 30),
            schedule: Schedule::VariableDaily {
                doses: vec![
                    Dose::new(time(8, 0), 1.0),
                    Dose::new(time(12, 0), 2.5),
                    Dose::new(time(20, 0), 1.5),
                ],
            },
        };

        assert_eq!(p.daily_dose(), Some(5.0));
        assert_eq!(p.total_dose(), 20.0);
    }

    #[test]
    fn test_pn_dose_is_mean_over_administered_dates() {
        let mut administered = BTreeSet::new();
        administered.insert(date(2024, 11, 27));
        administered.insert(date(2024, 11, 28));
        administered.insert(date(2024, 11, 29));

        let p = Prescription {
            id: Uuid::new_v4(),
            drug_id: Uuid::new_v4(),
            start_date: date(2024, 11, 27),
            end_date: date(2024, 12, 1),
            schedule: Schedule::Pn {
                units_per_dose: 2.0,
                administered,
            },
        };

        assert_eq!(p.total_dose(), 6.0);
        assert_eq!(p.daily_dose(), Some(2.0));
    }

    #[test]
    fn test_pn_daily_dose_undefined_without_administrations() {
        let p = Prescription {
            id: Uuid::new_v4(),
            drug_id: Uuid::new_v4(),
            start_date: date(2024, 11, 27),
            end_date: date(2024, 12, 1),
            schedule: Schedule::Pn {
                units_per_dose: 2.0,
                administered: BTreeSet::new(),
            },
        };

        assert_eq!(p.daily_dose(), None);
        assert_eq!(p.total_dose(), 0.0);
    }

    #[test]
    fn test_single_day_window_counts_one_day() {
        let p = Prescription {
            id: Uuid::new_v4(),
            drug_id: Uuid::new_v4(),
            start_date: date(2024, 11, 27),
            end_date: date(2024, 11, 27),
            schedule: Schedule::FixedDaily {
                morning: 1.0,
                noon: 0.0,
                evening: 0.0,
                night: 0.0,
            },
        };

        assert_eq!(p.days_inclusive(), 1);
        assert_eq!(p.total_dose(), 1.0);
    }

    #[test]
    fn test_schedule_serde_roundtrip() {
        let p = Prescription {
            id: Uuid::new_v4(),
            drug_id: Uuid::new_v4(),
            start_date: date(2024, 11, 27),
            end_date: date(2024, 11, 30),
            schedule: Schedule::VariableDaily {
                doses: vec![Dose::new(time(8, 0), 1.0)],
            },
        };

        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"kind\":\"variable_daily\""));
        let back: Prescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), PrescriptionKind::VariableDaily);
        assert_eq!(back.daily_dose(), Some(1.0));
    }
}
