//! Seed dataset for a fresh registry.
//!
//! Prescriptions are built directly rather than through the validated
//! service operations; the fixtures predate the safety rules and some of
//! them would not pass validation today.

use crate::{Dose, Drug, Patient, Prescription, Registry, Schedule};
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Populate an empty registry with the standard fixture data.
///
/// Returns `true` if data was seeded, `false` if the registry already had
/// patients and was left untouched.
pub fn seed(registry: &mut Registry) -> bool {
    if !registry.patients.is_empty() {
        return false;
    }

    let mut patients = vec![
        Patient::new("121256-0512", "Jane Jensen", 63.4),
        Patient::new("070985-1153", "Finn Madsen", 83.2),
        Patient::new("050972-1233", "Hans Jørgensen", 89.4),
        Patient::new("011064-1522", "Ulla Nielsen", 59.9),
        Patient::new("123456-1234", "Ib Hansen", 87.7),
    ];

    let drugs = vec![
        Drug::new("Acetylsalicylic acid", 0.1, 0.15, 0.16, "pcs"),
        Drug::new("Paracetamol", 1.0, 1.5, 2.0, "ml"),
        Drug::new("Fucidin", 0.025, 0.025, 0.025, "pcs"),
        Drug::new("Methotrexate", 0.01, 0.015, 0.02, "pcs"),
        Drug::new("Prednisolone", 0.1, 0.15, 0.2, "pcs"),
    ];

    let prescriptions = vec![
        pn(&drugs[1], date(2024, 11, 1), date(2024, 11, 12), 123.0),
        pn(&drugs[0], date(2024, 11, 2), date(2024, 11, 14), 3.0),
        pn(&drugs[2], date(2024, 11, 2), date(2024, 11, 25), 5.0),
        pn(&drugs[1], date(2024, 11, 1), date(2024, 11, 12), 123.0),
        Prescription {
            id: Uuid::new_v4(),
            drug_id: drugs[1].id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 11, 12),
            schedule: Schedule::FixedDaily {
                morning: 2.0,
                noon: 0.0,
                evening: 1.0,
                night: 0.0,
            },
        },
        Prescription {
            id: Uuid::new_v4(),
            drug_id: drugs[2].id,
            start_date: date(2024, 1, 2),
            end_date: date(2024, 11, 20),
            schedule: Schedule::VariableDaily {
                doses: vec![
                    Dose::new(time(12, 0, 0), 0.5),
                    Dose::new(time(12, 40, 0), 1.0),
                    Dose::new(time(16, 0, 0), 2.5),
                    Dose::new(time(18, 45, 0), 3.0),
                ],
            },
        },
    ];

    patients[0].prescriptions.push(prescriptions[0].id);
    patients[0].prescriptions.push(prescriptions[1].id);
    patients[2].prescriptions.push(prescriptions[2].id);
    patients[3].prescriptions.push(prescriptions[3].id);
    patients[1].prescriptions.push(prescriptions[4].id);
    patients[1].prescriptions.push(prescriptions[5].id);

    registry.patients = patients;
    registry.drugs = drugs;
    registry.prescriptions = prescriptions;

    tracing::info!(
        "Seeded registry with {} patients, {} drugs, {} prescriptions",
        registry.patients.len(),
        registry.drugs.len(),
        registry.prescriptions.len()
    );
    true
}

fn pn(drug: &Drug, start: NaiveDate, end: NaiveDate, units_per_dose: f64) -> Prescription {
    Prescription {
        id: Uuid::new_v4(),
        drug_id: drug.id,
        start_date: start,
        end_date: end,
        schedule: Schedule::Pn {
            units_per_dose,
            administered: BTreeSet::new(),
        },
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}
