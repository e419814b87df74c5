//! Prescription factory, validation, and PN administration recording.
//!
//! Every create operation follows the same shape: resolve the patient and
//! drug through the store, compute the recommended daily ceiling, run the
//! variant's checks, and only then construct and persist. Validation always
//! completes before the first mutation, so a failing create leaves nothing
//! behind.

use crate::rules::recommended_daily_dose;
use crate::{
    AdministrationOutcome, Dose, Drug, Error, Patient, Prescription, PrescriptionKind, Result,
    Schedule, Store,
};
use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Entry point for creating prescriptions and recording administrations.
pub struct OrdinationService<S: Store> {
    store: S,
}

impl<S: Store> OrdinationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hand the store back, e.g. to persist it after a batch of operations.
    pub fn into_store(self) -> S {
        self.store
    }

    /// The recommended dose per day for this patient and drug.
    pub fn recommended_daily_dose(&self, patient_id: Uuid, drug_id: Uuid) -> Result<f64> {
        let (patient, drug) = self.resolve(patient_id, drug_id)?;
        Ok(recommended_daily_dose(&patient, &drug))
    }

    /// Create an as-needed (PN) prescription.
    ///
    /// The per-administration amount is checked against the daily
    /// recommended ceiling. A patient could in principle receive several PN
    /// doses in one day; the cumulative daily intake is not capped here.
    pub fn create_pn(
        &mut self,
        patient_id: Uuid,
        drug_id: Uuid,
        units_per_dose: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Prescription> {
        let (patient, drug) = self.resolve(patient_id, drug_id)?;

        if units_per_dose < 0.0 {
            return Err(Error::InvalidAmount(
                "the dose amount must not be negative".into(),
            ));
        }

        if units_per_dose == 0.0 {
            return Err(Error::InvalidAmount("the dose amount must not be zero".into()));
        }

        let ceiling = recommended_daily_dose(&patient, &drug);
        if units_per_dose > ceiling {
            return Err(Error::ExceedsRecommendedDose {
                dose: units_per_dose,
                ceiling,
            });
        }

        if start_date > end_date {
            return Err(Error::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        // Unreachable once the zero check above has run; kept so a zero
        // amount on a single-day window is still rejected if the ordering
        // of the checks ever changes.
        if start_date == end_date && units_per_dose == 0.0 {
            return Err(Error::InvalidAmount(
                "no doses possible for this window".into(),
            ));
        }

        let prescription = Prescription {
            id: Uuid::new_v4(),
            drug_id,
            start_date,
            end_date,
            schedule: Schedule::Pn {
                units_per_dose,
                administered: BTreeSet::new(),
            },
        };

        self.attach_and_save(patient, prescription, &drug)
    }

    /// Create a fixed-daily prescription with one amount per time slot.
    pub fn create_fixed_daily(
        &mut self,
        patient_id: Uuid,
        drug_id: Uuid,
        morning: f64,
        noon: f64,
        evening: f64,
        night: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Prescription> {
        let (patient, drug) = self.resolve(patient_id, drug_id)?;

        if morning < 0.0 || noon < 0.0 || evening < 0.0 || night < 0.0 {
            return Err(Error::InvalidAmount(
                "a dose amount must not be negative".into(),
            ));
        }

        if morning == 0.0 && noon == 0.0 && evening == 0.0 && night == 0.0 {
            return Err(Error::InvalidAmount(
                "the combined daily amount must not be zero".into(),
            ));
        }

        let ceiling = recommended_daily_dose(&patient, &drug);
        let combined = morning + noon + evening + night;
        if combined > ceiling {
            return Err(Error::ExceedsRecommendedDose {
                dose: combined,
                ceiling,
            });
        }

        // No window ordering check for this variant.

        let prescription = Prescription {
            id: Uuid::new_v4(),
            drug_id,
            start_date,
            end_date,
            schedule: Schedule::FixedDaily {
                morning,
                noon,
                evening,
                night,
            },
        };

        self.attach_and_save(patient, prescription, &drug)
    }

    /// Create a variable-daily prescription from a set of per-time doses.
    ///
    /// Doses are stored sorted ascending by time of day. This variant is
    /// never checked against the recommended daily ceiling.
    pub fn create_variable_daily(
        &mut self,
        patient_id: Uuid,
        drug_id: Uuid,
        doses: Vec<Dose>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Prescription> {
        let (patient, drug) = self.resolve(patient_id, drug_id)?;

        if let Some(dose) = doses.iter().find(|d| d.amount < 0.0) {
            return Err(Error::InvalidAmount(format!(
                "the dose amount at {} must not be negative",
                dose.time
            )));
        }

        // Dose times may come from untrusted input; checked explicitly even
        // though a NaiveTime can't actually hold an out-of-range value.
        for dose in &doses {
            if dose.time.hour() > 23 || dose.time.minute() > 59 || dose.time.second() > 59 {
                return Err(Error::InvalidTimeOfDay(dose.time.to_string()));
            }
        }

        if start_date > end_date {
            return Err(Error::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let mut seen = HashSet::new();
        for dose in &doses {
            if !seen.insert(dose.time) {
                return Err(Error::DuplicateDoseTime(dose.time));
            }
        }

        let mut doses = doses;
        doses.sort_by_key(|d| d.time);

        let prescription = Prescription {
            id: Uuid::new_v4(),
            drug_id,
            start_date,
            end_date,
            schedule: Schedule::VariableDaily { doses },
        };

        self.attach_and_save(patient, prescription, &drug)
    }

    /// Record an administration of a PN prescription on a calendar date.
    ///
    /// Out-of-range and already-recorded are normal outcomes, not errors,
    /// and leave the administered set untouched. Repeating the same call can
    /// never double-add a date.
    pub fn record_administration(
        &mut self,
        prescription_id: Uuid,
        date: NaiveDate,
    ) -> Result<AdministrationOutcome> {
        let mut prescription = self.store.find_prescription(prescription_id)?;

        if prescription.kind() != PrescriptionKind::Pn {
            return Err(Error::NotFound {
                entity: "PN prescription",
                id: prescription_id,
            });
        }

        if date < prescription.start_date || date > prescription.end_date {
            tracing::info!(
                "Administration on {} is outside {}..{} for prescription {}",
                date,
                prescription.start_date,
                prescription.end_date,
                prescription_id
            );
            return Ok(AdministrationOutcome::OutOfRange);
        }

        if let Schedule::Pn {
            ref mut administered,
            ..
        } = prescription.schedule
        {
            if !administered.insert(date) {
                return Ok(AdministrationOutcome::AlreadyRecorded);
            }
        }

        self.store.save_prescription(prescription)?;
        tracing::info!(
            "Recorded administration on {} for prescription {}",
            date,
            prescription_id
        );
        Ok(AdministrationOutcome::Recorded)
    }

    fn resolve(&self, patient_id: Uuid, drug_id: Uuid) -> Result<(Patient, Drug)> {
        let patient = self.store.find_patient(patient_id)?;
        let drug = self.store.find_drug(drug_id)?;
        Ok((patient, drug))
    }

    fn attach_and_save(
        &mut self,
        mut patient: Patient,
        prescription: Prescription,
        drug: &Drug,
    ) -> Result<Prescription> {
        patient.prescriptions.push(prescription.id);

        self.store.save_prescription(prescription.clone())?;
        self.store.save_patient(patient)?;

        tracing::info!(
            "Created {} prescription {} for drug {}",
            prescription.kind(),
            prescription.id,
            drug.name
        );
        Ok(prescription)
    }
}
