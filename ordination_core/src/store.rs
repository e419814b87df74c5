//! Persistence collaborator contract and the file-backed registry.
//!
//! The core only ever talks to a [`Store`]: fetch a patient or drug by id,
//! persist a new or mutated entity, list prescriptions. [`Registry`] is the
//! bundled implementation, a whole-dataset structure that loads from and
//! saves to a JSON file with file locking so concurrent writers are
//! serialized.

use crate::{Drug, Error, Patient, Prescription, PrescriptionKind, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Persistence collaborator consumed by the service layer.
///
/// Saving is insert-or-replace keyed by id. Listing preserves insertion
/// order. Store-level failures are reported as errors and propagated
/// unchanged; the core never retries.
pub trait Store {
    fn find_patient(&self, id: Uuid) -> Result<Patient>;
    fn find_drug(&self, id: Uuid) -> Result<Drug>;
    fn find_prescription(&self, id: Uuid) -> Result<Prescription>;

    fn save_patient(&mut self, patient: Patient) -> Result<()>;
    fn save_prescription(&mut self, prescription: Prescription) -> Result<()>;

    fn patients(&self) -> Vec<Patient>;
    fn drugs(&self) -> Vec<Drug>;

    /// Prescriptions, optionally filtered by kind, in insertion order.
    fn prescriptions_by_kind(&self, kind: Option<PrescriptionKind>) -> Vec<Prescription>;
}

/// The complete dataset: patients, drugs and prescriptions.
///
/// Doubles as the in-memory store for tests and as the unit of persistence
/// for the CLI.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub drugs: Vec<Drug>,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
}

impl Store for Registry {
    fn find_patient(&self, id: Uuid) -> Result<Patient> {
        self.patients
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(Error::NotFound {
                entity: "patient",
                id,
            })
    }

    fn find_drug(&self, id: Uuid) -> Result<Drug> {
        self.drugs
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(Error::NotFound { entity: "drug", id })
    }

    fn find_prescription(&self, id: Uuid) -> Result<Prescription> {
        self.prescriptions
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(Error::NotFound {
                entity: "prescription",
                id,
            })
    }

    fn save_patient(&mut self, patient: Patient) -> Result<()> {
        match self.patients.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => *existing = patient,
            None => self.patients.push(patient),
        }
        Ok(())
    }

    fn save_prescription(&mut self, prescription: Prescription) -> Result<()> {
        match self
            .prescriptions
            .iter_mut()
            .find(|p| p.id == prescription.id)
        {
            Some(existing) => *existing = prescription,
            None => self.prescriptions.push(prescription),
        }
        Ok(())
    }

    fn patients(&self) -> Vec<Patient> {
        self.patients.clone()
    }

    fn drugs(&self) -> Vec<Drug> {
        self.drugs.clone()
    }

    fn prescriptions_by_kind(&self, kind: Option<PrescriptionKind>) -> Vec<Prescription> {
        self.prescriptions
            .iter()
            .filter(|p| kind.map_or(true, |k| p.kind() == k))
            .cloned()
            .collect()
    }
}

impl Registry {
    /// Load the registry from a file with shared locking.
    ///
    /// Returns an empty registry if the file doesn't exist. A file that
    /// exists but can't be parsed is an error: a prescription dataset is
    /// never silently replaced with an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No registry file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        let registry: Registry = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded registry from {:?} ({} patients, {} drugs, {} prescriptions)",
            path,
            registry.patients.len(),
            registry.drugs.len(),
            registry.prescriptions.len()
        );
        Ok(registry)
    }

    /// Save the registry to a file with exclusive locking.
    ///
    /// Writes to a temp file in the same directory, syncs, then renames over
    /// the original so readers never observe a partial write.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            Error::Store(format!("registry path {:?} has no parent directory", path))
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved registry to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schedule;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pn_prescription(drug_id: Uuid) -> Prescription {
        Prescription {
            id: Uuid::new_v4(),
            drug_id,
            start_date: date(2024, 11, 1),
            end_date: date(2024, 11, 12),
            schedule: Schedule::Pn {
                units_per_dose: 2.0,
                administered: BTreeSet::new(),
            },
        }
    }

    #[test]
    fn test_find_missing_patient_is_not_found() {
        let registry = Registry::default();
        let id = Uuid::new_v4();

        match registry.find_patient(id) {
            Err(Error::NotFound { entity, .. }) => assert_eq!(entity, "patient"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_save_patient_replaces_by_id() {
        let mut registry = Registry::default();
        let mut patient = Patient::new("121256-0512", "Jane Jensen", 63.4);
        let id = patient.id;

        registry.save_patient(patient.clone()).unwrap();
        patient.prescriptions.push(Uuid::new_v4());
        registry.save_patient(patient).unwrap();

        assert_eq!(registry.patients.len(), 1);
        assert_eq!(registry.find_patient(id).unwrap().prescriptions.len(), 1);
    }

    #[test]
    fn test_prescriptions_by_kind_filters_and_keeps_order() {
        let mut registry = Registry::default();
        let drug_id = Uuid::new_v4();

        let first = pn_prescription(drug_id);
        let second = pn_prescription(drug_id);
        let fixed = Prescription {
            id: Uuid::new_v4(),
            drug_id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 11, 12),
            schedule: Schedule::FixedDaily {
                morning: 2.0,
                noon: 0.0,
                evening: 1.0,
                night: 0.0,
            },
        };

        registry.save_prescription(first.clone()).unwrap();
        registry.save_prescription(fixed).unwrap();
        registry.save_prescription(second.clone()).unwrap();

        let pns = registry.prescriptions_by_kind(Some(PrescriptionKind::Pn));
        assert_eq!(pns.len(), 2);
        assert_eq!(pns[0].id, first.id);
        assert_eq!(pns[1].id, second.id);

        assert_eq!(registry.prescriptions_by_kind(None).len(), 3);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("registry.json");

        let mut registry = Registry::default();
        let drug = Drug::new("Paracetamol", 1.0, 1.5, 2.0, "ml");
        let drug_id = drug.id;
        registry.drugs.push(drug);
        registry
            .save_patient(Patient::new("070985-1153", "Finn Madsen", 83.2))
            .unwrap();
        registry.save_prescription(pn_prescription(drug_id)).unwrap();

        registry.save(&path).unwrap();
        let loaded = Registry::load(&path).unwrap();

        assert_eq!(loaded.patients.len(), 1);
        assert_eq!(loaded.drugs.len(), 1);
        assert_eq!(loaded.prescriptions.len(), 1);
        assert_eq!(loaded.drugs[0].name, "Paracetamol");
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let registry = Registry::load(&path).unwrap();
        assert!(registry.patients.is_empty());
        assert!(registry.prescriptions.is_empty());
    }

    #[test]
    fn test_load_corrupted_registry_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("corrupted.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(matches!(Registry::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("registry.json");

        Registry::default().save(&path).unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "registry.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only registry.json, found extras: {:?}",
            extras
        );
    }
}
