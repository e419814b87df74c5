//! CSV export of the prescription overview.
//!
//! One row per prescription with its owner, drug, validity window and the
//! computed daily/cumulative doses. Used by the CLI `export` command.

use crate::{Prescription, PrescriptionKind, Result, Store};
use std::collections::HashMap;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    kind: String,
    patient: String,
    drug: String,
    unit: String,
    start_date: String,
    end_date: String,
    daily_dose: Option<f64>,
    total_dose: f64,
}

/// Write the prescription overview to a CSV file, overwriting any previous
/// export. Returns the number of rows written.
pub fn write_prescription_report<S: Store>(
    store: &S,
    kind: Option<PrescriptionKind>,
    csv_path: &Path,
) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let owners: HashMap<_, _> = store
        .patients()
        .iter()
        .flat_map(|p| {
            p.prescriptions
                .iter()
                .map(|id| (*id, p.name.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    let drugs: HashMap<_, _> = store
        .drugs()
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    let prescriptions = store.prescriptions_by_kind(kind);
    let mut writer = csv::Writer::from_path(csv_path)?;
    for prescription in &prescriptions {
        writer.serialize(row_for(prescription, &owners, &drugs))?;
    }
    writer.flush()?;

    tracing::info!(
        "Wrote {} prescription rows to {:?}",
        prescriptions.len(),
        csv_path
    );
    Ok(prescriptions.len())
}

fn row_for(
    prescription: &Prescription,
    owners: &HashMap<uuid::Uuid, String>,
    drugs: &HashMap<uuid::Uuid, crate::Drug>,
) -> CsvRow {
    let drug = drugs.get(&prescription.drug_id);
    CsvRow {
        id: prescription.id.to_string(),
        kind: prescription.kind().to_string(),
        patient: owners
            .get(&prescription.id)
            .cloned()
            .unwrap_or_default(),
        drug: drug.map(|d| d.name.clone()).unwrap_or_default(),
        unit: drug.map(|d| d.unit.clone()).unwrap_or_default(),
        start_date: prescription.start_date.to_string(),
        end_date: prescription.end_date.to_string(),
        daily_dose: prescription.daily_dose(),
        total_dose: prescription.total_dose(),
    }
}
