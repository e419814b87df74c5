use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use ordination_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ordination")]
#[command(about = "Medication prescription tracking and dose safety", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List patients and their prescription counts
    Patients,

    /// List drugs and their per-kilogram dosing coefficients
    Drugs,

    /// List prescriptions with computed daily and cumulative doses
    List {
        /// Filter by kind (pn, fixed, variable)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Create an as-needed (PN) prescription
    CreatePn {
        /// Patient SSN
        #[arg(long)]
        patient: String,

        /// Drug name
        #[arg(long)]
        drug: String,

        /// Amount per administration
        #[arg(long)]
        amount: f64,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,
    },

    /// Create a fixed daily prescription
    CreateFixed {
        /// Patient SSN
        #[arg(long)]
        patient: String,

        /// Drug name
        #[arg(long)]
        drug: String,

        #[arg(long)]
        morning: f64,

        #[arg(long)]
        noon: f64,

        #[arg(long)]
        evening: f64,

        #[arg(long)]
        night: f64,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,
    },

    /// Create a variable daily prescription
    CreateVariable {
        /// Patient SSN
        #[arg(long)]
        patient: String,

        /// Drug name
        #[arg(long)]
        drug: String,

        /// Dose as HH:MM=amount (repeatable)
        #[arg(long = "dose", required = true)]
        doses: Vec<String>,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,
    },

    /// Record a PN administration on a date
    Give {
        /// Prescription id
        #[arg(long)]
        prescription: Uuid,

        #[arg(long)]
        date: NaiveDate,
    },

    /// Show the recommended daily dose for a patient and drug
    Recommended {
        /// Patient SSN
        #[arg(long)]
        patient: String,

        /// Drug name
        #[arg(long)]
        drug: String,
    },

    /// Export the prescription overview to a CSV file
    Export {
        /// Filter by kind (pn, fixed, variable)
        #[arg(long)]
        kind: Option<String>,

        path: PathBuf,
    },
}

fn main() -> Result<()> {
    ordination_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let registry_path = data_dir.join("registry.json");
    tracing::debug!("Using registry at {:?}", registry_path);

    let mut registry = Registry::load(&registry_path)?;
    if seed(&mut registry) {
        registry.save(&registry_path)?;
    }

    match cli.command {
        Commands::Patients => cmd_patients(&registry),
        Commands::Drugs => cmd_drugs(&registry),
        Commands::List { kind } => cmd_list(&registry, kind),
        Commands::CreatePn {
            patient,
            drug,
            amount,
            start,
            end,
        } => {
            let (patient_id, drug_id) = resolve(&registry, &patient, &drug)?;
            let mut service = OrdinationService::new(registry);
            let created = service.create_pn(patient_id, drug_id, amount, start, end)?;
            service.into_store().save(&registry_path)?;
            println!("Created pn prescription {}", created.id);
            Ok(())
        }
        Commands::CreateFixed {
            patient,
            drug,
            morning,
            noon,
            evening,
            night,
            start,
            end,
        } => {
            let (patient_id, drug_id) = resolve(&registry, &patient, &drug)?;
            let mut service = OrdinationService::new(registry);
            let created = service.create_fixed_daily(
                patient_id, drug_id, morning, noon, evening, night, start, end,
            )?;
            service.into_store().save(&registry_path)?;
            println!("Created fixed_daily prescription {}", created.id);
            Ok(())
        }
        Commands::CreateVariable {
            patient,
            drug,
            doses,
            start,
            end,
        } => {
            let (patient_id, drug_id) = resolve(&registry, &patient, &drug)?;
            let doses = doses
                .iter()
                .map(|s| parse_dose(s))
                .collect::<Result<Vec<_>>>()?;
            let mut service = OrdinationService::new(registry);
            let created = service.create_variable_daily(patient_id, drug_id, doses, start, end)?;
            service.into_store().save(&registry_path)?;
            println!("Created variable_daily prescription {}", created.id);
            Ok(())
        }
        Commands::Give { prescription, date } => {
            let mut service = OrdinationService::new(registry);
            let outcome = service.record_administration(prescription, date)?;
            if outcome == AdministrationOutcome::Recorded {
                service.into_store().save(&registry_path)?;
            }
            println!("{}", outcome);
            Ok(())
        }
        Commands::Recommended { patient, drug } => {
            let (patient_id, drug_id) = resolve(&registry, &patient, &drug)?;
            let service = OrdinationService::new(registry);
            let dose = service.recommended_daily_dose(patient_id, drug_id)?;
            let unit = service.store().find_drug(drug_id)?.unit;
            println!("Recommended daily dose: {:.2} {}", dose, unit);
            Ok(())
        }
        Commands::Export { kind, path } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let count = write_prescription_report(&registry, kind, &path)?;
            println!("Wrote {} prescription rows to {}", count, path.display());
            Ok(())
        }
    }
}

fn cmd_patients(registry: &Registry) -> Result<()> {
    for patient in &registry.patients {
        println!(
            "{}  {}  {} kg  ({} prescriptions)",
            patient.ssn,
            patient.name,
            patient.weight_kg,
            patient.prescriptions.len()
        );
    }
    Ok(())
}

fn cmd_drugs(registry: &Registry) -> Result<()> {
    for drug in &registry.drugs {
        println!(
            "{} [{}]  per kg/day: {} light, {} normal, {} heavy",
            drug.name, drug.unit, drug.per_kg_light, drug.per_kg_normal, drug.per_kg_heavy
        );
    }
    Ok(())
}

fn cmd_list(registry: &Registry, kind: Option<String>) -> Result<()> {
    let kind = kind.as_deref().map(parse_kind).transpose()?;
    for prescription in registry.prescriptions_by_kind(kind) {
        let drug = registry.find_drug(prescription.drug_id)?;
        let daily = prescription
            .daily_dose()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{}  {}  {}  {}..{}  daily={} total={}",
            prescription.id,
            prescription.kind(),
            drug.name,
            prescription.start_date,
            prescription.end_date,
            daily,
            prescription.total_dose()
        );
    }
    Ok(())
}

fn resolve(registry: &Registry, ssn: &str, drug_name: &str) -> Result<(Uuid, Uuid)> {
    let patient = registry
        .patients
        .iter()
        .find(|p| p.ssn == ssn)
        .ok_or_else(|| Error::Store(format!("no patient with SSN {}", ssn)))?;
    let drug = registry
        .drugs
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(drug_name))
        .ok_or_else(|| Error::Store(format!("no drug named {}", drug_name)))?;
    Ok((patient.id, drug.id))
}

fn parse_kind(s: &str) -> Result<PrescriptionKind> {
    match s.to_lowercase().as_str() {
        "pn" => Ok(PrescriptionKind::Pn),
        "fixed" | "fixed_daily" => Ok(PrescriptionKind::FixedDaily),
        "variable" | "variable_daily" => Ok(PrescriptionKind::VariableDaily),
        other => Err(Error::Store(format!(
            "unknown prescription kind: {} (expected pn, fixed or variable)",
            other
        ))),
    }
}

fn parse_dose(s: &str) -> Result<Dose> {
    let (time_part, amount_part) = s
        .split_once('=')
        .ok_or_else(|| Error::Store(format!("dose {} is not of the form HH:MM=amount", s)))?;

    let time = NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .map_err(|_| Error::InvalidTimeOfDay(time_part.to_string()))?;

    let amount: f64 = amount_part
        .parse()
        .map_err(|_| Error::InvalidAmount(format!("{} is not a number", amount_part)))?;

    Ok(Dose::new(time, amount))
}
