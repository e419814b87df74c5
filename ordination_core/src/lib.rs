#![forbid(unsafe_code)]

//! Core domain model and dose-validation engine for the Ordination system.
//!
//! This crate provides:
//! - Domain types (patients, drugs, prescriptions, doses)
//! - The dosage rule engine (weight-tiered recommended daily dose)
//! - The prescription factory/validator service
//! - PN administration recording
//! - The persistence collaborator contract and a file-backed registry
//! - Seed data and CSV reporting

pub mod types;
pub mod error;
pub mod rules;
pub mod store;
pub mod service;
pub mod seed;
pub mod report;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use rules::{recommended_daily_dose, WeightTier};
pub use store::{Registry, Store};
pub use service::OrdinationService;
pub use seed::seed;
pub use report::write_prescription_report;
pub use config::Config;
