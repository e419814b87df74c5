//! Error types for the ordination_core library.

use chrono::{NaiveDate, NaiveTime};
use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ordination_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced entity does not exist in the store
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// A dose amount is negative or zero where that is disallowed
    #[error("invalid dose amount: {0}")]
    InvalidAmount(String),

    /// A proposed dose exceeds the recommended daily dose for the patient
    #[error("dose {dose} exceeds the recommended daily dose of {ceiling}")]
    ExceedsRecommendedDose { dose: f64, ceiling: f64 },

    /// The validity window is inverted
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Two doses in one prescription share a time of day
    #[error("two doses share the time of day {0}")]
    DuplicateDoseTime(NaiveTime),

    /// A dose time of day is outside the 24h/60m/60s range
    #[error("invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry/store-level failure, propagated unchanged
    #[error("Store error: {0}")]
    Store(String),
}
