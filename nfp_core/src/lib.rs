#![forbid(unsafe_code)]

//! Rule engine for the sympto-thermal method of natural family planning.
//!
//! This crate provides:
//! - Domain types (daily observations, cycles, calibration profile)
//! - Observation accessors
//! - Temperature shift and mucus peak evaluation
//! - Cycle start (pre-ovulatory infertile window) resolution
//! - The fertility status engine with its evidence trail
//! - Bilingual message catalog, configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod observations;
pub mod messages;
pub mod evidence;
pub mod temperature;
pub mod mucus;
pub mod cycle_start;
pub mod engine;
pub mod cache;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use messages::{Bilingual, Locale, MessageKey};
pub use evidence::{DataPoint, DataValue, RuleId, RuleReference};
pub use temperature::{evaluate_temperature_shift, TemperatureEvaluation, TemperatureException};
pub use mucus::{evaluate_mucus_shift, MucusEvaluation};
pub use cycle_start::{resolve_cycle_start, CycleStartResult, StartRule};
pub use engine::{
    evaluate_fertility_status, CycleMarkers, FertilityEngine, FertilityPhase, FertilityStatus,
    StatusKind,
};
pub use cache::StatusCache;
