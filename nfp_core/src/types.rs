//! Core domain types for the sympto-thermal fertility engine.
//!
//! This module defines the inputs the engine consumes:
//! - Daily observations (temperature, cervical mucus, bleeding, cervix)
//! - The cycle record
//! - The user's calibration profile
//!
//! All of these are owned and persisted by the caller; the engine only reads them.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Number of past cycles kept in the calibration history
pub const CALIBRATION_HISTORY_LEN: usize = 12;

// ============================================================================
// Observation Types
// ============================================================================

/// Cervical mucus category, ordered from least to most fertile
///
/// `d < ø < m < S < S+`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MucusCategory {
    /// `d`: dry, rough or itchy sensation
    Dry,
    /// `ø`: nothing felt, nothing seen
    Nothing,
    /// `m`: moist, nothing seen
    Moist,
    /// `S`: thick, creamy, whitish or sticky
    Fertile,
    /// `S+`: transparent, stretchy, slippery
    HighlyFertile,
}

impl MucusCategory {
    /// Position in the protocol's quality order
    pub fn rank(self) -> u8 {
        match self {
            MucusCategory::Dry => 0,
            MucusCategory::Nothing => 1,
            MucusCategory::Moist => 2,
            MucusCategory::Fertile => 3,
            MucusCategory::HighlyFertile => 4,
        }
    }

    /// Compare two categories by mucus quality
    pub fn compare_quality(self, other: MucusCategory) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    /// Whether this category ends the pre-ovulatory infertile window
    ///
    /// `d` and `ø` are both treated as dry; anything from `m` upwards counts.
    pub fn indicates_fertility(self) -> bool {
        self.rank() >= MucusCategory::Moist.rank()
    }

    /// Short chart symbol
    pub fn symbol(self) -> &'static str {
        match self {
            MucusCategory::Dry => "d",
            MucusCategory::Nothing => "ø",
            MucusCategory::Moist => "m",
            MucusCategory::Fertile => "S",
            MucusCategory::HighlyFertile => "S+",
        }
    }
}

impl PartialOrd for MucusCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MucusCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_quality(*other)
    }
}

impl std::fmt::Display for MucusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How the basal body temperature was taken
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureMethod {
    #[default]
    Oral,
    Vaginal,
    Rectal,
}

/// Bleeding intensity, 0 (spotting) to 3 (heavy)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BleedingIntensity {
    Spotting,
    Light,
    Medium,
    Heavy,
}

impl BleedingIntensity {
    /// Build from the 0-3 scale used by chart exports
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(BleedingIntensity::Spotting),
            1 => Some(BleedingIntensity::Light),
            2 => Some(BleedingIntensity::Medium),
            3 => Some(BleedingIntensity::Heavy),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            BleedingIntensity::Spotting => 0,
            BleedingIntensity::Light => 1,
            BleedingIntensity::Medium => 2,
            BleedingIntensity::Heavy => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CervixFirmness {
    Hard,
    Soft,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CervixOpening {
    Closed,
    Medium,
    Open,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CervixPosition {
    Low,
    Medium,
    High,
}

/// Self-examination of the cervix
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct CervixSign {
    pub firmness: Option<CervixFirmness>,
    pub opening: Option<CervixOpening>,
    pub position: Option<CervixPosition>,
}

impl CervixSign {
    /// Soft, opening or raised cervix
    pub fn indicates_fertility(&self) -> bool {
        matches!(self.firmness, Some(CervixFirmness::Soft))
            || matches!(
                self.opening,
                Some(CervixOpening::Medium) | Some(CervixOpening::Open)
            )
            || matches!(
                self.position,
                Some(CervixPosition::Medium) | Some(CervixPosition::High)
            )
    }
}

/// One charted day of a cycle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    /// 1-indexed, unique within a cycle
    pub cycle_day: u32,
    /// Degrees Celsius
    pub temperature: Option<f64>,
    pub temperature_time: Option<NaiveTime>,
    pub temperature_method: Option<TemperatureMethod>,
    /// Free-text disturbance (late night, illness, travel, ...)
    pub disturbance: Option<String>,
    /// Excluded readings never take part in shift detection
    #[serde(default)]
    pub temperature_excluded: bool,
    pub mucus: Option<MucusCategory>,
    pub bleeding: Option<BleedingIntensity>,
    pub cervix: Option<CervixSign>,
    pub note: Option<String>,
}

impl DailyObservation {
    /// An empty observation for the given day
    pub fn new(date: NaiveDate, cycle_day: u32) -> Self {
        Self {
            date,
            cycle_day,
            temperature: None,
            temperature_time: None,
            temperature_method: None,
            disturbance: None,
            temperature_excluded: false,
            mucus: None,
            bleeding: None,
            cervix: None,
            note: None,
        }
    }

    pub fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn with_mucus(mut self, mucus: MucusCategory) -> Self {
        self.mucus = Some(mucus);
        self
    }

    pub fn with_bleeding(mut self, bleeding: BleedingIntensity) -> Self {
        self.bleeding = Some(bleeding);
        self
    }

    pub fn with_cervix(mut self, cervix: CervixSign) -> Self {
        self.cervix = Some(cervix);
        self
    }

    pub fn with_method(mut self, method: TemperatureMethod) -> Self {
        self.temperature_method = Some(method);
        self
    }

    pub fn with_disturbance(mut self, note: impl Into<String>) -> Self {
        self.disturbance = Some(note.into());
        self
    }

    pub fn excluded(mut self) -> Self {
        self.temperature_excluded = true;
        self
    }

    /// Temperature that may take part in shift detection
    pub fn valid_temperature(&self) -> Option<f64> {
        if self.temperature_excluded {
            None
        } else {
            self.temperature
        }
    }
}

// ============================================================================
// Cycle and Profile Types
// ============================================================================

/// A menstrual cycle record as stored by the caller
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Cycle {
    pub id: Uuid,
    pub sequence: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Identifier of the start rule adopted the last time this cycle was evaluated
    pub start_rule: Option<String>,
    pub last_infertile_day: Option<u32>,
    /// Peak day reported by an earlier evaluation, if any
    pub peak_day: Option<u32>,
    pub first_higher_temp_day: Option<u32>,
}

impl Cycle {
    pub fn new(sequence: u32, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            start_date,
            end_date: None,
            start_rule: None,
            last_infertile_day: None,
            peak_day: None,
            first_higher_temp_day: None,
        }
    }

    /// Cycle day (1-indexed) of a calendar date
    pub fn day_of(&self, date: NaiveDate) -> Option<u32> {
        let offset = (date - self.start_date).num_days();
        u32::try_from(offset + 1).ok().filter(|d| *d >= 1)
    }

    /// Length in days, once the cycle has ended
    ///
    /// The end date is the last day of the cycle (the day before the next
    /// bleeding starts).
    pub fn length(&self) -> Option<u32> {
        self.end_date.and_then(|end| self.day_of(end))
    }
}

/// Per-user calibration carried across cycles
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct UserCalibrationProfile {
    /// Earliest first-higher-temperature day per past cycle, most recent last
    #[serde(default)]
    pub earliest_elevation_days: Vec<u32>,
    #[serde(default)]
    pub total_cycles: u32,
    pub shortest_cycle_length: Option<u32>,
    #[serde(default)]
    pub preferred_method: TemperatureMethod,
    /// Use cervix signs in addition to mucus when judging fertility
    #[serde(default)]
    pub prefers_cervix: bool,
}

impl UserCalibrationProfile {
    /// Earliest first-higher-temperature day across the history
    pub fn earliest_elevation_day(&self) -> Option<u32> {
        self.earliest_elevation_days.iter().copied().min()
    }

    /// Fold a finished cycle into the profile
    ///
    /// Keeps the most recent `CALIBRATION_HISTORY_LEN` elevation days. Called by
    /// the caller once a cycle closes; evaluation itself never mutates the profile.
    pub fn record_completed_cycle(
        &mut self,
        first_higher_temp_day: Option<u32>,
        cycle_length: Option<u32>,
    ) {
        if let Some(day) = first_higher_temp_day {
            self.earliest_elevation_days.push(day);
            if self.earliest_elevation_days.len() > CALIBRATION_HISTORY_LEN {
                let overflow = self.earliest_elevation_days.len() - CALIBRATION_HISTORY_LEN;
                self.earliest_elevation_days.drain(..overflow);
            }
        }

        if let Some(length) = cycle_length {
            self.shortest_cycle_length = Some(match self.shortest_cycle_length {
                Some(shortest) => shortest.min(length),
                None => length,
            });
        }

        self.total_cycles += 1;

        tracing::debug!(
            "Calibration profile updated: {} cycles, {} elevation entries, shortest {:?}",
            self.total_cycles,
            self.earliest_elevation_days.len(),
            self.shortest_cycle_length
        );
    }
}
