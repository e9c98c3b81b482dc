//! Temperature shift evaluation.
//!
//! Slides a baseline window of six consecutive valid readings over the cycle.
//! The coverline is the highest baseline reading; the readings right after the
//! window are checked against it:
//!
//! 1. **Main rule**: three readings above the coverline, the third at least
//!    0.2 degrees above it.
//! 2. **First exception**: the third reading misses the 0.2 margin, so a fourth
//!    reading above the coverline is required.
//! 3. **Second exception**: one of the three readings drops to or below the
//!    coverline; it is ignored, but the third reading must reach the 0.2 margin.
//!
//! Windows are scanned in increasing day order and the first match wins.

use crate::config::TemperatureConfig;
use crate::observations::{valid_temperatures, TemperatureReading};
use crate::DailyObservation;
use serde::{Deserialize, Serialize};

/// Tolerance for comparing readings recorded to two decimals
const EPSILON: f64 = 1e-6;

/// Which relaxation of the main rule completed the shift
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureException {
    #[default]
    None,
    First,
    Second,
}

/// Result of a temperature shift evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct TemperatureEvaluation {
    pub is_shift_complete: bool,
    pub cover_line_temp: Option<f64>,
    /// Days of the higher readings that completed the shift, in order
    pub elevated_days: Vec<u32>,
    /// Days of the six readings the coverline was taken from
    pub baseline_days: Vec<u32>,
    pub exception_used: TemperatureException,
    pub cannot_evaluate: bool,
    pub reason: Option<String>,
}

impl TemperatureEvaluation {
    /// First higher temperature day
    pub fn first_higher_day(&self) -> Option<u32> {
        self.elevated_days.first().copied()
    }

    /// Day the shift was completed (third reading, or fourth under the first exception)
    pub fn completion_day(&self) -> Option<u32> {
        if self.is_shift_complete {
            self.elevated_days.last().copied()
        } else {
            None
        }
    }

    fn insufficient(available: usize, required: usize) -> Self {
        Self {
            cannot_evaluate: true,
            reason: Some(format!(
                "{} valid temperature readings, at least {} required",
                available, required
            )),
            ..Default::default()
        }
    }
}

/// A window that satisfied one of the rules
#[derive(Clone, Debug, PartialEq)]
struct WindowMatch {
    exception: TemperatureException,
    elevated_days: Vec<u32>,
}

/// Evaluate the temperature shift for one cycle
pub fn evaluate_temperature_shift(
    observations: &[DailyObservation],
    config: &TemperatureConfig,
) -> TemperatureEvaluation {
    evaluate_readings(&valid_temperatures(observations), config)
}

/// Evaluate an already filtered, day-sorted reading sequence
pub fn evaluate_readings(
    readings: &[TemperatureReading],
    config: &TemperatureConfig,
) -> TemperatureEvaluation {
    let baseline_len = config.baseline_readings;
    let elevated_len = config.elevated_readings;
    let required = baseline_len + elevated_len;

    if readings.len() < required {
        tracing::debug!(
            "Temperature shift cannot be evaluated: {} of {} readings",
            readings.len(),
            required
        );
        return TemperatureEvaluation::insufficient(readings.len(), required);
    }

    // Order matters: the earliest qualifying window wins.
    for end in baseline_len..=(readings.len() - elevated_len) {
        let baseline = &readings[end - baseline_len..end];
        let cover_line = cover_line(baseline);
        let candidates = &readings[end..end + elevated_len];
        let fourth = readings.get(end + elevated_len);

        let found = classify_window(cover_line, candidates, fourth, config.elevation_threshold);
        if let Some(found) = found {
            tracing::debug!(
                "Temperature shift found: coverline {:.2}, days {:?}, exception {:?}",
                cover_line,
                found.elevated_days,
                found.exception
            );
            return TemperatureEvaluation {
                is_shift_complete: true,
                cover_line_temp: Some(cover_line),
                elevated_days: found.elevated_days,
                baseline_days: baseline.iter().map(|r| r.cycle_day).collect(),
                exception_used: found.exception,
                cannot_evaluate: false,
                reason: None,
            };
        }
    }

    tracing::debug!("No temperature shift among {} readings", readings.len());
    TemperatureEvaluation {
        reason: Some("no window of higher readings above a coverline".to_string()),
        ..Default::default()
    }
}

fn cover_line(baseline: &[TemperatureReading]) -> f64 {
    baseline
        .iter()
        .map(|r| r.value)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Try the rules in fixed priority order
fn classify_window(
    cover_line: f64,
    candidates: &[TemperatureReading],
    fourth: Option<&TemperatureReading>,
    threshold: f64,
) -> Option<WindowMatch> {
    main_rule(cover_line, candidates, threshold)
        .or_else(|| first_exception(cover_line, candidates, fourth, threshold))
        .or_else(|| second_exception(cover_line, candidates, threshold))
}

fn above(value: f64, cover_line: f64) -> bool {
    value - cover_line > EPSILON
}

fn reaches_margin(value: f64, cover_line: f64, threshold: f64) -> bool {
    value >= cover_line + threshold - EPSILON
}

fn days(readings: &[TemperatureReading]) -> Vec<u32> {
    readings.iter().map(|r| r.cycle_day).collect()
}

fn main_rule(
    cover_line: f64,
    candidates: &[TemperatureReading],
    threshold: f64,
) -> Option<WindowMatch> {
    let last = candidates.last()?;
    let all_above = candidates.iter().all(|r| above(r.value, cover_line));

    (all_above && reaches_margin(last.value, cover_line, threshold)).then(|| WindowMatch {
        exception: TemperatureException::None,
        elevated_days: days(candidates),
    })
}

fn first_exception(
    cover_line: f64,
    candidates: &[TemperatureReading],
    fourth: Option<&TemperatureReading>,
    threshold: f64,
) -> Option<WindowMatch> {
    let last = candidates.last()?;
    let fourth = fourth?;
    let all_above = candidates.iter().all(|r| above(r.value, cover_line));

    if !all_above || reaches_margin(last.value, cover_line, threshold) {
        return None;
    }

    above(fourth.value, cover_line).then(|| {
        let mut elevated_days = days(candidates);
        elevated_days.push(fourth.cycle_day);
        WindowMatch {
            exception: TemperatureException::First,
            elevated_days,
        }
    })
}

fn second_exception(
    cover_line: f64,
    candidates: &[TemperatureReading],
    threshold: f64,
) -> Option<WindowMatch> {
    let last = candidates.last()?;
    let dips = candidates
        .iter()
        .filter(|r| !above(r.value, cover_line))
        .count();

    if dips != 1 || !reaches_margin(last.value, cover_line, threshold) {
        return None;
    }

    Some(WindowMatch {
        exception: TemperatureException::Second,
        elevated_days: candidates
            .iter()
            .filter(|r| above(r.value, cover_line))
            .map(|r| r.cycle_day)
            .collect(),
    })
}
