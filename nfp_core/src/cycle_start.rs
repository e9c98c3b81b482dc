//! Resolution of the infertile days at the start of a cycle.
//!
//! Three strategies, tried in priority order:
//!
//! 1. **Minus-8**: earliest first-higher-temperature day of the past cycles
//!    minus 8. Used once 12 cycles are recorded, or earlier if any past cycle
//!    had its first higher reading on day 12 or before.
//! 2. **Five-Day**: the first five days, cut short by an earlier mucus sign.
//! 3. **Minus-20**: shortest known cycle minus 20, adopted only when it gives
//!    a later day than the Five-Day rule.
//!
//! Whatever the strategy, a fertile sign on or before the resulting day moves
//! the last infertile day to the day before that sign.

use crate::config::CycleStartConfig;
use crate::observations::first_fertile_sign_day;
use crate::{DailyObservation, UserCalibrationProfile};
use serde::{Deserialize, Serialize};

/// Strategy that bounded the pre-ovulatory infertile window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StartRule {
    FiveDay,
    MinusEight,
    MinusTwenty,
}

impl StartRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartRule::FiveDay => "five_day",
            StartRule::MinusEight => "minus_8",
            StartRule::MinusTwenty => "minus_20",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StartRule::FiveDay => "5-day",
            StartRule::MinusEight => "minus-8",
            StartRule::MinusTwenty => "minus-20",
        }
    }
}

impl std::fmt::Display for StartRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved start of the fertile window
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleStartResult {
    pub rule: StartRule,
    pub last_infertile_day: u32,
    pub fertility_starts_day: u32,
    /// Last infertile day the rule gives before any fertile sign shortens it
    pub rule_last_infertile_day: u32,
    /// Day of the fertile sign that shortened the window, if any
    pub mucus_override_day: Option<u32>,
    /// Five-Day rule used after its calibration period without Minus-8 data
    pub five_day_rule_expired: bool,
}

/// Resolve the last infertile day for the current cycle
pub fn resolve_cycle_start(
    observations: &[DailyObservation],
    profile: &UserCalibrationProfile,
    config: &CycleStartConfig,
) -> CycleStartResult {
    let first_sign = first_fertile_sign_day(observations, profile);

    let (rule, computed) = match minus_eight_rule(profile, config) {
        Some(day) => (StartRule::MinusEight, day),
        None => {
            let five_day = five_day_rule(first_sign, config);
            match minus_twenty_rule(profile, config) {
                Some(day) if day > five_day => (StartRule::MinusTwenty, day),
                _ => (StartRule::FiveDay, five_day),
            }
        }
    };

    let last_infertile_day = apply_mucus_override(computed, first_sign);

    // Five-Day already folds an early sign in; report it against the uncut five days.
    let rule_last_infertile_day = match rule {
        StartRule::FiveDay => config.five_day_default,
        _ => computed,
    };
    let mucus_override_day = first_sign.filter(|day| *day <= rule_last_infertile_day);

    let five_day_rule_expired =
        rule == StartRule::FiveDay && !five_day_rule_still_applies(profile, config);

    tracing::debug!(
        "Cycle start: {} rule gives day {}, last infertile day {} (override {:?})",
        rule,
        computed,
        last_infertile_day,
        mucus_override_day
    );

    CycleStartResult {
        rule,
        last_infertile_day,
        fertility_starts_day: last_infertile_day + 1,
        rule_last_infertile_day,
        mucus_override_day,
        five_day_rule_expired,
    }
}

/// Whether the profile has an elevation day early enough to force Minus-8
pub fn has_early_elevation(profile: &UserCalibrationProfile, config: &CycleStartConfig) -> bool {
    profile
        .earliest_elevation_days
        .iter()
        .any(|day| *day <= config.early_elevation_day)
}

/// Minus-8 trigger: a full history, or any early elevation regardless of cycle count
pub fn minus_eight_applicable(profile: &UserCalibrationProfile, config: &CycleStartConfig) -> bool {
    profile.earliest_elevation_days.len() >= config.calibration_cycles as usize
        || has_early_elevation(profile, config)
}

/// Five-Day eligibility: still calibrating, and no early elevation seen yet
///
/// Gated on the total cycle count, unlike the Minus-8 trigger which counts
/// recorded elevation entries.
pub fn five_day_rule_still_applies(
    profile: &UserCalibrationProfile,
    config: &CycleStartConfig,
) -> bool {
    profile.total_cycles < config.calibration_cycles && !has_early_elevation(profile, config)
}

fn minus_eight_rule(profile: &UserCalibrationProfile, config: &CycleStartConfig) -> Option<u32> {
    if !minus_eight_applicable(profile, config) {
        return None;
    }
    profile
        .earliest_elevation_day()
        .map(|day| day.saturating_sub(config.minus_eight_offset))
}

fn five_day_rule(first_sign: Option<u32>, config: &CycleStartConfig) -> u32 {
    match first_sign {
        Some(day) if day <= config.five_day_default => day.saturating_sub(1),
        _ => config.five_day_default,
    }
}

fn minus_twenty_rule(profile: &UserCalibrationProfile, config: &CycleStartConfig) -> Option<u32> {
    profile
        .shortest_cycle_length
        .map(|length| length.saturating_sub(config.minus_twenty_offset))
}

fn apply_mucus_override(last_infertile_day: u32, first_sign: Option<u32>) -> u32 {
    match first_sign {
        Some(day) if day <= last_infertile_day => day.saturating_sub(1),
        _ => last_infertile_day,
    }
}
