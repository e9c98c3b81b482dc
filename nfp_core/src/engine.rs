//! Fertility status engine.
//!
//! This is the single entry point for callers. For one cycle day it:
//! - Checks the cycle length watchdogs
//! - Resolves the infertile days at the start of the cycle
//! - Evaluates temperature and mucus shifts
//! - Combines them with the double check: the post-ovulatory infertile phase
//!   starts when the later of the two evaluations is complete
//!
//! Every call builds its evidence trail from scratch and returns it with the status.

use crate::cycle_start::{resolve_cycle_start, CycleStartResult, StartRule};
use crate::evidence::{DataPoint, RuleId, RuleReference, Trail};
use crate::messages::{self, Bilingual, MessageKey};
use crate::mucus::{count_post_peak, evaluate_mucus_shift, MucusEvaluation};
use crate::observations::{
    indicates_fertility, methods_used, observation_on, valid_mucus, valid_temperatures,
    TemperatureReading,
};
use crate::temperature::{evaluate_readings, TemperatureEvaluation, TemperatureException};
use crate::{Config, Cycle, DailyObservation, Result, UserCalibrationProfile};
use serde::{Deserialize, Serialize};

/// Fertility classification of a day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Fertile,
    Infertile,
    Indeterminate,
}

/// Phase of the cycle the day falls in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FertilityPhase {
    PreOvulation,
    Fertile,
    PostOvulation,
}

/// Markers computed for the cycle, for the caller to persist
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CycleMarkers {
    pub start_rule: Option<StartRule>,
    pub last_infertile_day: Option<u32>,
    pub fertility_starts_day: Option<u32>,
    pub peak_day: Option<u32>,
    pub first_higher_temp_day: Option<u32>,
    pub temperature_complete_day: Option<u32>,
    pub mucus_complete_day: Option<u32>,
    pub fertility_ends_day: Option<u32>,
}

/// Result of evaluating one cycle day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FertilityStatus {
    pub cycle_day: u32,
    pub status: StatusKind,
    pub phase: FertilityPhase,
    /// Rules applied, in the order they were applied
    pub evidence: Vec<RuleReference>,
    /// Facts consulted, in the order they were consulted
    pub data_points: Vec<DataPoint>,
    pub explanation: Bilingual,
    pub warnings: Vec<Bilingual>,
    pub markers: CycleMarkers,
    pub cycle_start: Option<CycleStartResult>,
    pub temperature: Option<TemperatureEvaluation>,
    pub mucus: Option<MucusEvaluation>,
}

impl FertilityStatus {
    pub fn is_fertile(&self) -> bool {
        self.status == StatusKind::Fertile
    }

    /// Pretty JSON for handing the status to other layers
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fertility engine with a fixed rule configuration
#[derive(Clone, Debug, Default)]
pub struct FertilityEngine {
    config: Config,
}

/// Evaluate a cycle day with the default protocol configuration
pub fn evaluate_fertility_status(
    observations: &[DailyObservation],
    cycle_day: u32,
    cycle: &Cycle,
    profile: &UserCalibrationProfile,
) -> FertilityStatus {
    FertilityEngine::default().evaluate(observations, cycle_day, cycle, profile)
}

/// Intermediate decision before the status is assembled
struct Decision {
    status: StatusKind,
    phase: FertilityPhase,
    explanation: Bilingual,
}

impl FertilityEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classify `cycle_day` of `cycle` from its observations
    ///
    /// Pure: equal inputs always give equal results.
    pub fn evaluate(
        &self,
        observations: &[DailyObservation],
        cycle_day: u32,
        cycle: &Cycle,
        profile: &UserCalibrationProfile,
    ) -> FertilityStatus {
        let mut trail = Trail::default();
        let mut markers = CycleMarkers::default();

        self.check_watchdogs(cycle_day, &mut trail);

        if cycle_day == 0 {
            tracing::warn!("Cycle day 0 requested for cycle {}", cycle.sequence);
            let decision = Decision {
                status: StatusKind::Indeterminate,
                phase: FertilityPhase::PreOvulation,
                explanation: messages::render(
                    MessageKey::IndeterminateDay,
                    &[("day", cycle_day.to_string())],
                ),
            };
            return assemble(cycle_day, decision, trail, markers, None, None, None);
        }

        let start = resolve_cycle_start(observations, profile, &self.config.cycle_start);
        record_cycle_start(&start, &mut trail);
        markers.start_rule = Some(start.rule);
        markers.last_infertile_day = Some(start.last_infertile_day);
        markers.fertility_starts_day = Some(start.fertility_starts_day);

        let readings = valid_temperatures(observations);
        self.check_temperature_methods(&readings, profile, &mut trail);

        if cycle_day <= start.rule_last_infertile_day {
            let decision =
                evaluate_pre_ovulation(observations, cycle_day, &start, profile, &mut trail);
            return assemble(cycle_day, decision, trail, markers, Some(start), None, None);
        }

        let temperature = evaluate_readings(&readings, &self.config.temperature);
        record_temperature(&temperature, readings.len(), &mut trail);

        let mucus = evaluate_mucus_shift(observations, &self.config.mucus);
        record_mucus(&mucus, &mut trail);
        let relapsed = self.check_recorded_peak(observations, cycle, &mucus, &mut trail);

        markers.peak_day = mucus.peak_day;
        markers.first_higher_temp_day = temperature.first_higher_day();
        markers.temperature_complete_day = temperature.completion_day();
        if !relapsed {
            markers.mucus_complete_day = mucus.completion_day(self.config.mucus.post_peak_days);
        }

        let decision = combine_shifts(cycle_day, &mut markers, &temperature, &mucus, &mut trail);
        assemble(
            cycle_day,
            decision,
            trail,
            markers,
            Some(start),
            Some(temperature),
            Some(mucus),
        )
    }

    fn check_watchdogs(&self, cycle_day: u32, trail: &mut Trail) {
        let watchdog = &self.config.watchdog;

        if cycle_day > watchdog.amenorrhea_day {
            tracing::warn!("Cycle day {} exceeds amenorrhea threshold", cycle_day);
            trail.rule(RuleId::AmenorrheaWatchdog);
            trail.data("Cycle day", Some(cycle_day), "cycle_day", cycle_day);
            trail.warn(
                MessageKey::Amenorrhea,
                &[("threshold", watchdog.amenorrhea_day.to_string())],
            );
        } else if cycle_day > watchdog.long_cycle_day {
            tracing::warn!("Cycle day {} exceeds long cycle threshold", cycle_day);
            trail.rule(RuleId::LongCycleWatchdog);
            trail.data("Cycle day", Some(cycle_day), "cycle_day", cycle_day);
            trail.warn(
                MessageKey::LongCycle,
                &[("threshold", watchdog.long_cycle_day.to_string())],
            );
        }
    }

    fn check_temperature_methods(
        &self,
        readings: &[TemperatureReading],
        profile: &UserCalibrationProfile,
        trail: &mut Trail,
    ) {
        let used = methods_used(readings);
        let mismatch = used.len() > 1 || used.iter().any(|m| *m != profile.preferred_method);
        if mismatch {
            let mut methods = vec![profile.preferred_method];
            methods.extend(used.into_iter().filter(|m| *m != profile.preferred_method));
            let listed = methods
                .iter()
                .map(|m| format!("{:?}", m).to_lowercase())
                .collect::<Vec<_>>()
                .join(", ");
            trail.warn(MessageKey::MixedTemperatureMethods, &[("methods", listed)]);
        }

        let disturbed: Vec<String> = readings
            .iter()
            .filter(|r| r.disturbed)
            .map(|r| r.cycle_day.to_string())
            .collect();
        if !disturbed.is_empty() {
            trail.data(
                "Disturbed temperature readings",
                None,
                "disturbed_days",
                disturbed.join(", "),
            );
        }
    }

    /// Compare against the peak day reported by an earlier evaluation
    ///
    /// Returns true when peak quality came back after the recorded peak. The
    /// mucus shift then counts as incomplete for the double check.
    fn check_recorded_peak(
        &self,
        observations: &[DailyObservation],
        cycle: &Cycle,
        mucus: &MucusEvaluation,
        trail: &mut Trail,
    ) -> bool {
        let Some(recorded) = cycle.peak_day else {
            return false;
        };
        if mucus.peak_day == Some(recorded) || mucus.peak_quality_returned {
            return false;
        }

        let readings = valid_mucus(observations);
        let Some(quality) = readings
            .iter()
            .find(|r| r.cycle_day == recorded)
            .map(|r| r.category)
        else {
            return false;
        };

        let walk = count_post_peak(&readings, recorded, quality, self.config.mucus.post_peak_days);
        if walk.peak_quality_returned {
            tracing::info!(
                "Peak quality returned after recorded peak day {} of cycle {}",
                recorded,
                cycle.sequence
            );
            trail.rule(RuleId::MucusRelapse);
            trail.data("Recorded peak day", Some(recorded), "recorded_peak_day", recorded);
            trail.warn(MessageKey::MucusRelapse, &[("peak_day", recorded.to_string())]);
        }
        walk.peak_quality_returned
    }
}

/// Decide a day inside the start-of-cycle window of the adopted rule
///
/// Days up to the last infertile day are infertile. Days after a fertile sign
/// shortened the window are fertile straight away.
fn evaluate_pre_ovulation(
    observations: &[DailyObservation],
    cycle_day: u32,
    start: &CycleStartResult,
    profile: &UserCalibrationProfile,
    trail: &mut Trail,
) -> Decision {
    if cycle_day > start.last_infertile_day {
        let sign_day = start.mucus_override_day.unwrap_or(start.fertility_starts_day);
        tracing::info!(
            "Day {} fertile: fertile sign on day {} inside the {} window",
            cycle_day,
            sign_day,
            start.rule
        );
        trail.rule(RuleId::PreOvulationFertileSign);
        trail.data(
            "Fertility starts",
            Some(start.fertility_starts_day),
            "fertility_starts_day",
            start.fertility_starts_day,
        );
        if let Some(obs) = observation_on(observations, cycle_day)
            .filter(|obs| indicates_fertility(obs, profile))
        {
            let value = obs.mucus.map(|m| m.symbol()).unwrap_or("cervix");
            trail.data("Fertile sign today", Some(cycle_day), "mucus", value);
        }
        return Decision {
            status: StatusKind::Fertile,
            phase: FertilityPhase::PreOvulation,
            explanation: messages::render(
                MessageKey::FertileEarlySign,
                &[
                    ("day", cycle_day.to_string()),
                    ("sign_day", sign_day.to_string()),
                ],
            ),
        };
    }

    tracing::info!(
        "Day {} infertile (pre-ovulation, {} rule up to day {})",
        cycle_day,
        start.rule,
        start.last_infertile_day
    );
    trail.rule(RuleId::PreOvulationInfertile);
    Decision {
        status: StatusKind::Infertile,
        phase: FertilityPhase::PreOvulation,
        explanation: messages::render(
            MessageKey::InfertilePreOvulation,
            &[
                ("day", cycle_day.to_string()),
                ("last_infertile_day", start.last_infertile_day.to_string()),
                ("rule", start.rule.display_name().to_string()),
            ],
        ),
    }
}

fn record_cycle_start(start: &CycleStartResult, trail: &mut Trail) {
    trail.rule(match start.rule {
        StartRule::FiveDay => RuleId::FiveDayRule,
        StartRule::MinusEight => RuleId::MinusEightRule,
        StartRule::MinusTwenty => RuleId::MinusTwentyRule,
    });

    if let Some(day) = start.mucus_override_day {
        trail.rule(RuleId::MucusStartOverride);
        trail.data("First fertile sign", Some(day), "mucus", "fertile");
    }

    trail.data(
        "Last infertile day",
        Some(start.last_infertile_day),
        "last_infertile_day",
        start.last_infertile_day,
    );

    if start.five_day_rule_expired {
        trail.warn(MessageKey::FiveDayRuleExpired, &[]);
    }
}

fn record_temperature(temperature: &TemperatureEvaluation, available: usize, trail: &mut Trail) {
    if !temperature.is_shift_complete {
        trail.rule(RuleId::TemperatureNoShift);
        trail.data("Valid temperature readings", None, "temperature_count", available);
        trail.warn(
            MessageKey::MissingTemperatureShift,
            &[(
                "reason",
                temperature.reason.clone().unwrap_or_default(),
            )],
        );
        return;
    }

    trail.rule(match temperature.exception_used {
        TemperatureException::None => RuleId::TemperatureMainRule,
        TemperatureException::First => RuleId::TemperatureFirstException,
        TemperatureException::Second => RuleId::TemperatureSecondException,
    });

    if let Some(cover_line) = temperature.cover_line_temp {
        trail.data(
            "Coverline",
            temperature.baseline_days.last().copied(),
            "cover_line_temp",
            cover_line,
        );
    }
    if let Some(day) = temperature.first_higher_day() {
        trail.data("First higher temperature", Some(day), "temperature", day);
    }
    if let Some(day) = temperature.completion_day() {
        trail.data("Temperature shift complete", Some(day), "temperature_complete_day", day);
    }
}

fn record_mucus(mucus: &MucusEvaluation, trail: &mut Trail) {
    let (Some(peak_day), Some(quality)) = (mucus.peak_day, mucus.peak_quality) else {
        trail.warn(
            MessageKey::MucusPeakUndetermined,
            &[("reason", mucus.reason.clone().unwrap_or_default())],
        );
        return;
    };

    trail.rule(RuleId::MucusPeakDay);
    trail.data("Peak day", Some(peak_day), "peak_day", peak_day);
    trail.data("Peak quality", Some(peak_day), "mucus", quality.symbol());

    trail.rule(RuleId::MucusPostPeakCount);
    trail.data("Days after peak", None, "post_peak_count", mucus.post_peak_count);

    if mucus.peak_quality_returned {
        trail.rule(RuleId::MucusRelapse);
        trail.warn(MessageKey::MucusRelapse, &[("peak_day", peak_day.to_string())]);
    }
}

/// Later of the two completion days; `None` on either side means "not yet"
pub fn fertility_ends_day(temperature_day: Option<u32>, mucus_day: Option<u32>) -> Option<u32> {
    match (temperature_day, mucus_day) {
        (Some(t), Some(m)) => Some(t.max(m)),
        _ => None,
    }
}

fn combine_shifts(
    cycle_day: u32,
    markers: &mut CycleMarkers,
    temperature: &TemperatureEvaluation,
    mucus: &MucusEvaluation,
    trail: &mut Trail,
) -> Decision {
    trail.rule(RuleId::DoubleCheck);

    let ends = fertility_ends_day(markers.temperature_complete_day, markers.mucus_complete_day);
    markers.fertility_ends_day = ends;

    let Some(end_day) = ends else {
        tracing::info!(
            "Day {} fertile: temperature complete {}, mucus complete {}",
            cycle_day,
            temperature.is_shift_complete,
            mucus.is_shift_complete
        );
        return Decision {
            status: StatusKind::Fertile,
            phase: FertilityPhase::Fertile,
            explanation: messages::render(
                MessageKey::FertileShiftIncomplete,
                &[("day", cycle_day.to_string())],
            ),
        };
    };

    trail.data("Fertility ends", Some(end_day), "fertility_ends_day", end_day);

    if cycle_day >= end_day {
        tracing::info!("Day {} infertile (post-ovulation since day {})", cycle_day, end_day);
        Decision {
            status: StatusKind::Infertile,
            phase: FertilityPhase::PostOvulation,
            explanation: messages::render(
                MessageKey::InfertilePostOvulation,
                &[
                    ("day", cycle_day.to_string()),
                    (
                        "temperature_day",
                        markers.temperature_complete_day.unwrap_or(end_day).to_string(),
                    ),
                    (
                        "mucus_day",
                        markers.mucus_complete_day.unwrap_or(end_day).to_string(),
                    ),
                    ("end_day", end_day.to_string()),
                ],
            ),
        }
    } else {
        tracing::info!("Day {} fertile until day {}", cycle_day, end_day);
        Decision {
            status: StatusKind::Fertile,
            phase: FertilityPhase::Fertile,
            explanation: messages::render(
                MessageKey::FertileUntilShiftEnds,
                &[
                    ("day", cycle_day.to_string()),
                    ("end_day", end_day.to_string()),
                ],
            ),
        }
    }
}

fn assemble(
    cycle_day: u32,
    decision: Decision,
    trail: Trail,
    markers: CycleMarkers,
    cycle_start: Option<CycleStartResult>,
    temperature: Option<TemperatureEvaluation>,
    mucus: Option<MucusEvaluation>,
) -> FertilityStatus {
    FertilityStatus {
        cycle_day,
        status: decision.status,
        phase: decision.phase,
        evidence: trail.rules,
        data_points: trail.data_points,
        explanation: decision.explanation,
        warnings: trail.warnings,
        markers,
        cycle_start,
        temperature,
        mucus,
    }
}
