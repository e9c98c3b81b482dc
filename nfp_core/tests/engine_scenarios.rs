//! Scenario tests for the fertility engine.
//!
//! These tests drive the public API with charted cycles and verify:
//! - Temperature and mucus shift examples
//! - The double check ("whichever comes last")
//! - Cycle start resolution
//! - Idempotence and relapse behavior

use chrono::{Duration, NaiveDate};
use nfp_core::config::{MucusConfig, TemperatureConfig};
use nfp_core::*;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
}

fn day(cycle_day: u32) -> DailyObservation {
    DailyObservation::new(start_date() + Duration::days(cycle_day as i64 - 1), cycle_day)
}

/// Build a chart from parallel temperature and mucus columns, starting at day 1
fn chart(temps: &[Option<f64>], mucus: &[Option<MucusCategory>]) -> Vec<DailyObservation> {
    let len = temps.len().max(mucus.len());
    (0..len)
        .map(|i| {
            let mut obs = day(i as u32 + 1);
            obs.temperature = temps.get(i).copied().flatten();
            obs.mucus = mucus.get(i).copied().flatten();
            obs
        })
        .collect()
}

/// Temperature completes on day 9, mucus peak on day 14 (complete day 17)
fn late_mucus_cycle() -> Vec<DailyObservation> {
    use MucusCategory::*;

    let temps: Vec<Option<f64>> = [
        36.3, 36.35, 36.4, 36.3, 36.35, 36.4, 36.5, 36.55, 36.65, 36.7, 36.7, 36.65, 36.7,
        36.75, 36.7, 36.7, 36.75, 36.7,
    ]
    .iter()
    .map(|t| Some(*t))
    .collect();

    let mucus: Vec<Option<MucusCategory>> = [
        Dry, Dry, Dry, Dry, Dry, Nothing, Moist, Moist, Fertile, Fertile, Fertile, HighlyFertile,
        HighlyFertile, HighlyFertile, Fertile, Moist, Dry, Dry,
    ]
    .iter()
    .map(|m| Some(*m))
    .collect();

    chart(&temps, &mucus)
}

fn cycle() -> Cycle {
    Cycle::new(3, start_date())
}

#[test]
fn test_temperature_example_main_rule() {
    let temps: Vec<Option<f64>> = [36.3, 36.35, 36.4, 36.3, 36.4, 36.35, 36.5, 36.55, 36.65]
        .iter()
        .map(|t| Some(*t))
        .collect();

    let eval = evaluate_temperature_shift(&chart(&temps, &[]), &TemperatureConfig::default());

    assert!(eval.is_shift_complete);
    assert_eq!(eval.cover_line_temp, Some(36.4));
    assert_eq!(eval.exception_used, TemperatureException::None);
    assert_eq!(eval.elevated_days, vec![7, 8, 9]);
}

#[test]
fn test_mucus_example_peak_and_count() {
    use MucusCategory::*;

    let mucus: Vec<Option<MucusCategory>> =
        [HighlyFertile, HighlyFertile, HighlyFertile, Fertile, Moist, Dry]
            .iter()
            .map(|m| Some(*m))
            .collect();

    let eval = evaluate_mucus_shift(&chart(&[], &mucus), &MucusConfig::default());

    assert_eq!(eval.peak_day, Some(3));
    assert_eq!(eval.post_peak_count, 3);
    assert!(eval.is_shift_complete);
    assert!(!eval.peak_quality_returned);
}

#[test]
fn test_whichever_comes_last() {
    let observations = late_mucus_cycle();
    let profile = UserCalibrationProfile::default();

    let day16 = evaluate_fertility_status(&observations, 16, &cycle(), &profile);
    assert_eq!(day16.markers.temperature_complete_day, Some(9));
    assert_eq!(day16.markers.mucus_complete_day, Some(17));
    assert_eq!(day16.markers.fertility_ends_day, Some(17));
    assert_eq!(day16.status, StatusKind::Fertile);
    assert_eq!(day16.phase, FertilityPhase::Fertile);

    let day17 = evaluate_fertility_status(&observations, 17, &cycle(), &profile);
    assert_eq!(day17.status, StatusKind::Infertile);
    assert_eq!(day17.phase, FertilityPhase::PostOvulation);

    let ends = day17
        .data_points
        .iter()
        .find(|p| p.field == "fertility_ends_day")
        .unwrap();
    assert_eq!(ends.value, DataValue::Integer(17));
    assert_eq!(ends.cycle_day, Some(17));
}

#[test]
fn test_five_day_rule_with_early_mucus() {
    use MucusCategory::*;

    let observations = chart(&[], &[Some(Dry), Some(Dry), Some(Moist), Some(Moist)]);
    let profile = UserCalibrationProfile::default();

    let start = resolve_cycle_start(&observations, &profile, &config::CycleStartConfig::default());
    assert_eq!(start.rule, StartRule::FiveDay);
    assert_eq!(start.last_infertile_day, 2);
    assert_eq!(start.fertility_starts_day, 3);

    let day2 = evaluate_fertility_status(&observations, 2, &cycle(), &profile);
    assert_eq!(day2.status, StatusKind::Infertile);

    let day3 = evaluate_fertility_status(&observations, 3, &cycle(), &profile);
    assert_eq!(day3.status, StatusKind::Fertile);
    assert_eq!(day3.phase, FertilityPhase::PreOvulation);
    assert!(day3
        .evidence
        .iter()
        .any(|r| r.id == RuleId::PreOvulationFertileSign));
    assert!(day3
        .evidence
        .iter()
        .any(|r| r.id == RuleId::MucusStartOverride));
}

#[test]
fn test_identical_inputs_give_equal_results() {
    let observations = late_mucus_cycle();
    let profile = UserCalibrationProfile {
        earliest_elevation_days: vec![15, 16, 14],
        total_cycles: 3,
        shortest_cycle_length: Some(27),
        ..Default::default()
    };

    for cycle_day in [1, 6, 12, 17, 70] {
        let a = evaluate_fertility_status(&observations, cycle_day, &cycle(), &profile);
        let b =
            evaluate_fertility_status(&observations.clone(), cycle_day, &cycle(), &profile.clone());
        assert_eq!(a, b);
    }
}

#[test]
fn test_relapse_flips_completion() {
    let mut observations = late_mucus_cycle();
    let profile = UserCalibrationProfile::default();

    let before = evaluate_fertility_status(&observations, 17, &cycle(), &profile);
    assert!(before.mucus.as_ref().unwrap().is_shift_complete);

    // Best quality mucus comes back on day 19
    observations.push(day(19).with_temperature(36.7).with_mucus(MucusCategory::HighlyFertile));

    let after = evaluate_fertility_status(&observations, 19, &cycle(), &profile);
    let mucus = after.mucus.as_ref().unwrap();
    assert!(!mucus.is_shift_complete);
    assert_eq!(after.status, StatusKind::Fertile);
    assert_eq!(after.markers.fertility_ends_day, None);
}

#[test]
fn test_recorded_peak_relapse_is_reported() {
    // Day 14 was reported as peak; best quality returns on day 16, before P+3
    let mut observations = late_mucus_cycle();
    observations[15].mucus = Some(MucusCategory::HighlyFertile);

    let mut recorded = cycle();
    recorded.peak_day = Some(14);

    let profile = UserCalibrationProfile::default();
    let status = evaluate_fertility_status(&observations, 18, &recorded, &profile);
    assert_eq!(status.markers.peak_day, Some(16));
    assert_eq!(status.markers.mucus_complete_day, None);
    assert!(status.evidence.iter().any(|r| r.id == RuleId::MucusRelapse));
    assert_eq!(status.status, StatusKind::Fertile);
}

#[test]
fn test_recorded_peak_relapse_overrides_fresh_completion() {
    // Best quality on days 12 to 14; day 12 was reported as the peak earlier
    let observations = late_mucus_cycle();
    let profile = UserCalibrationProfile::default();

    let mut recorded = cycle();
    recorded.peak_day = Some(12);

    let status = evaluate_fertility_status(&observations, 18, &recorded, &profile);
    assert!(status.mucus.as_ref().unwrap().is_shift_complete);
    assert!(status.evidence.iter().any(|r| r.id == RuleId::MucusRelapse));
    assert_eq!(status.markers.fertility_ends_day, None);
    assert_eq!(status.status, StatusKind::Fertile);

    recorded.peak_day = status.markers.peak_day;
    let status = evaluate_fertility_status(&observations, 18, &recorded, &profile);
    assert_eq!(status.markers.fertility_ends_day, Some(17));
    assert_eq!(status.status, StatusKind::Infertile);
}

#[test]
fn test_unrecorded_mucus_day_after_peak() {
    let mut observations = late_mucus_cycle();
    observations[15].mucus = None;

    let profile = UserCalibrationProfile::default();
    let status = evaluate_fertility_status(&observations, 18, &cycle(), &profile);
    assert_eq!(status.mucus.as_ref().unwrap().post_peak_count, 3);
    assert_eq!(status.markers.mucus_complete_day, Some(17));
    assert_eq!(status.status, StatusKind::Infertile);
}

#[test]
fn test_insufficient_temperatures_keep_fertile() {
    let observations: Vec<_> = late_mucus_cycle()
        .into_iter()
        .map(|mut obs| {
            if obs.cycle_day > 4 {
                obs.temperature = None;
            }
            obs
        })
        .collect();

    let profile = UserCalibrationProfile::default();
    let status = evaluate_fertility_status(&observations, 18, &cycle(), &profile);
    assert_eq!(status.status, StatusKind::Fertile);
    assert!(status.temperature.as_ref().unwrap().cannot_evaluate);
    assert_eq!(status.markers.mucus_complete_day, Some(17));
    assert!(status
        .evidence
        .iter()
        .any(|r| r.id == RuleId::TemperatureNoShift));
}

#[test]
fn test_minus_eight_profile_shortens_start() {
    let profile = UserCalibrationProfile {
        earliest_elevation_days: vec![13, 15, 14, 16, 15, 14, 13, 15, 16, 14, 15, 17],
        total_cycles: 12,
        ..Default::default()
    };

    let status = evaluate_fertility_status(&late_mucus_cycle(), 5, &cycle(), &profile);
    assert_eq!(status.markers.start_rule, Some(StartRule::MinusEight));
    assert_eq!(status.markers.last_infertile_day, Some(5));
    assert_eq!(status.status, StatusKind::Infertile);

    let status = evaluate_fertility_status(&late_mucus_cycle(), 6, &cycle(), &profile);
    assert_eq!(status.status, StatusKind::Fertile);
}

#[test]
fn test_custom_config_changes_watchdog() {
    let config = Config::from_toml_str("[watchdog]\nlong_cycle_day = 30\n").unwrap();
    let engine = FertilityEngine::new(config);

    let profile = UserCalibrationProfile::default();
    let status = engine.evaluate(&late_mucus_cycle(), 35, &cycle(), &profile);
    assert_eq!(status.evidence[0].id, RuleId::LongCycleWatchdog);
    assert_eq!(status.warnings[0].en, "This cycle has lasted more than 30 days.");
}

#[test]
fn test_cache_matches_direct_evaluation() {
    let observations = late_mucus_cycle();
    let profile = UserCalibrationProfile::default();
    let mut cache = StatusCache::default();

    let cached = cache.get_or_evaluate(&observations, 17, &cycle_fixed(), &profile).unwrap();
    let direct = evaluate_fertility_status(&observations, 17, &cycle_fixed(), &profile);
    assert_eq!(cached, direct);
}

/// Cycle with a fixed id, so fingerprints match across calls
fn cycle_fixed() -> Cycle {
    let mut cycle = cycle();
    cycle.id = uuid::Uuid::nil();
    cycle
}
