//! Accessors over the daily observations of one cycle.
//!
//! The evaluators never look at raw observations directly; they work on the
//! filtered, day-sorted sequences produced here.

use crate::{DailyObservation, MucusCategory, TemperatureMethod, UserCalibrationProfile};

/// A temperature reading that may take part in shift detection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureReading {
    pub cycle_day: u32,
    pub value: f64,
    pub method: Option<TemperatureMethod>,
    pub disturbed: bool,
}

/// A charted mucus observation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MucusReading {
    pub cycle_day: u32,
    pub category: MucusCategory,
}

/// Non-excluded readings with a value, sorted by cycle day
pub fn valid_temperatures(observations: &[DailyObservation]) -> Vec<TemperatureReading> {
    let mut readings: Vec<_> = observations
        .iter()
        .filter_map(|obs| {
            obs.valid_temperature().map(|value| TemperatureReading {
                cycle_day: obs.cycle_day,
                value,
                method: obs.temperature_method,
                disturbed: obs.disturbance.is_some(),
            })
        })
        .collect();

    readings.sort_by_key(|r| r.cycle_day);
    readings
}

/// Days with a mucus category, sorted by cycle day
pub fn valid_mucus(observations: &[DailyObservation]) -> Vec<MucusReading> {
    let mut readings: Vec<_> = observations
        .iter()
        .filter_map(|obs| {
            obs.mucus.map(|category| MucusReading {
                cycle_day: obs.cycle_day,
                category,
            })
        })
        .collect();

    readings.sort_by_key(|r| r.cycle_day);
    readings
}

/// The observation recorded for a given cycle day
pub fn observation_on(
    observations: &[DailyObservation],
    cycle_day: u32,
) -> Option<&DailyObservation> {
    observations.iter().find(|obs| obs.cycle_day == cycle_day)
}

/// Whether a single day's signs end the pre-ovulatory infertile window
///
/// Non-dry mucus always counts; cervix signs count only when the profile
/// prefers them.
pub fn indicates_fertility(
    observation: &DailyObservation,
    profile: &UserCalibrationProfile,
) -> bool {
    let mucus = observation
        .mucus
        .map(MucusCategory::indicates_fertility)
        .unwrap_or(false);

    let cervix = profile.prefers_cervix
        && observation
            .cervix
            .as_ref()
            .map(|c| c.indicates_fertility())
            .unwrap_or(false);

    mucus || cervix
}

/// First cycle day whose signs indicate fertility
pub fn first_fertile_sign_day(
    observations: &[DailyObservation],
    profile: &UserCalibrationProfile,
) -> Option<u32> {
    observations
        .iter()
        .filter(|obs| indicates_fertility(obs, profile))
        .map(|obs| obs.cycle_day)
        .min()
}

/// Distinct measurement methods among the valid readings, in first-seen order
pub fn methods_used(readings: &[TemperatureReading]) -> Vec<TemperatureMethod> {
    let mut methods = Vec::new();
    for method in readings.iter().filter_map(|r| r.method) {
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    methods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CervixFirmness, CervixSign};
    use chrono::NaiveDate;

    fn obs(day: u32) -> DailyObservation {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DailyObservation::new(start + chrono::Duration::days(day as i64 - 1), day)
    }

    #[test]
    fn test_valid_temperatures_filters_and_sorts() {
        let observations = vec![
            obs(3).with_temperature(36.5),
            obs(1).with_temperature(36.3),
            obs(2).with_temperature(37.9).excluded(),
            obs(4),
        ];

        let readings = valid_temperatures(&observations);
        let days: Vec<u32> = readings.iter().map(|r| r.cycle_day).collect();
        assert_eq!(days, vec![1, 3]);
        assert_eq!(readings[0].value, 36.3);
    }

    #[test]
    fn test_valid_mucus_sorted() {
        let observations = vec![
            obs(5).with_mucus(MucusCategory::Moist),
            obs(2).with_mucus(MucusCategory::Dry),
            obs(3),
        ];

        let readings = valid_mucus(&observations);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].cycle_day, 2);
        assert_eq!(readings[1].category, MucusCategory::Moist);
    }

    #[test]
    fn test_disturbed_reading_is_kept() {
        let observations = vec![obs(1).with_temperature(36.9).with_disturbance("late night")];
        let readings = valid_temperatures(&observations);
        assert_eq!(readings.len(), 1);
        assert!(readings[0].disturbed);
    }

    #[test]
    fn test_cervix_counts_only_when_preferred() {
        let soft = CervixSign {
            firmness: Some(CervixFirmness::Soft),
            ..Default::default()
        };
        let observations = vec![obs(4).with_cervix(soft)];
        let mut profile = UserCalibrationProfile::default();

        assert_eq!(first_fertile_sign_day(&observations, &profile), None);

        profile.prefers_cervix = true;
        assert_eq!(first_fertile_sign_day(&observations, &profile), Some(4));
    }

    #[test]
    fn test_methods_used() {
        let observations = vec![
            obs(1).with_temperature(36.3).with_method(TemperatureMethod::Oral),
            obs(2).with_temperature(36.4).with_method(TemperatureMethod::Vaginal),
            obs(3).with_temperature(36.4).with_method(TemperatureMethod::Oral),
        ];
        let readings = valid_temperatures(&observations);
        assert_eq!(
            methods_used(&readings),
            vec![TemperatureMethod::Oral, TemperatureMethod::Vaginal]
        );
    }
}
