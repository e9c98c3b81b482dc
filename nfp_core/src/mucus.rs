//! Cervical mucus peak evaluation.
//!
//! The peak day is the last day of the best mucus quality seen in the cycle.
//! It can only be known in hindsight: it is confirmed once a later observation
//! shows lower quality. After the peak, three consecutive lower-quality entries
//! complete the mucus shift. If peak quality returns before that, counting
//! stops and has to restart from the new peak.

use crate::config::MucusConfig;
use crate::observations::{valid_mucus, MucusReading};
use crate::{DailyObservation, MucusCategory};
use serde::{Deserialize, Serialize};

/// Result of a mucus shift evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MucusEvaluation {
    pub peak_day: Option<u32>,
    pub peak_quality: Option<MucusCategory>,
    pub is_shift_complete: bool,
    /// Consecutive lower-quality days after the peak (P+1, P+2, P+3)
    pub post_peak_count: u32,
    pub peak_quality_returned: bool,
    pub cannot_evaluate: bool,
    pub reason: Option<String>,
}

impl MucusEvaluation {
    /// Evening of P+3, when the mucus shift counts as complete
    pub fn completion_day(&self, post_peak_days: u32) -> Option<u32> {
        match (self.is_shift_complete, self.peak_day) {
            (true, Some(peak)) => Some(peak + post_peak_days),
            _ => None,
        }
    }
}

/// Outcome of walking the days after a peak
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostPeakCount {
    pub count: u32,
    pub peak_quality_returned: bool,
}

/// Evaluate the mucus shift for one cycle
pub fn evaluate_mucus_shift(
    observations: &[DailyObservation],
    config: &MucusConfig,
) -> MucusEvaluation {
    let readings = valid_mucus(observations);

    if readings.len() < config.min_observations {
        return MucusEvaluation {
            cannot_evaluate: true,
            reason: Some(format!(
                "{} mucus observations, at least {} required",
                readings.len(),
                config.min_observations
            )),
            ..Default::default()
        };
    }

    let Some((peak_day, peak_quality)) = find_peak(&readings) else {
        tracing::debug!("Mucus peak not yet confirmed by a lower observation");
        return MucusEvaluation {
            reason: Some("no lower quality observed after the best mucus".to_string()),
            ..Default::default()
        };
    };

    let walk = count_post_peak(&readings, peak_day, peak_quality, config.post_peak_days);
    let is_shift_complete = walk.count >= config.post_peak_days && !walk.peak_quality_returned;

    tracing::debug!(
        "Mucus peak on day {} ({}), {} days after peak, returned: {}",
        peak_day,
        peak_quality,
        walk.count,
        walk.peak_quality_returned
    );

    MucusEvaluation {
        peak_day: Some(peak_day),
        peak_quality: Some(peak_quality),
        is_shift_complete,
        post_peak_count: walk.count,
        peak_quality_returned: walk.peak_quality_returned,
        cannot_evaluate: false,
        reason: if is_shift_complete {
            None
        } else {
            Some(format!(
                "{} of {} days after the peak observed",
                walk.count, config.post_peak_days
            ))
        },
    }
}

/// Last day of the best quality, if a later observation is lower
pub fn find_peak(readings: &[MucusReading]) -> Option<(u32, MucusCategory)> {
    let best = readings.iter().map(|r| r.category).max()?;
    let candidate = readings.iter().rev().find(|r| r.category == best)?;

    let confirmed = readings
        .iter()
        .any(|r| r.cycle_day > candidate.cycle_day && r.category < best);

    confirmed.then_some((candidate.cycle_day, best))
}

/// Count consecutive lower-quality observations after `peak_day`, up to `limit`
///
/// Days without a mucus entry are skipped. A return to `peak_quality` before
/// the limit is reached sets `peak_quality_returned`.
pub fn count_post_peak(
    readings: &[MucusReading],
    peak_day: u32,
    peak_quality: MucusCategory,
    limit: u32,
) -> PostPeakCount {
    let mut count = 0;

    for reading in readings.iter().filter(|r| r.cycle_day > peak_day) {
        if count >= limit {
            break;
        }
        if reading.category >= peak_quality {
            return PostPeakCount {
                count,
                peak_quality_returned: true,
            };
        }
        count += 1;
    }

    PostPeakCount {
        count,
        peak_quality_returned: false,
    }
}
