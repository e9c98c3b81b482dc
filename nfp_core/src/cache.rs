//! Memoization of fertility status results.
//!
//! Evaluation is a pure function of its inputs, so results can be reused for
//! as long as the caller's observations, cycle and profile stay the same.
//! Entries are found by fingerprint and confirmed against the serialized
//! inputs, so a fingerprint collision is a miss rather than a wrong answer.

use crate::engine::{FertilityEngine, FertilityStatus};
use crate::{Cycle, DailyObservation, Result, UserCalibrationProfile};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

/// Number of results kept before the oldest is evicted
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Serialize)]
struct Inputs<'a> {
    observations: &'a [DailyObservation],
    cycle_day: u32,
    cycle: &'a Cycle,
    profile: &'a UserCalibrationProfile,
}

fn input_bytes(
    observations: &[DailyObservation],
    cycle_day: u32,
    cycle: &Cycle,
    profile: &UserCalibrationProfile,
) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&Inputs {
        observations,
        cycle_day,
        cycle,
        profile,
    })?)
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Stable fingerprint of one evaluation's inputs
pub fn fingerprint(
    observations: &[DailyObservation],
    cycle_day: u32,
    cycle: &Cycle,
    profile: &UserCalibrationProfile,
) -> Result<u64> {
    let bytes = input_bytes(observations, cycle_day, cycle, profile)?;
    Ok(hash_bytes(&bytes))
}

#[derive(Debug)]
struct Entry {
    inputs: Vec<u8>,
    status: FertilityStatus,
}

/// Engine wrapper that remembers a bounded number of results
#[derive(Debug)]
pub struct StatusCache {
    engine: FertilityEngine,
    capacity: usize,
    entries: HashMap<u64, Entry>,
    /// Fingerprints in insertion order, oldest first
    order: VecDeque<u64>,
    hits: u64,
    misses: u64,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(FertilityEngine::default())
    }
}

impl StatusCache {
    pub fn new(engine: FertilityEngine) -> Self {
        Self::with_capacity(engine, DEFAULT_CAPACITY)
    }

    /// Cache holding at most `capacity` results (at least one)
    pub fn with_capacity(engine: FertilityEngine, capacity: usize) -> Self {
        Self {
            engine,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached status for these inputs, evaluating on a miss
    pub fn get_or_evaluate(
        &mut self,
        observations: &[DailyObservation],
        cycle_day: u32,
        cycle: &Cycle,
        profile: &UserCalibrationProfile,
    ) -> Result<FertilityStatus> {
        let inputs = input_bytes(observations, cycle_day, cycle, profile)?;
        let key = hash_bytes(&inputs);

        if let Some(entry) = self.entries.get(&key) {
            if entry.inputs == inputs {
                self.hits += 1;
                tracing::debug!("Status cache hit for cycle day {}", cycle_day);
                return Ok(entry.status.clone());
            }
            tracing::debug!("Status cache fingerprint collision for cycle day {}", cycle_day);
        }

        self.misses += 1;
        let status = self.engine.evaluate(observations, cycle_day, cycle, profile);
        self.insert(key, inputs, status.clone());
        Ok(status)
    }

    fn insert(&mut self, key: u64, inputs: Vec<u8>, status: FertilityStatus) {
        let entry = Entry { inputs, status };
        if self.entries.insert(key, entry).is_some() {
            // A replaced entry keeps its place in the order
            return;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop every cached result
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MucusCategory;
    use chrono::NaiveDate;

    fn observations() -> Vec<DailyObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        (1..=10)
            .map(|d| {
                DailyObservation::new(start + chrono::Duration::days(d as i64 - 1), d)
                    .with_temperature(36.3)
                    .with_mucus(MucusCategory::Dry)
            })
            .collect()
    }

    #[test]
    fn test_cache_hit_returns_equal_status() {
        let cycle = Cycle::new(1, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let profile = UserCalibrationProfile::default();
        let obs = observations();
        let mut cache = StatusCache::default();

        let first = cache.get_or_evaluate(&obs, 8, &cycle, &profile).unwrap();
        let second = cache.get_or_evaluate(&obs, 8, &cycle, &profile).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_input_misses() {
        let cycle = Cycle::new(1, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let profile = UserCalibrationProfile::default();
        let mut obs = observations();
        let mut cache = StatusCache::default();

        cache.get_or_evaluate(&obs, 8, &cycle, &profile).unwrap();
        obs[6].mucus = Some(MucusCategory::Moist);
        cache.get_or_evaluate(&obs, 8, &cycle, &profile).unwrap();

        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let cycle = Cycle::new(1, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let profile = UserCalibrationProfile::default();
        let obs = observations();
        let mut cache = StatusCache::with_capacity(FertilityEngine::default(), 2);

        for day in [3, 4, 5] {
            cache.get_or_evaluate(&obs, day, &cycle, &profile).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.misses(), 3);

        cache.get_or_evaluate(&obs, 5, &cycle, &profile).unwrap();
        assert_eq!(cache.hits(), 1);

        cache.get_or_evaluate(&obs, 3, &cycle, &profile).unwrap();
        assert_eq!(cache.misses(), 4);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fingerprint_collision_is_a_miss() {
        let cycle = Cycle::new(1, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let profile = UserCalibrationProfile::default();
        let obs = observations();
        let mut cache = StatusCache::default();

        // Store the day 3 result under the fingerprint of day 8
        let day3 = cache.get_or_evaluate(&obs, 3, &cycle, &profile).unwrap();
        let key = fingerprint(&obs, 8, &cycle, &profile).unwrap();
        let day3_inputs = input_bytes(&obs, 3, &cycle, &profile).unwrap();
        cache.insert(key, day3_inputs, day3.clone());

        let day8 = cache.get_or_evaluate(&obs, 8, &cycle, &profile).unwrap();
        assert_eq!(day8.cycle_day, 8);
        assert_ne!(day8, day3);
        assert_eq!(cache.hits(), 0);

        let again = cache.get_or_evaluate(&obs, 8, &cycle, &profile).unwrap();
        assert_eq!(again, day8);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let cycle = Cycle::new(1, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let profile = UserCalibrationProfile::default();
        let obs = observations();

        let a = fingerprint(&obs, 3, &cycle, &profile).unwrap();
        let b = fingerprint(&obs.clone(), 3, &cycle.clone(), &profile.clone()).unwrap();
        let c = fingerprint(&obs, 4, &cycle, &profile).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
