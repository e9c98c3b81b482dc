//! Evidence trail returned with every fertility status.
//!
//! Each evaluation records, in call order, the protocol rules it applied and
//! the facts it consulted. The trail is built fresh per call and handed over
//! by value inside the status.

use crate::messages::{self, Bilingual, MessageKey};
use serde::{Deserialize, Serialize};

/// Protocol rules the engine can cite
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    LongCycleWatchdog,
    AmenorrheaWatchdog,
    FiveDayRule,
    MinusEightRule,
    MinusTwentyRule,
    MucusStartOverride,
    PreOvulationInfertile,
    PreOvulationFertileSign,
    TemperatureMainRule,
    TemperatureFirstException,
    TemperatureSecondException,
    TemperatureNoShift,
    MucusPeakDay,
    MucusPostPeakCount,
    MucusRelapse,
    DoubleCheck,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::LongCycleWatchdog => "watchdog.long_cycle",
            RuleId::AmenorrheaWatchdog => "watchdog.amenorrhea",
            RuleId::FiveDayRule => "cycle_start.five_day",
            RuleId::MinusEightRule => "cycle_start.minus_eight",
            RuleId::MinusTwentyRule => "cycle_start.minus_twenty",
            RuleId::MucusStartOverride => "cycle_start.mucus_override",
            RuleId::PreOvulationInfertile => "pre_ovulation.infertile",
            RuleId::PreOvulationFertileSign => "pre_ovulation.fertile_sign",
            RuleId::TemperatureMainRule => "temperature.main_rule",
            RuleId::TemperatureFirstException => "temperature.first_exception",
            RuleId::TemperatureSecondException => "temperature.second_exception",
            RuleId::TemperatureNoShift => "temperature.no_shift",
            RuleId::MucusPeakDay => "mucus.peak_day",
            RuleId::MucusPostPeakCount => "mucus.post_peak_count",
            RuleId::MucusRelapse => "mucus.relapse",
            RuleId::DoubleCheck => "combination.double_check",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::LongCycleWatchdog => "Long cycle watchdog",
            RuleId::AmenorrheaWatchdog => "Amenorrhea watchdog",
            RuleId::FiveDayRule => "Five-day rule",
            RuleId::MinusEightRule => "Minus-8 rule",
            RuleId::MinusTwentyRule => "Minus-20 rule",
            RuleId::MucusStartOverride => "Mucus observation ends the infertile start",
            RuleId::PreOvulationInfertile => "Infertile days at cycle start",
            RuleId::PreOvulationFertileSign => "Fertile sign during the infertile start",
            RuleId::TemperatureMainRule => "Temperature shift: three higher readings",
            RuleId::TemperatureFirstException => {
                "Temperature shift: first exception (fourth reading)"
            }
            RuleId::TemperatureSecondException => "Temperature shift: second exception (one dip)",
            RuleId::TemperatureNoShift => "Temperature shift not found",
            RuleId::MucusPeakDay => "Mucus peak day",
            RuleId::MucusPostPeakCount => "Three days after the peak",
            RuleId::MucusRelapse => "Peak quality returned after the peak",
            RuleId::DoubleCheck => "Double check: whichever completes last",
        }
    }

    /// Where the rule is implemented
    pub fn source(&self) -> SourceLocator {
        let (module, function) = match self {
            RuleId::LongCycleWatchdog | RuleId::AmenorrheaWatchdog => ("engine", "check_watchdogs"),
            RuleId::FiveDayRule => ("cycle_start", "five_day_rule"),
            RuleId::MinusEightRule => ("cycle_start", "minus_eight_rule"),
            RuleId::MinusTwentyRule => ("cycle_start", "minus_twenty_rule"),
            RuleId::MucusStartOverride => ("cycle_start", "apply_mucus_override"),
            RuleId::PreOvulationInfertile | RuleId::PreOvulationFertileSign => {
                ("engine", "evaluate_pre_ovulation")
            }
            RuleId::TemperatureMainRule => ("temperature", "main_rule"),
            RuleId::TemperatureFirstException => ("temperature", "first_exception"),
            RuleId::TemperatureSecondException => ("temperature", "second_exception"),
            RuleId::TemperatureNoShift => ("temperature", "evaluate_temperature_shift"),
            RuleId::MucusPeakDay => ("mucus", "find_peak"),
            RuleId::MucusPostPeakCount | RuleId::MucusRelapse => ("mucus", "count_post_peak"),
            RuleId::DoubleCheck => ("engine", "combine_shifts"),
        };

        SourceLocator {
            module: module.to_string(),
            function: function.to_string(),
        }
    }

    pub fn reference(self) -> RuleReference {
        RuleReference {
            id: self,
            name: self.name().to_string(),
            source: self.source(),
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Code location of a rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocator {
    pub module: String,
    pub function: String,
}

/// A cited rule with its identifying metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleReference {
    pub id: RuleId,
    pub name: String,
    pub source: SourceLocator,
}

/// Value of a data point
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DataValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Integer(v) => write!(f, "{}", v),
            DataValue::Number(v) => write!(f, "{:.2}", v),
            DataValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<u32> for DataValue {
    fn from(v: u32) -> Self {
        DataValue::Integer(i64::from(v))
    }
}

impl From<usize> for DataValue {
    fn from(v: usize) -> Self {
        DataValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::Text(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::Text(v)
    }
}

/// A named fact consumed by a decision
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
    pub label: String,
    pub cycle_day: Option<u32>,
    pub field: String,
    pub value: DataValue,
}

impl DataPoint {
    pub fn new(
        label: &str,
        cycle_day: Option<u32>,
        field: &str,
        value: impl Into<DataValue>,
    ) -> Self {
        Self {
            label: label.to_string(),
            cycle_day,
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Per-call accumulator for rules, data points and warnings
#[derive(Debug, Default)]
pub(crate) struct Trail {
    pub rules: Vec<RuleReference>,
    pub data_points: Vec<DataPoint>,
    pub warnings: Vec<Bilingual>,
}

impl Trail {
    pub fn rule(&mut self, id: RuleId) {
        self.rules.push(id.reference());
    }

    pub fn data(
        &mut self,
        label: &str,
        cycle_day: Option<u32>,
        field: &str,
        value: impl Into<DataValue>,
    ) {
        self.data_points
            .push(DataPoint::new(label, cycle_day, field, value));
    }

    pub fn warn(&mut self, key: MessageKey, params: &[(&str, String)]) {
        self.warnings.push(messages::render(key, params));
    }
}
