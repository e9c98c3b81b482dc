//! Bilingual message catalog.
//!
//! The engine selects message keys and fills in placeholders; picking the
//! locale to display is left to the caller.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported locales
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    En,
    De,
}

/// Fixed set of messages the engine can emit
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    // Explanations
    InfertilePreOvulation,
    FertileEarlySign,
    FertileShiftIncomplete,
    FertileUntilShiftEnds,
    InfertilePostOvulation,
    IndeterminateDay,

    // Warnings
    LongCycle,
    Amenorrhea,
    MissingTemperatureShift,
    MucusPeakUndetermined,
    MucusRelapse,
    MixedTemperatureMethods,
    FiveDayRuleExpired,
}

/// A message in both supported languages
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bilingual {
    pub en: String,
    pub de: String,
}

impl Bilingual {
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::De => &self.de,
        }
    }
}

static CATALOG: Lazy<HashMap<MessageKey, HashMap<Locale, &'static str>>> =
    Lazy::new(build_catalog);

fn entry(
    catalog: &mut HashMap<MessageKey, HashMap<Locale, &'static str>>,
    key: MessageKey,
    en: &'static str,
    de: &'static str,
) {
    catalog.insert(key, HashMap::from([(Locale::En, en), (Locale::De, de)]));
}

fn build_catalog() -> HashMap<MessageKey, HashMap<Locale, &'static str>> {
    let mut catalog = HashMap::new();

    entry(
        &mut catalog,
        MessageKey::InfertilePreOvulation,
        "Cycle day {day} is within the infertile days at the start of the cycle (up to day {last_infertile_day}, {rule} rule).",
        "Zyklustag {day} liegt in der unfruchtbaren Zeit am Zyklusanfang (bis Tag {last_infertile_day}, {rule}-Regel).",
    );
    entry(
        &mut catalog,
        MessageKey::FertileEarlySign,
        "Cycle day {day} is fertile: fertile signs were observed on cycle day {sign_day}, so the fertile phase started immediately.",
        "Zyklustag {day} ist fruchtbar: am Zyklustag {sign_day} wurden fruchtbare Zeichen beobachtet, die fruchtbare Zeit begann sofort.",
    );
    entry(
        &mut catalog,
        MessageKey::FertileShiftIncomplete,
        "Cycle day {day} is fertile: temperature and mucus evaluation must both be complete before the infertile phase begins.",
        "Zyklustag {day} ist fruchtbar: Temperatur- und Schleimauswertung müssen beide abgeschlossen sein, bevor die unfruchtbare Zeit beginnt.",
    );
    entry(
        &mut catalog,
        MessageKey::FertileUntilShiftEnds,
        "Cycle day {day} is fertile. Both evaluations are complete; the infertile phase begins on day {end_day}.",
        "Zyklustag {day} ist fruchtbar. Beide Auswertungen sind abgeschlossen; die unfruchtbare Zeit beginnt an Tag {end_day}.",
    );
    entry(
        &mut catalog,
        MessageKey::InfertilePostOvulation,
        "Cycle day {day} is infertile: the later of temperature shift (day {temperature_day}) and mucus shift (day {mucus_day}) was completed on day {end_day}.",
        "Zyklustag {day} ist unfruchtbar: die spätere von Temperaturauswertung (Tag {temperature_day}) und Schleimauswertung (Tag {mucus_day}) wurde an Tag {end_day} abgeschlossen.",
    );
    entry(
        &mut catalog,
        MessageKey::IndeterminateDay,
        "Cycle day {day} is outside the cycle; no fertility status can be given.",
        "Zyklustag {day} liegt außerhalb des Zyklus; es kann keine Aussage zur Fruchtbarkeit gemacht werden.",
    );
    entry(
        &mut catalog,
        MessageKey::LongCycle,
        "This cycle has lasted more than {threshold} days.",
        "Dieser Zyklus dauert bereits länger als {threshold} Tage.",
    );
    entry(
        &mut catalog,
        MessageKey::Amenorrhea,
        "No bleeding for more than {threshold} days. Please consult a doctor.",
        "Seit mehr als {threshold} Tagen keine Blutung. Bitte ärztlichen Rat einholen.",
    );
    entry(
        &mut catalog,
        MessageKey::MissingTemperatureShift,
        "No temperature shift detected yet: {reason}.",
        "Noch kein Temperaturanstieg erkannt: {reason}.",
    );
    entry(
        &mut catalog,
        MessageKey::MucusPeakUndetermined,
        "The mucus peak day cannot be determined yet: {reason}.",
        "Der Höhepunkt des Zervixschleims ist noch nicht bestimmbar: {reason}.",
    );
    entry(
        &mut catalog,
        MessageKey::MucusRelapse,
        "Peak quality mucus returned after the peak day {peak_day}. Counting restarts with the new peak.",
        "Nach dem Höhepunkt an Tag {peak_day} trat wieder Schleim bester Qualität auf. Die Zählung beginnt mit dem neuen Höhepunkt neu.",
    );
    entry(
        &mut catalog,
        MessageKey::MixedTemperatureMethods,
        "Temperatures in this cycle were taken with different methods ({methods}). Readings may not be comparable.",
        "Die Temperaturen dieses Zyklus wurden mit unterschiedlichen Methoden gemessen ({methods}). Die Werte sind möglicherweise nicht vergleichbar.",
    );
    entry(
        &mut catalog,
        MessageKey::FiveDayRuleExpired,
        "The 5-day rule is past its calibration period but no elevation history is available for the minus-8 rule.",
        "Die 5-Tage-Regel hat ihre Kalibrierungszeit überschritten, aber für die Minus-8-Regel fehlen Temperaturdaten.",
    );

    catalog
}

/// Raw catalog text for a key and locale
pub fn text(key: MessageKey, locale: Locale) -> &'static str {
    CATALOG
        .get(&key)
        .and_then(|texts| texts.get(&locale))
        .copied()
        .unwrap_or("")
}

/// Render a message in both locales, substituting `{name}` placeholders
pub fn render(key: MessageKey, params: &[(&str, String)]) -> Bilingual {
    Bilingual {
        en: substitute(text(key, Locale::En), params),
        de: substitute(text(key, Locale::De), params),
    }
}

fn substitute(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}
