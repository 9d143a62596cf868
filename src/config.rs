use serde::{Deserialize, Serialize};

use crate::engine::WeekendPolicy;
use crate::limits::MAX_SPAN_DAYS;
use crate::model::ClockTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Widest request accepted, in days. Never above `limits::MAX_SPAN_DAYS`.
    pub max_span_days: i64,
    /// Weekend policy used when a creation request doesn't say.
    pub default_weekend: WeekendPolicy,
    pub day_start: ClockTime,
    pub day_end: ClockTime,
    /// Length of a suggested technical-room slot.
    pub technical_slot_minutes: u32,
    pub metrics_port: Option<u16>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_span_days: MAX_SPAN_DAYS,
            default_weekend: WeekendPolicy::default(),
            day_start: ClockTime::from_minutes(9 * 60),
            day_end: ClockTime::from_minutes(18 * 60),
            technical_slot_minutes: 60,
            metrics_port: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `SUITEPLAN_*` environment variables.
    /// Values that don't parse are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let max_span_days = lookup("SUITEPLAN_MAX_SPAN_DAYS")
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map_or(defaults.max_span_days, |n| n.min(MAX_SPAN_DAYS));
        let include_friday = lookup("SUITEPLAN_INCLUDE_FRIDAY")
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.default_weekend.include_friday);
        let include_saturday = lookup("SUITEPLAN_INCLUDE_SATURDAY")
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.default_weekend.include_saturday);
        let day_start = lookup("SUITEPLAN_DAY_START")
            .and_then(|s| ClockTime::parse(&s).ok())
            .unwrap_or(defaults.day_start);
        let day_end = lookup("SUITEPLAN_DAY_END")
            .and_then(|s| ClockTime::parse(&s).ok())
            .unwrap_or(defaults.day_end);
        let technical_slot_minutes = lookup("SUITEPLAN_TECHNICAL_SLOT_MINUTES")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.technical_slot_minutes);
        let metrics_port = lookup("SUITEPLAN_METRICS_PORT").and_then(|s| s.parse().ok());

        Self {
            max_span_days,
            default_weekend: WeekendPolicy {
                include_friday,
                include_saturday,
            },
            day_start,
            day_end,
            technical_slot_minutes,
            metrics_port,
        }
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
