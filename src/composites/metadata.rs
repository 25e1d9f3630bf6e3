//! Metadata combination for composite outputs.

use super::image::Attrs;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeSet;

const START_TIME: &str = "start_time";
const END_TIME: &str = "end_time";

/// Merge the attributes of several images.
///
/// A key survives when every input carries it with the same value.
/// `start_time` and `end_time` are the exception: the earliest start and the
/// latest end are kept whenever all inputs carry parseable times.
pub fn combine_metadata<'a>(attrs: impl IntoIterator<Item = &'a Attrs>) -> Attrs {
    let all: Vec<&Attrs> = attrs.into_iter().collect();
    let Some((first, rest)) = all.split_first() else {
        return Attrs::new();
    };

    let mut combined = Attrs::new();
    for (key, value) in first.iter() {
        if key == START_TIME || key == END_TIME {
            continue;
        }
        if rest.iter().all(|other| other.get(key) == Some(value)) {
            combined.insert(key.clone(), value.clone());
        }
    }

    if let Some(start) = extreme_time(&all, START_TIME, |a, b| a < b) {
        combined.insert(START_TIME.to_string(), start);
    }
    if let Some(end) = extreme_time(&all, END_TIME, |a, b| a > b) {
        combined.insert(END_TIME.to_string(), end);
    }
    combined
}

/// The time value for `key` preferred by `better`, if every input has one.
fn extreme_time(
    all: &[&Attrs],
    key: &str,
    better: impl Fn(&NaiveDateTime, &NaiveDateTime) -> bool,
) -> Option<Value> {
    let mut best: Option<(NaiveDateTime, &Value)> = None;
    for attrs in all {
        let value = attrs.get(key)?;
        let time = parse_time(value.as_str()?)?;
        let replace = match &best {
            Some((current, _)) => better(&time, current),
            None => true,
        };
        if replace {
            best = Some((time, value));
        }
    }
    best.map(|(_, value)| value.clone())
}

/// Parse RFC 3339 or a naive ISO 8601 timestamp, as UTC.
fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Union of the `sensor` attributes of the inputs.
///
/// A sensor may be a single name or a list of names. Returns the single name
/// when there is exactly one, a sorted list when there are several.
pub fn collect_sensors<'a>(attrs: impl IntoIterator<Item = &'a Attrs>) -> Option<Value> {
    let mut sensors = BTreeSet::new();
    for attrs in attrs {
        match attrs.get("sensor") {
            Some(Value::String(name)) => {
                sensors.insert(name.clone());
            }
            Some(Value::Array(names)) => {
                sensors.extend(names.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }
    match sensors.len() {
        0 => None,
        1 => sensors.into_iter().next().map(Value::String),
        _ => Some(Value::from(sensors.into_iter().collect::<Vec<_>>())),
    }
}
