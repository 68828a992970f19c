//! Parser for single OR list observation records.
//!
//! A record is a comma-separated list of `KEY=VALUE` fields. Values may be
//! parenthesized tuples, and tuple items may be brace-quoted strings that
//! contain commas, e.g. `TARGET=(83.8221,-5.3911,{Orion, trapezium})`.
//!
//! Only `ID` and `TARGET` are required. Any other malformed or unknown field
//! is recorded as a warning on the returned [`Observation`].

use qtty::{Degrees, Seconds};

use crate::error::StructuralError;
use crate::models::{
    Dither, DurationSpec, ObsId, Observation, Preceding, RollSpec, RollWindow, Segment, Target,
    TargetOffset,
};

/// One logical record line, joined across continuation lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line where the record starts.
    pub line: usize,
    pub text: String,
}

/// Split `text` on commas that are not nested inside `()` or `{}`.
pub fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0i32;
    let mut brace_depth = 0i32;

    for ch in text.chars() {
        match ch {
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth -= 1;
                current.push(ch);
            }
            '{' => {
                brace_depth += 1;
                current.push(ch);
            }
            '}' => {
                brace_depth -= 1;
                current.push(ch);
            }
            ',' if paren_depth <= 0 && brace_depth <= 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Items of a tuple value. Outer parentheses are optional; braces around an
/// item are removed.
pub fn tuple_items(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    split_top_level(inner)
        .into_iter()
        .map(|item| {
            let item = item.trim();
            if item.starts_with('{') && item.ends_with('}') && item.len() >= 2 {
                item[1..item.len() - 1].trim().to_string()
            } else {
                item.to_string()
            }
        })
        .collect()
}

fn parse_numbers(items: &[String]) -> Result<Vec<f64>, String> {
    items
        .iter()
        .map(|item| {
            item.parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", item))
        })
        .collect()
}

fn parse_target(line: usize, value: &str) -> Result<Target, StructuralError> {
    let items = tuple_items(value);
    if items.len() != 3 {
        return Err(StructuralError::MalformedField {
            line,
            field: "TARGET",
            reason: format!("expected (ra, dec, name), found {} items", items.len()),
        });
    }

    let numbers = parse_numbers(&items[..2]).map_err(|reason| StructuralError::MalformedField {
        line,
        field: "TARGET",
        reason,
    })?;
    let (ra, dec) = (numbers[0], numbers[1]);

    if !(0.0..=360.0).contains(&ra) || !(-90.0..=90.0).contains(&dec) {
        return Err(StructuralError::MalformedField {
            line,
            field: "TARGET",
            reason: format!("coordinates out of range: ra={}, dec={}", ra, dec),
        });
    }

    Ok(Target::new(
        items[2].clone(),
        Degrees::new(ra),
        Degrees::new(dec),
    ))
}

fn parse_duration(value: &str) -> Result<DurationSpec, String> {
    let numbers = parse_numbers(&tuple_items(value))?;
    if numbers.iter().any(|v| *v < 0.0) {
        return Err("negative duration".to_string());
    }
    match numbers.as_slice() {
        [total] => Ok(DurationSpec::Total(Seconds::new(*total))),
        [min, nominal, max] => Ok(DurationSpec::Split {
            min: Seconds::new(*min),
            nominal: Seconds::new(*nominal),
            max: Seconds::new(*max),
        }),
        other => Err(format!("expected 1 or 3 values, found {}", other.len())),
    }
}

fn parse_roll(value: &str) -> Result<RollSpec, String> {
    let numbers = parse_numbers(&tuple_items(value))?;
    match numbers.as_slice() {
        [fixed] => Ok(RollSpec::Fixed(Degrees::new(*fixed))),
        [center, tolerance] => {
            if *tolerance < 0.0 {
                return Err(format!("negative roll tolerance {}", tolerance));
            }
            Ok(RollSpec::Preference(RollWindow::new(
                Degrees::new(*center),
                Degrees::new(*tolerance),
            )))
        }
        other => Err(format!("expected 1 or 2 values, found {}", other.len())),
    }
}

fn parse_offset(value: &str) -> Result<TargetOffset, String> {
    let numbers = parse_numbers(&tuple_items(value))?;
    match numbers.as_slice() {
        [y, z] => Ok(TargetOffset {
            y_arcmin: *y,
            z_arcmin: *z,
        }),
        other => Err(format!("expected (y, z), found {} values", other.len())),
    }
}

fn parse_dither(value: &str) -> Result<Dither, String> {
    let items = tuple_items(value);
    let (flag, params) = items
        .split_first()
        .ok_or_else(|| "empty dither".to_string())?;

    let enabled = match flag.to_ascii_uppercase().as_str() {
        "ON" => true,
        "OFF" => false,
        other => return Err(format!("dither flag must be ON or OFF, found '{}'", other)),
    };

    let numbers = parse_numbers(params)?;
    let p = match numbers.len() {
        6 => [
            numbers[0], numbers[1], numbers[2], numbers[3], numbers[4], numbers[5],
        ],
        0 if !enabled => [0.0; 6],
        n => return Err(format!("expected 6 dither parameters, found {}", n)),
    };

    Ok(Dither {
        enabled,
        y_amplitude: p[0],
        y_rate: p[1],
        y_phase: p[2],
        z_amplitude: p[3],
        z_rate: p[4],
        z_phase: p[5],
    })
}

fn parse_segment(value: &str) -> Result<Segment, String> {
    let items = tuple_items(value);
    if items.len() != 2 {
        return Err(format!("expected (index, duration), found {} items", items.len()));
    }
    let index = items[0]
        .parse::<u32>()
        .map_err(|_| format!("segment index '{}' is not an integer", items[0]))?;
    let duration = items[1]
        .parse::<f64>()
        .map_err(|_| format!("segment duration '{}' is not a number", items[1]))?;
    if duration < 0.0 {
        return Err(format!("negative segment duration {}", duration));
    }
    Ok(Segment {
        index,
        duration: Seconds::new(duration),
    })
}

fn parse_preceding(value: &str) -> Option<Preceding> {
    let items = tuple_items(value);
    let token = items.first()?.trim();
    if token.is_empty() {
        return None;
    }
    Some(match token.parse::<ObsId>() {
        Ok(id) => Preceding::Obsid(id),
        Err(_) => Preceding::Token(token.to_string()),
    })
}

fn parse_count(value: &str) -> Result<u32, String> {
    let items = tuple_items(value);
    let item = items.first().map(String::as_str).unwrap_or("");
    item.parse::<u32>()
        .map_err(|_| format!("'{}' is not a non-negative integer", item))
}

fn plain_value(value: &str) -> Option<String> {
    let items = tuple_items(value);
    items.first().filter(|v| !v.is_empty()).cloned()
}

/// Split a record into `(KEY, VALUE)` pairs; keys are upper-cased.
fn key_values(raw: &RawRecord, warnings: &mut Vec<String>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for field in split_top_level(&raw.text) {
        if field.is_empty() {
            continue;
        }
        match field.split_once('=') {
            Some((key, value)) => {
                pairs.push((key.trim().to_ascii_uppercase(), value.trim().to_string()))
            }
            None => warnings.push(format!("field '{}' has no '=' and was ignored", field)),
        }
    }
    pairs
}

/// Parse one record into an [`Observation`].
///
/// # Errors
///
/// Returns a [`StructuralError`] when `ID` or `TARGET` is missing or
/// malformed. Every other anomaly becomes a warning on the observation.
pub fn parse_record(raw: &RawRecord) -> Result<Observation, StructuralError> {
    let mut warnings = Vec::new();
    let pairs = key_values(raw, &mut warnings);

    let id_value = pairs
        .iter()
        .find(|(key, _)| key == "ID")
        .map(|(_, value)| value.as_str())
        .ok_or(StructuralError::MissingField {
            line: raw.line,
            field: "ID",
        })?;
    let obsid = plain_value(id_value)
        .and_then(|v| v.parse::<ObsId>().ok())
        .ok_or_else(|| StructuralError::MalformedField {
            line: raw.line,
            field: "ID",
            reason: format!("'{}' is not an obsid", id_value),
        })?;

    let target_value = pairs
        .iter()
        .find(|(key, _)| key == "TARGET")
        .map(|(_, value)| value.as_str())
        .ok_or(StructuralError::MissingField {
            line: raw.line,
            field: "TARGET",
        })?;
    let target = parse_target(raw.line, target_value)?;

    let mut obs = Observation::new(obsid, target);
    obs.line = raw.line;

    let mut seen: Vec<&str> = Vec::new();
    for (key, value) in &pairs {
        let key = key.as_str();
        if key != "SEGMENT" && seen.contains(&key) {
            let kept = if matches!(key, "ID" | "TARGET") { "first" } else { "last" };
            warnings.push(format!("field {} repeated; {} value kept", key, kept));
        }
        seen.push(key);

        let result: Result<(), String> = match key {
            "ID" | "TARGET" => Ok(()),
            "DURATION" => parse_duration(value).map(|d| obs.duration = Some(d)),
            "PRIORITY" => plain_value(value)
                .and_then(|v| v.parse::<i32>().ok())
                .map(|p| obs.priority = Some(p))
                .ok_or_else(|| format!("'{}' is not an integer", value)),
            "SI" => {
                obs.instrument = plain_value(value);
                Ok(())
            }
            "GRATING" => {
                obs.grating = plain_value(value);
                Ok(())
            }
            "SI_MODE" => {
                obs.si_mode = plain_value(value);
                Ok(())
            }
            "ACA_MODE" => {
                obs.aca_mode = plain_value(value);
                Ok(())
            }
            "TARGET_OFFSET" => parse_offset(value).map(|o| obs.offset = o),
            "SIM_OFFSET" => plain_value(value)
                .and_then(|v| v.parse::<f64>().ok())
                .map(|s| obs.sim_offset = Some(s))
                .ok_or_else(|| format!("'{}' is not a number", value)),
            "DITHER" => parse_dither(value).map(|d| obs.dither = Some(d)),
            "SEGMENT" => parse_segment(value).map(|s| obs.segments.push(s)),
            "PRECEDING" => {
                obs.preceding = parse_preceding(value);
                Ok(())
            }
            "MIN_ACQ" => parse_count(value).map(|n| obs.min_acq = Some(n)),
            "MIN_GUIDE" => parse_count(value).map(|n| obs.min_guide = Some(n)),
            "ROLL" => parse_roll(value).map(|r| obs.roll = Some(r)),
            other => {
                obs.extra.insert(other.to_string(), value.clone());
                Err("unrecognized field kept verbatim".to_string())
            }
        };

        if let Err(reason) = result {
            warnings.push(format!("{}: {}", key, reason));
        }
    }

    if obs.duration.is_none() && !seen.contains(&"DURATION") {
        warnings.push("DURATION: missing".to_string());
    }
    if obs.priority.is_none() && !seen.contains(&"PRIORITY") {
        warnings.push("PRIORITY: missing".to_string());
    }

    obs.segments.sort_by_key(|s| s.index);

    for warning in &warnings {
        log::warn!("obsid {} (line {}): {}", obsid, raw.line, warning);
    }
    obs.warnings = warnings;

    Ok(obs)
}
