//! Unit-aware field readers for loosely structured dive XML.
//!
//! Producers disagree on units and often omit the `unit` attribute, so each
//! reader maps the declared unit (case-insensitive) to the canonical one and
//! falls back to a magnitude heuristic where the field has a useful one.

use std::time::Duration;

use crate::units;
use crate::xml::duration::parse_clock;

/// Above this a unitless pressure is read as Pascals.
const PASCAL_THRESHOLD: f64 = 50_000.0;

/// Unitless pressures above this (and below `PSI_CEILING`) are read as psi.
///
/// No scuba cylinder is filled beyond 300 bar, so anything up to that is
/// taken as bar already.
const PSI_FLOOR: f64 = 300.0;
const PSI_CEILING: f64 = 6_000.0;

/// Unitless temperatures above this are read as Kelvin.
const KELVIN_THRESHOLD: f64 = 150.0;

/// Parse a number leniently: surrounding whitespace is ignored and a decimal
/// comma is accepted. Non-finite values are rejected.
pub fn read_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())?;
    value.is_finite().then_some(value)
}

fn unit_key(unit: Option<&str>) -> Option<String> {
    unit.map(|u| u.trim().to_lowercase())
}

pub fn depth_to_meters(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("ft" | "feet") => units::feet_to_meters(value),
        Some("cm" | "centimeter" | "centimeters") => value / 100.0,
        _ => value,
    }
}

/// Elapsed time: clock notation first, then a bare number in seconds or
/// minutes. Unknown or missing units mean seconds.
pub fn parse_time(raw: &str, unit: Option<&str>) -> Option<Duration> {
    if let Some(clock) = parse_clock(raw) {
        return Some(clock);
    }
    let value = read_number(raw)?;
    let seconds = match unit_key(unit).as_deref() {
        Some("min" | "mins" | "minute" | "minutes") => value * 60.0,
        _ => value,
    };
    Duration::try_from_secs_f64(seconds).ok()
}

pub fn temperature_to_celsius(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        None if value > KELVIN_THRESHOLD => units::kelvin_to_celsius(value),
        Some("f" | "°f" | "fahrenheit") => units::fahrenheit_to_celsius(value),
        Some("k" | "kelvin" | "°k") => units::kelvin_to_celsius(value),
        _ => value,
    }
}

pub fn pressure_to_bar(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("psi") => units::psi_to_bar(value),
        Some("kpa") => units::kilopascal_to_bar(value),
        Some("pa" | "pascal" | "pascals") => units::pascal_to_bar(value),
        Some("mbar") => units::millibar_to_bar(value),
        Some("bar" | "bars" | "bara") => value,
        _ => infer_pressure_bar(value),
    }
}

/// Guess the unit of a pressure that came without one.
pub fn infer_pressure_bar(value: f64) -> f64 {
    if value > PASCAL_THRESHOLD {
        units::pascal_to_bar(value)
    } else if value > PSI_FLOOR && value < PSI_CEILING {
        units::psi_to_bar(value)
    } else {
        value
    }
}

pub fn rmv_to_liters_per_min(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("cfm") => value * units::LITERS_PER_CUFT,
        _ => value,
    }
}

pub fn sac_to_bar_per_min(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("psi/min" | "psimin") => units::psi_to_bar(value),
        _ => value,
    }
}

pub fn ascent_rate_to_mps(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("ft/s") => units::feet_to_meters(value),
        Some("ft/min") => units::feet_to_meters(value) / 60.0,
        Some("m/min") => value / 60.0,
        _ => value,
    }
}

pub fn deco_depth_to_meters(value: f64, unit: Option<&str>) -> f64 {
    match unit_key(unit).as_deref() {
        Some("ft") => units::feet_to_meters(value),
        _ => value,
    }
}

/// Cylinder volume in liters.
///
/// Values of 5 or less are multiplied by 1000 and larger values pass
/// through. The source convention behind the small-value case (cubic meters,
/// or liters in thousands) is unknown; the rule is kept as found.
pub fn tank_volume_liters(value: f64) -> f64 {
    if value <= 5.0 {
        value * 1000.0
    } else {
        value
    }
}

/// Format a mix fraction as a percentage with at most one decimal.
pub fn percent_label(fraction: f64) -> String {
    let percent = (fraction * 1000.0).round() / 10.0;
    if percent.fract() == 0.0 {
        format!("{percent:.0}")
    } else {
        format!("{percent:.1}")
    }
}
