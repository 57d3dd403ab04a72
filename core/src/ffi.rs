//! Host-facing bindings exported through UniFFI.
//!
//! Records are flat: each dive carries its site and buddy names instead of
//! arena indices, times are Unix seconds and durations are seconds.

use std::time::Duration;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::models::{Dive, DiveLog, DiveSample, TankUsage};
use crate::{logging, orchestrator, synthetic};

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DiveLogError {
    #[error("Source unavailable: {msg}")]
    SourceUnavailable { msg: String },
    #[error("Malformed document: {msg}")]
    MalformedDocument { msg: String },
    #[error("Query error: {msg}")]
    Query { msg: String },
    #[error("Configuration error: {msg}")]
    Config { msg: String },
}

impl From<ImportError> for DiveLogError {
    fn from(err: ImportError) -> Self {
        let msg = err.to_string();
        match err {
            ImportError::SourceUnavailable { .. } | ImportError::Unreadable { .. } => {
                DiveLogError::SourceUnavailable { msg }
            }
            ImportError::MalformedDocument(_) => DiveLogError::MalformedDocument { msg },
            ImportError::Query(_) => DiveLogError::Query { msg },
            ImportError::Config(_) => DiveLogError::Config { msg },
            // Per-field degradations never escape an importer; map them
            // anyway so the conversion stays total.
            ImportError::FieldUnparsable { .. } | ImportError::DanglingReference { .. } => {
                DiveLogError::MalformedDocument { msg }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSample {
    pub time_seconds: f64,
    pub depth_m: f64,
    pub temperature_c: Option<f64>,
    pub tank_pressure_bar: Option<f64>,
    pub rmv_liters_per_min: Option<f64>,
    pub sac_bar_per_min: Option<f64>,
    pub ppo2: Option<f64>,
    pub ndl_minutes: Option<f64>,
    pub tts_minutes: Option<f64>,
    pub ascent_rate_mps: Option<f64>,
    pub deco_stop_depth_m: Option<f64>,
    pub deco_stop_minutes: Option<f64>,
    pub gas: Option<String>,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiTank {
    pub sort_order: i64,
    pub is_double: bool,
    pub name: Option<String>,
    pub size_liters: Option<f64>,
    pub working_pressure_psi: Option<f64>,
    pub start_pressure_psi: Option<f64>,
    pub end_pressure_psi: Option<f64>,
    pub o2_percent: Option<f64>,
    pub he_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiDive {
    pub id: String,
    pub number: i64,
    pub start_time_unix: i64,
    pub duration_seconds: f64,
    pub max_depth_m: f64,
    pub avg_depth_m: f64,
    pub notes: String,
    pub site_name: Option<String>,
    pub buddy_names: Vec<String>,
    pub tags: Vec<String>,
    pub tanks: Vec<FfiTank>,
    pub samples: Vec<FfiSample>,
}

impl From<&DiveSample> for FfiSample {
    fn from(s: &DiveSample) -> Self {
        Self {
            time_seconds: s.time.as_secs_f64(),
            depth_m: s.depth_m,
            temperature_c: s.temperature_c,
            tank_pressure_bar: s.tank_pressure_bar,
            rmv_liters_per_min: s.rmv_liters_per_min,
            sac_bar_per_min: s.sac_bar_per_min,
            ppo2: s.ppo2,
            ndl_minutes: s.ndl_minutes,
            tts_minutes: s.tts_minutes,
            ascent_rate_mps: s.ascent_rate_mps,
            deco_stop_depth_m: s.deco_stop_depth_m,
            deco_stop_minutes: s.deco_stop_minutes,
            gas: s.gas.clone(),
        }
    }
}

impl From<&TankUsage> for FfiTank {
    fn from(t: &TankUsage) -> Self {
        Self {
            sort_order: t.sort_order,
            is_double: t.is_double,
            name: t.tank_name.clone(),
            size_liters: t.size_liters,
            working_pressure_psi: t.working_pressure_psi,
            start_pressure_psi: t.start_pressure_psi,
            end_pressure_psi: t.end_pressure_psi,
            o2_percent: t.o2_percent,
            he_percent: t.he_percent,
        }
    }
}

fn flatten_dive(log: &DiveLog, dive: &Dive) -> FfiDive {
    FfiDive {
        id: dive.id.0.clone(),
        number: dive.number,
        start_time_unix: dive.start_time.timestamp(),
        duration_seconds: dive.duration.as_secs_f64(),
        max_depth_m: dive.max_depth_m,
        avg_depth_m: dive.avg_depth_m,
        notes: dive.notes.clone(),
        site_name: log.site_of(dive).map(|s| s.name.clone()),
        buddy_names: log.buddies_of(dive).map(|b| b.name.clone()).collect(),
        tags: dive.tags.clone(),
        tanks: dive.tanks.iter().map(FfiTank::from).collect(),
        samples: dive.samples.iter().map(FfiSample::from).collect(),
    }
}

pub fn flatten(log: &DiveLog) -> Vec<FfiDive> {
    log.dives.iter().map(|dive| flatten_dive(log, dive)).collect()
}

/// Import a MacDive database. Settings come from the environment.
#[uniffi::export]
pub fn import_macdive(path: String) -> Result<Vec<FfiDive>, DiveLogError> {
    let log = orchestrator::import_macdive(&path, &ImportConfig::from_env())?;
    Ok(flatten(&log))
}

/// Import UDDF (or UDDF-like) XML text.
#[uniffi::export]
pub fn import_uddf(xml: String) -> Result<Vec<FfiDive>, DiveLogError> {
    let log = orchestrator::import_uddf(&xml, &ImportConfig::from_env())?;
    Ok(flatten(&log))
}

#[uniffi::export]
pub fn demo_dives() -> Vec<FfiDive> {
    flatten(&orchestrator::demo_dives())
}

#[uniffi::export]
pub fn synthesize_profile(number: i64, duration_seconds: f64, max_depth_m: f64) -> Vec<FfiSample> {
    let duration = Duration::try_from_secs_f64(duration_seconds).unwrap_or(Duration::ZERO);
    synthetic::generate(number, duration, max_depth_m)
        .iter()
        .map(FfiSample::from)
        .collect()
}

/// Route core logs to stderr. Safe to call more than once.
#[uniffi::export]
pub fn init_logging() -> bool {
    logging::init_tracing()
}
