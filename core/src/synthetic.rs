//! Synthetic dive profiles.
//!
//! Builds a plausible, dive-computer-like sample series from summary
//! statistics for dives whose source carries no real profile. Output is a
//! pure function of `(dive number, duration, max depth)`: the noise comes from
//! a PRNG seeded with those inputs, so the same dive always draws the same
//! graph.
//!
//! The gas, temperature and nitrogen models are illustrative only. None of
//! the NDL/TTS values produced here are fit for dive planning.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Dive, DiveSample};
use crate::units;

/// Shortest profile generated, in minutes.
const MIN_TOTAL_MINUTES: f64 = 10.0;

/// Longest profile generated, in minutes. Longer durations are clamped.
pub const MAX_TOTAL_MINUTES: f64 = 24.0 * 60.0;

/// Minimum number of steps; otherwise two per minute.
const MIN_STEPS: usize = 40;
const STEPS_PER_MINUTE: f64 = 2.0;

/// Fractions of the dive spent descending and at which the ascent begins.
const DESCENT_END: f64 = 0.15;
const ASCENT_START: f64 = 0.8;

/// Sinusoidal wobble amplitude applied to the depth curve.
const WOBBLE: f64 = 0.03;

/// Aluminium 80 filled to 3000 psi.
const START_PRESSURE_PSI: f64 = 3000.0;
const TANK_VOLUME_CUFT: f64 = 80.0;

/// Surface-equivalent consumption at the surface and at full depth (ft³/min).
const SAC_SURFACE_CUFT: f64 = 0.4;
const SAC_DEPTH_SPAN_CUFT: f64 = 0.6;

const SURFACE_TEMP_C: f64 = 20.0;
const BOTTOM_TEMP_DROP_C: f64 = 8.0;
const TEMP_NOISE_C: f64 = 0.3;

/// Nitrox 32.
const FO2: f64 = 0.32;
const GAS_LABEL: &str = "EAN32";

/// Toy nitrogen budget and the depth above which loading is ignored.
const NITROGEN_THRESHOLD: f64 = 1000.0;
const LOADING_FLOOR_M: f64 = 5.0;
const LOADING_EXPONENT: f64 = 1.3;
const NDL_SHALLOW_LIMIT_M: f64 = 6.0;
const NDL_UNLIMITED: f64 = 999.0;

/// Ascent model: 9 m/min plus a 3 minute safety stop below 9 m.
const ASCENT_RATE_M_PER_MIN: f64 = 9.0;
const SAFETY_STOP_DEPTH_M: f64 = 9.0;
const SAFETY_STOP_MIN: f64 = 3.0;
const MAX_DECO_PENALTY_MIN: f64 = 20.0;

/// Seed shared by every draw for one dive.
pub fn profile_seed(dive_number: i64, total_minutes: f64) -> u64 {
    dive_number
        .wrapping_mul(1337)
        .wrapping_add(total_minutes.round() as i64) as u64
}

/// Generate a synthetic profile for a dive from its summary fields.
pub fn for_dive(dive: &Dive) -> Vec<DiveSample> {
    generate(dive.number, dive.duration, dive.max_depth_m)
}

/// Generate a deterministic synthetic profile.
///
/// Dives shorter than ten minutes are stretched to ten and dives longer than a
/// day are cut to a day. The last sample lands exactly on the adjusted
/// duration.
pub fn generate(dive_number: i64, duration: Duration, max_depth_m: f64) -> Vec<DiveSample> {
    let max_depth_m = if max_depth_m.is_finite() {
        max_depth_m.max(0.0)
    } else {
        0.0
    };

    let total_minutes =
        (duration.as_secs_f64() / 60.0).clamp(MIN_TOTAL_MINUTES, MAX_TOTAL_MINUTES);
    let steps = ((total_minutes * STEPS_PER_MINUTE) as usize).max(MIN_STEPS);
    let minutes_per_step = total_minutes / steps as f64;
    let total_ms = (total_minutes * 60_000.0).round() as u128;

    let mut rng = StdRng::seed_from_u64(profile_seed(dive_number, total_minutes));

    let psi_per_cuft = START_PRESSURE_PSI / TANK_VOLUME_CUFT;
    let mut pressure_psi = START_PRESSURE_PSI;
    let mut nitrogen_load = 0.0;
    let depth_scale = max_depth_m.max(1.0);
    let bottom_temp_c = SURFACE_TEMP_C - BOTTOM_TEMP_DROP_C;

    let mut samples = Vec::with_capacity(steps + 1);

    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let time = Duration::from_millis((total_ms * i as u128 / steps as u128) as u64);

        // Down, flat, up.
        let mut depth = if t < DESCENT_END {
            t / DESCENT_END * max_depth_m
        } else if t > ASCENT_START {
            (1.0 - t) / (1.0 - ASCENT_START) * max_depth_m
        } else {
            max_depth_m
        };
        depth *= 1.0 - WOBBLE + WOBBLE * (t * std::f64::consts::PI * 4.0).sin();
        depth += rng.gen::<f64>() - 0.5;
        depth = depth.clamp(0.0, max_depth_m + 1.0);

        let ambient_atm = units::ambient_pressure_atm(depth);
        let depth_fraction = depth / depth_scale;

        let mut sac_cuft = SAC_SURFACE_CUFT + SAC_DEPTH_SPAN_CUFT * depth_fraction;
        sac_cuft *= 0.9 + 0.2 * rng.gen::<f64>();

        let gas_used_cuft = sac_cuft * ambient_atm * minutes_per_step;
        pressure_psi = (pressure_psi - gas_used_cuft * psi_per_cuft).max(0.0);

        let mut temperature_c =
            SURFACE_TEMP_C * (1.0 - depth_fraction) + bottom_temp_c * depth_fraction;
        temperature_c += (rng.gen::<f64>() - 0.5) * TEMP_NOISE_C;

        let load_rate = ((depth - LOADING_FLOOR_M).max(0.0) + 1.0).powf(LOADING_EXPONENT);
        nitrogen_load += load_rate * minutes_per_step;

        let (ndl, deficit) = if depth < NDL_SHALLOW_LIMIT_M {
            (NDL_UNLIMITED, 0.0)
        } else {
            let remaining = (NITROGEN_THRESHOLD - nitrogen_load) / load_rate;
            if remaining > 0.0 {
                (remaining, 0.0)
            } else {
                (0.0, (-remaining).min(MAX_DECO_PENALTY_MIN))
            }
        };

        let mut ascent_minutes = depth / ASCENT_RATE_M_PER_MIN;
        if depth > SAFETY_STOP_DEPTH_M {
            ascent_minutes += SAFETY_STOP_MIN;
        }

        samples.push(DiveSample {
            index: i,
            time,
            depth_m: depth,
            temperature_c: Some(temperature_c),
            tank_pressure_bar: Some(units::psi_to_bar(pressure_psi.round())),
            rmv_liters_per_min: Some(units::cuft_to_liters(sac_cuft)),
            sac_bar_per_min: Some(units::psi_to_bar(sac_cuft * psi_per_cuft)),
            ppo2: Some(units::ppo2_at_depth(FO2, depth)),
            ndl_minutes: Some(ndl),
            tts_minutes: Some(ascent_minutes + deficit),
            gas: Some(GAS_LABEL.to_string()),
            ..DiveSample::default()
        });
    }

    samples
}
