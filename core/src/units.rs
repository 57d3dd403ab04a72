//! Canonical units and pure conversions.
//!
//! Everything the importers produce is stored in one unit system: meters,
//! Celsius, bar, liters, liters/minute, bar/minute and meters/second.
//! Conversions never round; rounding belongs to whoever displays the value.

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.280839895;

/// psi per bar.
pub const PSI_PER_BAR: f64 = 14.5037738;

/// Cubic feet per liter.
pub const CUFT_PER_LITER: f64 = 0.0353146667;

/// Liters per cubic foot, as used for cfm respiratory rates.
pub const LITERS_PER_CUFT: f64 = 28.3168466;

/// Pounds per kilogram.
pub const LB_PER_KG: f64 = 2.2046226218;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Pascals per bar.
pub const PA_PER_BAR: f64 = 100_000.0;

/// Meters of seawater per standard atmosphere, as used for ambient pressure.
pub const METERS_PER_ATM: f64 = 10.0;

pub fn meters_to_feet(m: f64) -> f64 {
    m * FEET_PER_METER
}

pub fn feet_to_meters(ft: f64) -> f64 {
    ft / FEET_PER_METER
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - KELVIN_OFFSET
}

pub fn bar_to_psi(bar: f64) -> f64 {
    bar * PSI_PER_BAR
}

pub fn psi_to_bar(psi: f64) -> f64 {
    psi / PSI_PER_BAR
}

pub fn pascal_to_bar(pa: f64) -> f64 {
    pa / PA_PER_BAR
}

pub fn kilopascal_to_bar(kpa: f64) -> f64 {
    kpa / 100.0
}

pub fn millibar_to_bar(mbar: f64) -> f64 {
    mbar / 1_000.0
}

pub fn liters_to_cuft(l: f64) -> f64 {
    l * CUFT_PER_LITER
}

pub fn cuft_to_liters(cuft: f64) -> f64 {
    cuft / CUFT_PER_LITER
}

pub fn kg_to_lb(kg: f64) -> f64 {
    kg * LB_PER_KG
}

pub fn lb_to_kg(lb: f64) -> f64 {
    lb / LB_PER_KG
}

/// Ambient pressure in atmospheres at the given depth of seawater.
pub fn ambient_pressure_atm(depth_m: f64) -> f64 {
    1.0 + depth_m / METERS_PER_ATM
}

/// Partial pressure of oxygen (atm) for a mix with `fo2` breathed at `depth_m`.
pub fn ppo2_at_depth(fo2: f64, depth_m: f64) -> f64 {
    fo2 * ambient_pressure_atm(depth_m)
}
