use std::time::Duration;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::profile::{self, ProfileSummary};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiveId(pub String);

impl DiveId {
    pub fn new() -> Self {
        DiveId(Uuid::new_v4().to_string())
    }
}

impl Default for DiveId {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of a site inside the owning [`DiveLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SiteId(pub usize);

/// Index of a buddy inside the owning [`DiveLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuddyId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaterType {
    Salt,
    Fresh,
    Other(String),
}

impl WaterType {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_ascii_lowercase().as_str() {
            "salt" | "saltwater" | "salt water" | "sea" => WaterType::Salt,
            "fresh" | "freshwater" | "fresh water" => WaterType::Fresh,
            _ => WaterType::Other(trimmed.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupplyType {
    OpenCircuit,
    ClosedCircuit,
    Bailout,
    Other(String),
}

impl SupplyType {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_ascii_lowercase().as_str() {
            "oc" | "open circuit" | "open-circuit" | "opencircuit" => SupplyType::OpenCircuit,
            "cc" | "ccr" | "closed circuit" | "closed-circuit" | "closedcircuit" | "rebreather" => {
                SupplyType::ClosedCircuit
            }
            "bailout" | "bail-out" | "bo" => SupplyType::Bailout,
            _ => SupplyType::Other(trimmed.to_string()),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiveSite {
    pub name: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub water_type: Option<WaterType>,
    pub difficulty: Option<String>,
    pub altitude_m: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Buddy {
    pub name: String,
    /// Identifier assigned by the source system.
    pub external_id: Option<String>,
}

/// One cylinder / gas leg of a dive.
///
/// Pressures stay in psi, the fixed convention of the relational source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TankUsage {
    pub sort_order: i64,
    pub is_double: bool,
    pub duration: Option<Duration>,
    pub supply_type: Option<SupplyType>,
    pub start_pressure_psi: Option<f64>,
    pub end_pressure_psi: Option<f64>,
    pub external_id: Option<String>,
    pub size_liters: Option<f64>,
    pub working_pressure_psi: Option<f64>,
    pub tank_name: Option<String>,
    pub tank_type: Option<String>,
    pub o2_percent: Option<f64>,
    pub he_percent: Option<f64>,
    pub min_ppo2: Option<f64>,
    pub max_ppo2: Option<f64>,
}

/// One profile point. All values are canonical units.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiveSample {
    pub index: usize,
    /// Elapsed time since the start of the dive.
    pub time: Duration,
    pub depth_m: f64,
    pub temperature_c: Option<f64>,
    pub tank_pressure_bar: Option<f64>,
    /// Surface-equivalent respiratory minute volume.
    pub rmv_liters_per_min: Option<f64>,
    /// Surface-equivalent consumption as pressure drop.
    pub sac_bar_per_min: Option<f64>,
    /// Partial pressure of O2 in atm.
    pub ppo2: Option<f64>,
    pub ndl_minutes: Option<f64>,
    pub tts_minutes: Option<f64>,
    /// Positive while ascending.
    pub ascent_rate_mps: Option<f64>,
    pub deco_stop_depth_m: Option<f64>,
    pub deco_stop_minutes: Option<f64>,
    pub gas: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiveConditions {
    pub air_temp_c: Option<f64>,
    pub water_temp_high_c: Option<f64>,
    pub water_temp_low_c: Option<f64>,
    pub weather: Option<String>,
    pub current: Option<String>,
    pub surface_conditions: Option<String>,
    pub visibility: Option<String>,
    pub entry_type: Option<String>,
}

/// What the recording computer reported about the dive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecorderInfo {
    pub has_decompression: bool,
    pub has_air_series: bool,
    pub has_ndt_series: bool,
    pub has_ppo2_series: bool,
    pub has_temp_series: bool,
    pub cns_percent: Option<f64>,
    pub deco_model: Option<String>,
    pub gas_model: Option<String>,
    pub sample_interval_sec: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiveLogistics {
    pub boat_captain: Option<String>,
    pub boat_name: Option<String>,
    pub divemaster: Option<String>,
    pub dive_operator: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Dive {
    pub id: DiveId,
    pub number: i64,
    pub start_time: DateTime<Local>,
    pub duration: Duration,
    pub max_depth_m: f64,
    pub avg_depth_m: f64,
    pub notes: String,
    pub samples: Vec<DiveSample>,
    pub site: Option<SiteId>,
    pub buddies: Vec<BuddyId>,
    pub tags: Vec<String>,
    pub tanks: Vec<TankUsage>,
    pub repetitive_dive_number: Option<i64>,
    pub surface_interval_minutes: Option<f64>,
    pub rating: Option<f64>,
    pub conditions: DiveConditions,
    pub recorder: RecorderInfo,
    pub logistics: DiveLogistics,
}

impl Dive {
    pub fn new(number: i64, start_time: DateTime<Local>) -> Self {
        Self {
            id: DiveId::new(),
            number,
            start_time,
            duration: Duration::ZERO,
            max_depth_m: 0.0,
            avg_depth_m: 0.0,
            notes: String::new(),
            samples: Vec::new(),
            site: None,
            buddies: Vec::new(),
            tags: Vec::new(),
            tanks: Vec::new(),
            repetitive_dive_number: None,
            surface_interval_minutes: None,
            rating: None,
            conditions: DiveConditions::default(),
            recorder: RecorderInfo::default(),
            logistics: DiveLogistics::default(),
        }
    }

    /// Add a tag label unless it is blank or already present.
    ///
    /// Labels are case-sensitive. Returns whether the label was inserted.
    pub fn add_tag(&mut self, label: &str) -> bool {
        if label.trim().is_empty() || self.tags.iter().any(|t| t == label) {
            return false;
        }
        self.tags.push(label.to_string());
        true
    }

    pub fn add_buddy(&mut self, buddy: BuddyId) {
        if !self.buddies.contains(&buddy) {
            self.buddies.push(buddy);
        }
    }

    /// Attach a profile and re-derive the summary fields from it.
    ///
    /// The points are deduplicated and sorted first. Duration and max depth
    /// always follow the series; a recorded average depth is kept unless it
    /// exceeds the new maximum (or none was recorded), in which case the
    /// sample mean replaces it.
    pub fn apply_profile(&mut self, points: Vec<DiveSample>) {
        let samples = profile::finalize_samples(points);
        if let Some(summary) = ProfileSummary::from_samples(&samples) {
            self.duration = summary.duration;
            self.max_depth_m = summary.max_depth_m;
            if self.avg_depth_m <= 0.0 || self.avg_depth_m > summary.max_depth_m {
                self.avg_depth_m = summary.avg_depth_m;
            }
        }
        self.samples = samples;
    }

    /// Returns a description of every violated model invariant.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.avg_depth_m < 0.0 {
            violations.push(format!("negative average depth {}", self.avg_depth_m));
        }
        if self.max_depth_m < self.avg_depth_m {
            violations.push(format!(
                "max depth {} below average depth {}",
                self.max_depth_m, self.avg_depth_m
            ));
        }

        for pair in self.samples.windows(2) {
            if pair[1].time <= pair[0].time {
                violations.push(format!(
                    "sample {} at {:?} does not follow {:?}",
                    pair[1].index, pair[1].time, pair[0].time
                ));
            }
        }

        if let Some(summary) = ProfileSummary::from_samples(&self.samples) {
            if summary.max_depth_m != self.max_depth_m {
                violations.push(format!(
                    "max depth {} differs from profile maximum {}",
                    self.max_depth_m, summary.max_depth_m
                ));
            }
            if summary.duration != self.duration {
                violations.push(format!(
                    "duration {:?} differs from last sample time {:?}",
                    self.duration, summary.duration
                ));
            }
        }

        violations
    }
}

/// Result of an import: dives plus the sites and buddies they share.
#[derive(Clone, Debug, Default)]
pub struct DiveLog {
    pub sites: Vec<DiveSite>,
    pub buddies: Vec<Buddy>,
    pub dives: Vec<Dive>,
}

impl DiveLog {
    pub fn from_dives(dives: Vec<Dive>) -> Self {
        Self {
            dives,
            ..Self::default()
        }
    }

    pub fn add_site(&mut self, site: DiveSite) -> SiteId {
        self.sites.push(site);
        SiteId(self.sites.len() - 1)
    }

    pub fn add_buddy(&mut self, buddy: Buddy) -> BuddyId {
        self.buddies.push(buddy);
        BuddyId(self.buddies.len() - 1)
    }

    pub fn site(&self, id: SiteId) -> Option<&DiveSite> {
        self.sites.get(id.0)
    }

    pub fn buddy(&self, id: BuddyId) -> Option<&Buddy> {
        self.buddies.get(id.0)
    }

    pub fn site_of(&self, dive: &Dive) -> Option<&DiveSite> {
        dive.site.and_then(|id| self.site(id))
    }

    pub fn buddies_of<'a>(&'a self, dive: &'a Dive) -> impl Iterator<Item = &'a Buddy> + 'a {
        dive.buddies.iter().filter_map(move |id| self.buddy(*id))
    }
}
