//! Heuristic UDDF importer.
//!
//! UDDF files in the wild rarely validate against the schema: namespaces are
//! missing or inconsistent, units vary by producer and profile points are
//! nested in whatever element the producer chose. Instead of walking the
//! schema this importer:
//!
//! - treats every element named `dive` (any namespace, any case) as a dive
//! - treats every element whose subtree holds both a `depth` and a
//!   `time`/`divetime`/`duration` element as a profile point
//! - normalizes each field through [`crate::xml::fields`]
//! - keeps the deepest point per timestamp and sorts by time
//!
//! Only a document that is not well-formed XML fails the import; anything
//! else degrades to unset fields or skipped points.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::models::{Dive, DiveLog, DiveSample, TankUsage};
use crate::orchestrator;
use crate::units;
use crate::xml::fields::{self, read_number};
use crate::xml::node::{decode_document, XmlNode};

const TIME_NAMES: [&str; 3] = ["time", "divetime", "duration"];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Import every dive in a UDDF-like document with default settings.
pub fn import(xml: &str) -> ImportResult<DiveLog> {
    import_with(xml, &ImportConfig::default())
}

/// Import from raw bytes (UTF-8, or UTF-16 with a byte order mark).
pub fn import_bytes(bytes: &[u8], config: &ImportConfig) -> ImportResult<DiveLog> {
    let text = decode_document(bytes)?;
    import_with(&text, config)
}

pub fn import_with(xml: &str, config: &ImportConfig) -> ImportResult<DiveLog> {
    let root = XmlNode::parse(xml)?;
    let dives = import_tree(&root, config);
    tracing::info!(
        dives = dives.len(),
        samples = dives.iter().map(|d| d.samples.len()).sum::<usize>(),
        "imported UDDF document"
    );
    Ok(DiveLog::from_dives(dives))
}

/// Run the heuristics over an already-built tree.
pub fn import_tree(root: &XmlNode, config: &ImportConfig) -> Vec<Dive> {
    let mut dive_nodes: Vec<&XmlNode> = Vec::new();
    if root.is_named("dive") {
        dive_nodes.push(root);
    }
    dive_nodes.extend(root.descendants().filter(|n| n.is_named("dive")));

    dive_nodes
        .into_iter()
        .map(|node| read_dive(node, root, config))
        .collect()
}

fn read_dive(node: &XmlNode, root: &XmlNode, config: &ImportConfig) -> Dive {
    let start_time = read_start_time(node).unwrap_or_else(Local::now);
    let number = node
        .first_descendant("divenumber")
        .and_then(|el| el.value().trim().parse::<i64>().ok())
        .unwrap_or(0);

    let mut dive = Dive::new(number, start_time);
    dive.notes = node
        .first_descendant("notes")
        .map(|el| el.value().trim().to_string())
        .unwrap_or_default();

    let mixes = GasMixLookup::build(node, root);
    let points = read_points(node, &mixes);

    if points.is_empty() {
        tracing::warn!(
            dive = number,
            "no profile points found, using placeholder summary"
        );
        let placeholder = &config.placeholder;
        dive.duration = placeholder.duration();
        dive.max_depth_m = placeholder.max_depth_m;
        dive.avg_depth_m = placeholder.avg_depth_m;
        orchestrator::ensure_profile(&mut dive, config);
    } else {
        dive.avg_depth_m = 0.0;
        dive.apply_profile(points);
    }

    if let Some(tank) = read_tank(node, &mixes) {
        dive.tanks.push(tank);
    }

    dive
}

/// First `datetime`, else first `date`, anywhere below the dive.
///
/// Nested elements are not excluded, so a date inside e.g. an equipment
/// block can win over the dive's own.
fn read_start_time(dive: &XmlNode) -> Option<DateTime<Local>> {
    let raw = dive
        .first_descendant("datetime")
        .or_else(|| dive.first_descendant("date"))?
        .value();
    let parsed = parse_datetime(raw.trim());
    if parsed.is_none() {
        tracing::debug!(
            error = %ImportError::unparsable("datetime", raw.trim()),
            "using current time"
        );
    }
    parsed
}

pub fn parse_datetime(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Local.from_local_datetime(&naive).earliest()
}

#[derive(Debug, Clone, PartialEq)]
struct GasMix {
    label: String,
    fo2: Option<f64>,
}

/// Mixes keyed by case-insensitive id, in registration order.
#[derive(Debug, Default)]
struct GasMixLookup {
    mixes: Vec<GasMix>,
    by_id: HashMap<String, usize>,
}

impl GasMixLookup {
    /// Mixes inside the dive first, then any others in the document.
    fn build(dive: &XmlNode, root: &XmlNode) -> Self {
        let mut lookup = GasMixLookup::default();
        for mix in dive.descendants().filter(|n| n.is_named("mix")) {
            lookup.register(mix, true);
        }
        for mix in root.descendants().filter(|n| n.is_named("mix")) {
            lookup.register(mix, false);
        }
        lookup
    }

    fn register(&mut self, node: &XmlNode, replace: bool) {
        let Some(id) = node.attribute("id").map(str::trim).filter(|id| !id.is_empty()) else {
            return;
        };
        let mix = GasMix {
            label: mix_label(node, id),
            fo2: node.first_descendant("o2").and_then(|el| read_number(&el.value())),
        };
        let key = id.to_lowercase();
        match self.by_id.get(&key) {
            Some(&slot) if replace => self.mixes[slot] = mix,
            Some(_) => {}
            None => {
                self.by_id.insert(key, self.mixes.len());
                self.mixes.push(mix);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&GasMix> {
        self.by_id
            .get(&id.trim().to_lowercase())
            .map(|&slot| &self.mixes[slot])
    }

    fn first(&self) -> Option<&GasMix> {
        self.mixes.first()
    }
}

/// Explicit name, else the fractions as percentages, else the id.
fn mix_label(node: &XmlNode, id: &str) -> String {
    if let Some(name) = node
        .first_descendant("name")
        .map(|el| el.value().trim().to_string())
        .filter(|name| !name.is_empty())
    {
        return name;
    }

    let parts: Vec<String> = [("o2", "O2"), ("he", "He"), ("n2", "N2")]
        .iter()
        .filter_map(|(tag, gas)| {
            let fraction = read_number(&node.first_descendant(tag)?.value())?;
            Some(format!("{}% {}", fields::percent_label(fraction), gas))
        })
        .collect();

    if parts.is_empty() {
        id.to_string()
    } else {
        parts.join(" / ")
    }
}

fn is_point(node: &XmlNode) -> bool {
    node.has_descendant("depth") && TIME_NAMES.iter().any(|name| node.has_descendant(name))
}

fn read_points(dive: &XmlNode, mixes: &GasMixLookup) -> Vec<DiveSample> {
    let fallback = mixes.first();
    let mut current_gas = fallback.map(|m| m.label.clone());
    let mut current_fo2 = fallback.and_then(|m| m.fo2);

    let mut points = Vec::new();

    for (index, node) in dive.descendants().filter(|n| is_point(n)).enumerate() {
        let Some(mut sample) = read_point(node) else {
            continue;
        };
        sample.index = index;

        if let Some(mix) = node
            .first_descendant("switchmix")
            .and_then(|el| el.attribute("ref"))
            .and_then(|id| mixes.get(id))
        {
            current_gas = Some(mix.label.clone());
            current_fo2 = mix.fo2;
        }

        sample.gas = node
            .first_descendant_of(&["gas", "gasname", "mix"])
            .map(|el| el.value().trim().to_string())
            .filter(|label| !label.is_empty())
            .or_else(|| current_gas.clone().filter(|label| !label.is_empty()));

        if sample.ppo2.is_none() {
            sample.ppo2 = current_fo2.map(|fo2| units::ppo2_at_depth(fo2, sample.depth_m));
        }

        points.push(sample);
    }

    points
}

/// Number and unit of the first descendant matching `names`.
fn number_in(node: &XmlNode, names: &[&'static str]) -> Option<(f64, Option<String>)> {
    let el = node.first_descendant_of(names)?;
    let raw = el.value();
    match read_number(&raw) {
        Some(value) => Some((value, el.unit().map(str::to_string))),
        None => {
            let field = names.first().copied().unwrap_or("value");
            tracing::debug!(error = %ImportError::unparsable(field, raw.trim()), "field unset");
            None
        }
    }
}

fn convert(
    node: &XmlNode,
    names: &[&'static str],
    to_canonical: fn(f64, Option<&str>) -> f64,
) -> Option<f64> {
    number_in(node, names).map(|(value, unit)| to_canonical(value, unit.as_deref()))
}

fn read_point(node: &XmlNode) -> Option<DiveSample> {
    let depth_m = convert(node, &["depth"], fields::depth_to_meters)?;

    let time_el = node.first_descendant_of(&TIME_NAMES)?;
    let raw_time = time_el.value();
    let Some(time) = fields::parse_time(&raw_time, time_el.unit()) else {
        tracing::debug!(error = %ImportError::unparsable("time", raw_time.trim()), "point dropped");
        return None;
    };

    Some(DiveSample {
        index: 0,
        time,
        depth_m,
        temperature_c: convert(node, &["temperature", "temp"], fields::temperature_to_celsius),
        tank_pressure_bar: convert(node, &["pressure", "tankpressure"], fields::pressure_to_bar),
        rmv_liters_per_min: convert(node, &["rmv"], fields::rmv_to_liters_per_min),
        sac_bar_per_min: convert(node, &["sac"], fields::sac_to_bar_per_min),
        ppo2: number_in(node, &["ppo2"]).map(|(v, _)| v),
        ndl_minutes: number_in(node, &["ndt", "ndl"]).map(|(v, _)| v),
        tts_minutes: number_in(node, &["tts"]).map(|(v, _)| v),
        ascent_rate_mps: convert(node, &["ascent", "ascentrate"], fields::ascent_rate_to_mps),
        deco_stop_depth_m: convert(node, &["decodepth", "stopdepth"], fields::deco_depth_to_meters),
        deco_stop_minutes: number_in(node, &["decotime", "stopminutes"]).map(|(v, _)| v),
        gas: None,
    })
}

/// Best-effort single tank from a `tankvolume` element.
fn read_tank(dive: &XmlNode, mixes: &GasMixLookup) -> Option<TankUsage> {
    let raw = dive.first_descendant("tankvolume")?.value();
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let Ok(volume) = raw.parse::<f64>() else {
        tracing::debug!(error = %ImportError::unparsable("tankvolume", raw), "tank skipped");
        return None;
    };

    Some(TankUsage {
        sort_order: 0,
        size_liters: Some(fields::tank_volume_liters(volume)),
        tank_name: Some("Tank 1".to_string()),
        o2_percent: mixes.first().and_then(|m| m.fo2).map(|fo2| fo2 * 100.0),
        ..TankUsage::default()
    })
}
