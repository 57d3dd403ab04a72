//! Builds linked [`Dive`] aggregates from a MacDive store.
//!
//! Independent tables are loaded first into maps keyed by `Z_PK`, then dive
//! headers are decoded and linked against them, then the join tables are
//! resolved once every dive exists. A row that points at a key we never
//! loaded only loses that one relation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::models::{
    Buddy, BuddyId, Dive, DiveConditions, DiveLog, DiveLogistics, DiveSite, RecorderInfo, SiteId,
    SupplyType, TankUsage, WaterType,
};
use crate::{orchestrator, synthetic};
use crate::relational::schema::{
    DiveLink, DiveRow, MacDiveReader, TankUsageRow, BUDDY_LINK_TABLE, TAG_LINK_TABLE,
};

/// Unix timestamp of the Core Data reference date, 2001-01-01T00:00:00Z.
pub const CORE_DATA_EPOCH_UNIX: i64 = 978_307_200;

/// Longest dive duration accepted from a header; anything longer is corrupt.
const MAX_DIVE_SECONDS: f64 = synthetic::MAX_TOTAL_MINUTES * 60.0;

/// Import every dive in the store with default settings.
pub fn import(path: impl AsRef<Path>) -> ImportResult<DiveLog> {
    MacDiveImporter::new(path).import_all()
}

pub fn import_with(path: impl AsRef<Path>, config: &ImportConfig) -> ImportResult<DiveLog> {
    MacDiveImporter::new(path)
        .with_config(config.clone())
        .import_all()
}

/// Convert Core Data absolute time to a local timestamp.
pub fn core_data_to_local(seconds: f64) -> Option<DateTime<Local>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    let secs = (whole as i64).checked_add(CORE_DATA_EPOCH_UNIX)?;
    DateTime::<Utc>::from_timestamp(secs, nanos).map(|utc| utc.with_timezone(&Local))
}

pub struct MacDiveImporter {
    path: PathBuf,
    config: ImportConfig,
}

impl MacDiveImporter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: ImportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn import_all(&self) -> ImportResult<DiveLog> {
        let reader = MacDiveReader::open(&self.path)?;
        let mut log = DiveLog::default();

        let sites = load_sites(&reader, &mut log)?;
        let buddies = load_buddies(&reader, &mut log)?;
        let tags: HashMap<i64, String> = reader
            .tags()?
            .into_iter()
            .map(|row| (row.pk, row.name.unwrap_or_default()))
            .collect();
        let mut tanks = load_tanks(&reader)?;

        let mut dive_index = HashMap::new();
        for row in reader.dives()? {
            let pk = row.pk;
            let mut dive = dive_from_row(row, &sites);
            dive.tanks = tanks.remove(&pk).unwrap_or_default();
            dive_index.insert(pk, log.dives.len());
            log.dives.push(dive);
        }
        for (dive_pk, orphaned) in &tanks {
            tracing::debug!(
                error = %ImportError::dangling("ZTANKANDGAS", *dive_pk),
                tanks = orphaned.len(),
                "tank usage skipped"
            );
        }

        for link in reader.buddy_links()? {
            let Some((dive, buddy_pk)) = resolve(&dive_index, link, BUDDY_LINK_TABLE) else {
                continue;
            };
            match buddies.get(&buddy_pk) {
                Some(id) => log.dives[dive].add_buddy(*id),
                None => tracing::debug!(
                    error = %ImportError::dangling(BUDDY_LINK_TABLE, buddy_pk),
                    "buddy link skipped"
                ),
            }
        }

        for link in reader.tag_links()? {
            let Some((dive, tag_pk)) = resolve(&dive_index, link, TAG_LINK_TABLE) else {
                continue;
            };
            match tags.get(&tag_pk) {
                Some(label) => {
                    log.dives[dive].add_tag(label);
                }
                None => tracing::debug!(
                    error = %ImportError::dangling(TAG_LINK_TABLE, tag_pk),
                    "tag link skipped"
                ),
            }
        }
        drop(reader);

        // The store has no sample table we can read yet, so every dive ends
        // up with a generated profile.
        let synthesized = log
            .dives
            .iter_mut()
            .filter(|dive| dive.samples.is_empty())
            .map(|dive| orchestrator::ensure_profile(dive, &self.config))
            .filter(|attached| *attached)
            .count();

        tracing::info!(
            path = %self.path.display(),
            dives = log.dives.len(),
            sites = log.sites.len(),
            buddies = log.buddies.len(),
            synthesized,
            "MacDive import finished"
        );
        Ok(log)
    }
}

fn load_sites(reader: &MacDiveReader, log: &mut DiveLog) -> ImportResult<HashMap<i64, SiteId>> {
    let mut ids = HashMap::new();
    for row in reader.sites()? {
        let id = log.add_site(DiveSite {
            name: row.name.unwrap_or_default(),
            location: row.location,
            country: row.country,
            latitude: row.latitude,
            longitude: row.longitude,
            water_type: row.water_type.as_deref().and_then(WaterType::parse),
            difficulty: row.difficulty,
            altitude_m: row.altitude,
            notes: row.notes,
        });
        ids.insert(row.pk, id);
    }
    Ok(ids)
}

fn load_buddies(reader: &MacDiveReader, log: &mut DiveLog) -> ImportResult<HashMap<i64, BuddyId>> {
    let mut ids = HashMap::new();
    for row in reader.buddies()? {
        let id = log.add_buddy(Buddy {
            name: row.name.unwrap_or_default(),
            external_id: row.uuid,
        });
        ids.insert(row.pk, id);
    }
    Ok(ids)
}

/// Tank usage rows grouped by dive key, each list in the source's order.
fn load_tanks(reader: &MacDiveReader) -> ImportResult<HashMap<i64, Vec<TankUsage>>> {
    let mut by_dive: HashMap<i64, Vec<TankUsage>> = HashMap::new();
    for row in reader.tank_usages()? {
        let Some(dive_pk) = row.dive_pk else {
            tracing::debug!("tank usage without a dive skipped");
            continue;
        };
        by_dive.entry(dive_pk).or_default().push(tank_from_row(row));
    }
    for tanks in by_dive.values_mut() {
        tanks.sort_by_key(|t| t.sort_order);
    }
    Ok(by_dive)
}

fn tank_from_row(row: TankUsageRow) -> TankUsage {
    TankUsage {
        sort_order: row.order.unwrap_or(0),
        is_double: flag(row.is_double),
        duration: row.duration.and_then(seconds),
        supply_type: row.supply_type.as_deref().and_then(SupplyType::parse),
        start_pressure_psi: row.air_start,
        end_pressure_psi: row.air_end,
        external_id: row.uuid,
        size_liters: row.tank_size,
        working_pressure_psi: row.working_pressure,
        tank_name: row.tank_name,
        tank_type: row.tank_type,
        o2_percent: row.oxygen,
        he_percent: row.helium,
        min_ppo2: row.min_ppo2,
        max_ppo2: row.max_ppo2,
    }
}

fn dive_from_row(row: DiveRow, sites: &HashMap<i64, SiteId>) -> Dive {
    let start_time = match row.raw_date {
        Some(raw) => core_data_to_local(raw).unwrap_or_else(|| {
            tracing::debug!(
                error = %ImportError::unparsable("ZRAWDATE", raw.to_string()),
                "start time unset"
            );
            unix_epoch()
        }),
        None => unix_epoch(),
    };

    let mut dive = Dive::new(row.number.unwrap_or(0), start_time);
    dive.duration = row
        .total_duration
        .and_then(|raw| {
            let duration = seconds(raw).filter(|d| d.as_secs_f64() <= MAX_DIVE_SECONDS);
            if duration.is_none() {
                tracing::debug!(
                    error = %ImportError::unparsable("ZTOTALDURATION", raw.to_string()),
                    "duration unset"
                );
            }
            duration
        })
        .unwrap_or(Duration::ZERO);
    dive.max_depth_m = row.max_depth.unwrap_or(0.0).max(0.0);
    dive.avg_depth_m = row.average_depth.unwrap_or(0.0).max(0.0);
    dive.notes = row.notes.unwrap_or_default();

    dive.site = row.site_pk.and_then(|pk| {
        let site = sites.get(&pk).copied();
        if site.is_none() {
            tracing::debug!(error = %ImportError::dangling("ZDIVESITE", pk), "site unset");
        }
        site
    });

    dive.repetitive_dive_number = row.repetitive_dive_number;
    dive.surface_interval_minutes = row.surface_interval.map(|s| s / 60.0);
    dive.rating = row.rating;
    dive.conditions = DiveConditions {
        air_temp_c: row.air_temp,
        water_temp_high_c: row.temp_high,
        water_temp_low_c: row.temp_low,
        weather: row.weather,
        current: row.current,
        surface_conditions: row.surface_conditions,
        visibility: row.visibility,
        entry_type: row.entry_type,
    };
    dive.recorder = RecorderInfo {
        has_decompression: flag(row.decompression),
        has_air_series: flag(row.has_air),
        has_ndt_series: flag(row.has_ndt),
        has_ppo2_series: flag(row.has_ppo2),
        has_temp_series: flag(row.has_temp),
        cns_percent: row.cns,
        deco_model: row.deco_model,
        gas_model: row.gas_model,
        sample_interval_sec: row.sample_interval,
    };
    dive.logistics = DiveLogistics {
        boat_captain: row.boat_captain,
        boat_name: row.boat_name,
        divemaster: row.divemaster,
        dive_operator: row.dive_operator,
    };
    dive
}

/// Resolve the dive side of a join row. Returns the dive's position in the
/// log and the other side's key.
fn resolve(
    dive_index: &HashMap<i64, usize>,
    link: DiveLink,
    table: &'static str,
) -> Option<(usize, i64)> {
    let (Some(dive_pk), Some(other_pk)) = (link.dive_pk, link.other_pk) else {
        tracing::debug!(table, "join row with NULL key skipped");
        return None;
    };
    match dive_index.get(&dive_pk) {
        Some(idx) => Some((*idx, other_pk)),
        None => {
            tracing::debug!(error = %ImportError::dangling(table, dive_pk), "join row skipped");
            None
        }
    }
}

fn flag(value: Option<i64>) -> bool {
    value.is_some_and(|v| v != 0)
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

fn unix_epoch() -> DateTime<Local> {
    DateTime::<Utc>::default().with_timezone(&Local)
}
