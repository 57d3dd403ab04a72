//! Entry points that pick an importer and complete its output.
//!
//! Every import path funnels through [`ensure_profile`], so a dive handed
//! back to a caller always has a profile unless synthesis was switched off.

use std::path::Path;
use std::time::Duration;

use chrono::{Duration as TimeDelta, Local};

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::models::{Dive, DiveLog, DiveSite};
use crate::{relational, synthetic, xml};

/// Attach a synthetic profile to a dive that has none.
///
/// Returns whether a profile was generated. Dives that already carry samples
/// are left untouched.
pub fn ensure_profile(dive: &mut Dive, config: &ImportConfig) -> bool {
    if !dive.samples.is_empty() || !config.synthesize_missing_profiles {
        return false;
    }
    let samples = synthetic::for_dive(dive);
    dive.apply_profile(samples);
    tracing::debug!(
        dive = dive.number,
        samples = dive.samples.len(),
        "synthetic profile attached"
    );
    true
}

/// Run [`ensure_profile`] over a whole log. Returns how many dives changed.
pub fn complete_profiles(log: &mut DiveLog, config: &ImportConfig) -> usize {
    log.dives
        .iter_mut()
        .map(|dive| ensure_profile(dive, config))
        .filter(|attached| *attached)
        .count()
}

pub fn import_macdive(path: impl AsRef<Path>, config: &ImportConfig) -> ImportResult<DiveLog> {
    let mut log = relational::import_with(path, config)?;
    complete_profiles(&mut log, config);
    Ok(log)
}

pub fn import_uddf(xml_text: &str, config: &ImportConfig) -> ImportResult<DiveLog> {
    let mut log = xml::uddf::import_with(xml_text, config)?;
    complete_profiles(&mut log, config);
    Ok(log)
}

pub fn import_uddf_file(path: impl AsRef<Path>, config: &ImportConfig) -> ImportResult<DiveLog> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImportError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut log = xml::uddf::import_bytes(&bytes, config)?;
    complete_profiles(&mut log, config);
    Ok(log)
}

struct DemoDive {
    number: i64,
    days_ago: i64,
    minutes: u64,
    max_depth_m: f64,
    avg_depth_m: f64,
    site: &'static str,
    notes: &'static str,
}

const DEMO_DIVES: [DemoDive; 2] = [
    DemoDive {
        number: 1,
        days_ago: 1,
        minutes: 46,
        max_depth_m: 21.3,
        avg_depth_m: 14.8,
        site: "La Jolla Shores",
        notes: "La Jolla Shores – skills and scooter play",
    },
    DemoDive {
        number: 2,
        days_ago: 7,
        minutes: 54,
        max_depth_m: 32.0,
        avg_depth_m: 20.1,
        site: "Yukon",
        notes: "Yukon – nice viz, mild current",
    },
];

/// Two canned dives with synthetic profiles, for hosts that want something
/// to render before the first import.
pub fn demo_dives() -> DiveLog {
    let now = Local::now();
    let mut log = DiveLog::default();
    for demo in &DEMO_DIVES {
        let site = log.add_site(DiveSite {
            name: demo.site.to_string(),
            ..DiveSite::default()
        });
        let mut dive = Dive::new(demo.number, now - TimeDelta::days(demo.days_ago));
        dive.duration = Duration::from_secs(demo.minutes * 60);
        dive.max_depth_m = demo.max_depth_m;
        dive.avg_depth_m = demo.avg_depth_m;
        dive.notes = demo.notes.to_string();
        dive.site = Some(site);
        log.dives.push(dive);
    }
    complete_profiles(&mut log, &ImportConfig::default());
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiveSample;
    use crate::relational::fixture::Store;

    #[test]
    fn test_ensure_profile_respects_existing_samples() {
        let mut dive = Dive::new(3, Local::now());
        dive.apply_profile(vec![
            DiveSample::default(),
            DiveSample {
                time: Duration::from_secs(60),
                depth_m: 6.0,
                ..DiveSample::default()
            },
        ]);
        assert!(!ensure_profile(&mut dive, &ImportConfig::default()));
        assert_eq!(dive.samples.len(), 2);
    }

    #[test]
    fn test_ensure_profile_synthesizes() {
        let mut dive = Dive::new(3, Local::now());
        dive.duration = Duration::from_secs(30 * 60);
        dive.max_depth_m = 18.0;
        dive.avg_depth_m = 10.0;

        assert!(ensure_profile(&mut dive, &ImportConfig::default()));
        assert_eq!(dive.samples.len(), 61);
        assert_eq!(dive.duration, Duration::from_secs(30 * 60));
        assert_eq!(dive.avg_depth_m, 10.0);
        assert!(dive.check_invariants().is_empty());

        let disabled = ImportConfig {
            synthesize_missing_profiles: false,
            ..ImportConfig::default()
        };
        let mut bare = Dive::new(4, Local::now());
        assert!(!ensure_profile(&mut bare, &disabled));
        assert!(bare.samples.is_empty());
    }

    #[test]
    fn test_demo_dives() {
        let log = demo_dives();
        assert_eq!(log.dives.len(), 2);
        assert_eq!(log.sites.len(), 2);

        let first = &log.dives[0];
        assert_eq!(first.duration, Duration::from_secs(46 * 60));
        assert_eq!(first.avg_depth_m, 14.8);
        assert_eq!(log.site_of(first).map(|s| s.name.as_str()), Some("La Jolla Shores"));
        assert!(first.start_time > log.dives[1].start_time);

        let second = &log.dives[1];
        assert_eq!(second.samples.len(), 109);
        assert_eq!(second.notes, "Yukon – nice viz, mild current");
        for dive in &log.dives {
            assert!(dive.check_invariants().is_empty(), "{:?}", dive.check_invariants());
        }
    }

    #[test]
    fn test_import_macdive_and_uddf() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path());
        store.dive(1, 1, 2400.0, 20.0, None);
        let log = import_macdive(&store.path, &ImportConfig::default()).unwrap();
        assert!(!log.dives[0].samples.is_empty());

        let xml = "<uddf><profiledata><repetitiongroup>\
                   <dive><divenumber>4</divenumber></dive>\
                   </repetitiongroup></profiledata></uddf>";
        let log = import_uddf(xml, &ImportConfig::default()).unwrap();
        assert_eq!(log.dives.len(), 1);
        assert_eq!(log.dives[0].number, 4);
        assert_eq!(log.dives[0].duration, Duration::from_secs(30 * 60));
        assert!(!log.dives[0].samples.is_empty());

        assert!(matches!(
            import_uddf("<uddf><dive>", &ImportConfig::default()),
            Err(ImportError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_import_uddf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.uddf");
        std::fs::write(&path, "\u{feff}<uddf><dive/></uddf>").unwrap();
        let log = import_uddf_file(&path, &ImportConfig::default()).unwrap();
        assert_eq!(log.dives.len(), 1);

        let missing = dir.path().join("missing.uddf");
        assert!(matches!(
            import_uddf_file(missing, &ImportConfig::default()),
            Err(ImportError::Unreadable { .. })
        ));
    }
}
