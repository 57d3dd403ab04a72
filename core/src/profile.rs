//! Profile finalization and summary derivation.
//!
//! Pure functions over sample series, shared by every importer and the
//! synthetic generator. No storage or document dependencies.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::DiveSample;

/// Summary of a finalized sample series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSummary {
    /// Time of the last sample
    pub duration: Duration,
    /// Deepest sample
    pub max_depth_m: f64,
    /// Arithmetic mean over samples
    pub avg_depth_m: f64,
}

impl ProfileSummary {
    /// Summarize a series. Returns `None` for an empty series.
    pub fn from_samples(samples: &[DiveSample]) -> Option<Self> {
        let last = samples.last()?;

        let mut max_depth_m = f64::MIN;
        let mut depth_sum = 0.0;
        for sample in samples {
            if sample.depth_m > max_depth_m {
                max_depth_m = sample.depth_m;
            }
            depth_sum += sample.depth_m;
        }

        Some(ProfileSummary {
            duration: last.time,
            max_depth_m,
            avg_depth_m: depth_sum / samples.len() as f64,
        })
    }
}

/// Keep one sample per timestamp and order the series by time.
///
/// Among samples sharing a timestamp the deepest one wins; on equal depth the
/// earliest one in input order is kept. Indices are reassigned from zero.
pub fn finalize_samples(points: Vec<DiveSample>) -> Vec<DiveSample> {
    let mut by_time: BTreeMap<Duration, DiveSample> = BTreeMap::new();

    for point in points {
        match by_time.get(&point.time) {
            Some(kept) if kept.depth_m >= point.depth_m => {}
            _ => {
                by_time.insert(point.time, point);
            }
        }
    }

    by_time
        .into_values()
        .enumerate()
        .map(|(index, mut sample)| {
            sample.index = index;
            sample
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t_sec: u64, depth_m: f64, gas: &str) -> DiveSample {
        DiveSample {
            time: Duration::from_secs(t_sec),
            depth_m,
            gas: Some(gas.to_string()),
            ..DiveSample::default()
        }
    }

    #[test]
    fn test_finalize_dedups_and_sorts() {
        let samples = finalize_samples(vec![
            sample(30, 5.0, "a"),
            sample(0, 0.0, "b"),
            sample(30, 7.5, "c"),
            sample(10, 2.0, "d"),
            sample(30, 6.0, "e"),
        ]);

        let times: Vec<u64> = samples.iter().map(|s| s.time.as_secs()).collect();
        assert_eq!(times, vec![0, 10, 30]);
        assert_eq!(samples[2].depth_m, 7.5);
        assert_eq!(samples[2].gas.as_deref(), Some("c"));
        let indices: Vec<usize> = samples.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_finalize_tie_keeps_first() {
        let samples = finalize_samples(vec![sample(60, 9.0, "first"), sample(60, 9.0, "second")]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].gas.as_deref(), Some("first"));
    }

    #[test]
    fn test_finalize_empty() {
        assert!(finalize_samples(Vec::new()).is_empty());
    }

    #[test]
    fn test_summary() {
        let samples = finalize_samples(vec![
            sample(0, 0.0, "x"),
            sample(60, 12.0, "x"),
            sample(120, 18.0, "x"),
            sample(180, 6.0, "x"),
        ]);
        let summary = ProfileSummary::from_samples(&samples).unwrap();
        assert_eq!(summary.duration, Duration::from_secs(180));
        assert_eq!(summary.max_depth_m, 18.0);
        assert!((summary.avg_depth_m - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_empty() {
        assert!(ProfileSummary::from_samples(&[]).is_none());
    }
}
