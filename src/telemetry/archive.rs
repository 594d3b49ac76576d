//! Local telemetry archive backend.
//!
//! One CSV per sensor at `<data_root>/<MSID>.csv` with a `TIME,VALUE` header.
//! `TIME` is a mission calendar string or plain mission seconds. A file whose
//! values do not all parse as numbers is a state-valued (categorical) sensor.
//!
//! Statistic resolutions bin samples into fixed windows aligned to the mission
//! epoch and label each bin at its midpoint.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{TelemetryError, TelemetrySource};
use crate::config::ArchiveConfig;
use crate::mission_time::{self, MissionSeconds};
use crate::tables::csv::{csv_split, is_null_cell};
use crate::types::{IntervalStats, Resolution, SensorSeries, SeriesValues};

pub struct ArchiveSource {
    data_root: PathBuf,
}

impl ArchiveSource {
    pub fn new(config: ArchiveConfig) -> Self {
        Self {
            data_root: config.data_root,
        }
    }

    /// Path of the archive file for an MSID.
    pub fn msid_path(&self, msid: &str) -> PathBuf {
        self.data_root.join(format!("{}.csv", msid.trim().to_uppercase()))
    }
}

/// Raw samples read from one archive file, before resolution is applied.
struct RawSamples {
    times: Vec<MissionSeconds>,
    cells: Vec<String>,
}

fn read_samples(
    path: &Path,
    start: MissionSeconds,
    end: MissionSeconds,
) -> Result<RawSamples, TelemetryError> {
    let file = File::open(path).map_err(|e| TelemetryError::Io(path.to_path_buf(), e))?;
    let reader = BufReader::new(file);
    let file_name = path.display().to_string();

    let mut lines = reader.lines().enumerate();
    let (time_col, value_col) = match lines.next() {
        Some((_, header)) => {
            let header = header.map_err(|e| TelemetryError::Io(path.to_path_buf(), e))?;
            let cols: Vec<String> = csv_split(header.trim_start_matches('\u{feff}'))
                .iter()
                .map(|c| c.to_uppercase())
                .collect();
            let find = |name: &str| {
                cols.iter().position(|c| c == name).ok_or_else(|| TelemetryError::Malformed {
                    file: file_name.clone(),
                    line: 1,
                    reason: format!("missing column {name}"),
                })
            };
            (find("TIME")?, find("VALUE")?)
        }
        None => {
            return Ok(RawSamples {
                times: Vec::new(),
                cells: Vec::new(),
            })
        }
    };

    let mut samples: Vec<(MissionSeconds, String)> = Vec::new();
    for (idx, line) in lines {
        let line = line.map_err(|e| TelemetryError::Io(path.to_path_buf(), e))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv_split(&line);
        let time_cell = fields.get(time_col).map(|s| s.trim()).unwrap_or("");
        let value_cell = fields.get(value_col).map(|s| s.trim()).unwrap_or("");
        if is_null_cell(value_cell) {
            continue;
        }

        let t = mission_time::parse_time(time_cell).map_err(|e| TelemetryError::Malformed {
            file: file_name.clone(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        if t >= start && t <= end {
            samples.push((t, value_cell.to_string()));
        }
    }

    // Archive files are append-only but not guaranteed sorted
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (times, cells) = samples.into_iter().unzip();
    Ok(RawSamples { times, cells })
}

/// Parse every cell as a number, or `None` if any cell is not numeric.
fn numeric_cells(cells: &[String]) -> Option<Vec<f64>> {
    cells.iter().map(|c| c.parse::<f64>().ok()).collect()
}

/// Bin numeric samples into fixed windows labelled at the window midpoint.
fn aggregate(times: &[MissionSeconds], values: &[f64], window: f64) -> (Vec<f64>, Vec<f64>, IntervalStats) {
    let mut bins: BTreeMap<i64, (f64, f64, f64, usize)> = BTreeMap::new();
    for (&t, &v) in times.iter().zip(values) {
        let entry = bins
            .entry((t / window).floor() as i64)
            .or_insert((0.0, f64::INFINITY, f64::NEG_INFINITY, 0));
        entry.0 += v;
        entry.1 = entry.1.min(v);
        entry.2 = entry.2.max(v);
        entry.3 += 1;
    }

    let mut mids = Vec::with_capacity(bins.len());
    let mut means = Vec::with_capacity(bins.len());
    let mut stats = IntervalStats::default();
    for (idx, (sum, min, max, count)) in bins {
        mids.push((idx as f64 + 0.5) * window);
        means.push(sum / count as f64);
        stats.mins.push(min);
        stats.maxes.push(max);
        stats.counts.push(count);
    }
    (mids, means, stats)
}

/// Keep the first state of each window for a categorical sensor.
fn sample_states(times: &[MissionSeconds], cells: Vec<String>, window: f64) -> (Vec<f64>, Vec<String>) {
    let mut out_times: Vec<f64> = Vec::new();
    let mut out_states = Vec::new();
    let mut last_bin: Option<i64> = None;
    for (&t, state) in times.iter().zip(cells) {
        let bin = (t / window).floor() as i64;
        if last_bin != Some(bin) {
            out_times.push((bin as f64 + 0.5) * window);
            out_states.push(state);
            last_bin = Some(bin);
        }
    }
    (out_times, out_states)
}

#[async_trait]
impl TelemetrySource for ArchiveSource {
    async fn fetch(
        &self,
        msid: &str,
        start: MissionSeconds,
        end: MissionSeconds,
        resolution: Resolution,
    ) -> Result<SensorSeries, TelemetryError> {
        if resolution == Resolution::Reduced {
            return Err(TelemetryError::UnsupportedResolution {
                backend: "archive",
                resolution,
            });
        }

        let path = self.msid_path(msid);
        if !path.exists() {
            return Err(TelemetryError::UnknownMsid(msid.to_string()));
        }

        let raw = read_samples(&path, start, end)?;
        debug!(msid, samples = raw.times.len(), %resolution, "Read archive samples");

        let mut series = SensorSeries::empty(msid, resolution);
        match (numeric_cells(&raw.cells), resolution.window_secs()) {
            (Some(values), None) => {
                series.times = raw.times;
                series.values = SeriesValues::Numeric(values);
            }
            (Some(values), Some(window)) => {
                let (mids, means, stats) = aggregate(&raw.times, &values, window);
                series.times = mids;
                series.values = SeriesValues::Numeric(means);
                series.stats = Some(stats);
            }
            (None, None) => {
                series.times = raw.times;
                series.values = SeriesValues::Categorical(raw.cells);
            }
            (None, Some(window)) => {
                let (mids, states) = sample_states(&raw.times, raw.cells, window);
                series.times = mids;
                series.values = SeriesValues::Categorical(states);
            }
        }
        Ok(series)
    }

    fn source_name(&self) -> &str {
        "archive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FIVE_MINUTE_WINDOW_SECS;
    use std::io::Write;

    fn archive_with(files: &[(&str, &str)]) -> (tempfile::TempDir, ArchiveSource) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let mut f = File::create(dir.path().join(name)).unwrap();
            f.write_all(contents.as_bytes()).unwrap();
        }
        let source = ArchiveSource::new(ArchiveConfig {
            data_root: dir.path().to_path_buf(),
        });
        (dir, source)
    }

    #[tokio::test]
    async fn test_full_resolution_filters_range_and_sorts() {
        let (_dir, source) = archive_with(&[(
            "OOBTHR02.csv",
            "TIME,VALUE\n30,3.0\n10,1.0\n20,2.0\n40,\n50,5.0\n",
        )]);
        let series = source.fetch("oobthr02", 10.0, 40.0, Resolution::Full).await.unwrap();
        assert_eq!(series.times, vec![10.0, 20.0, 30.0]);
        assert_eq!(series.numeric_values().unwrap(), &[1.0, 2.0, 3.0]);
        assert!(series.stats.is_none());
    }

    #[tokio::test]
    async fn test_five_minute_bins_carry_extrema() {
        let w = FIVE_MINUTE_WINDOW_SECS;
        let csv = format!("TIME,VALUE\n{},10\n{},30\n{},5\n", 1.0, 2.0, w + 1.0);
        let (_dir, source) = archive_with(&[("TEST.csv", &csv)]);
        let series = source.fetch("TEST", 0.0, 1000.0, Resolution::FiveMinute).await.unwrap();

        assert_eq!(series.times, vec![w / 2.0, w * 1.5]);
        assert_eq!(series.numeric_values().unwrap(), &[20.0, 5.0]);
        let stats = series.stats.unwrap();
        assert_eq!(stats.maxes, vec![30.0, 5.0]);
        assert_eq!(stats.mins, vec![10.0, 5.0]);
        assert_eq!(stats.counts, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_state_values_are_categorical() {
        let (_dir, source) = archive_with(&[(
            "AOPCADMD.csv",
            "TIME,VALUE\n2023:044:00:00:00,NPNT\n2023:044:01:00:00,NMAN\n",
        )]);
        let start = mission_time::parse_calendar("2023:044").unwrap();
        let series = source
            .fetch("AOPCADMD", start, start + 86_400.0, Resolution::Daily)
            .await
            .unwrap();
        assert!(!series.is_numeric());
        assert_eq!(series.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_unknown_msid() {
        let (_dir, source) = archive_with(&[]);
        let err = source.fetch("NOPE", 0.0, 1.0, Resolution::Full).await.unwrap_err();
        assert!(matches!(err, TelemetryError::UnknownMsid(ref m) if m == "NOPE"));
    }

    #[tokio::test]
    async fn test_reduced_resolution_rejected() {
        let (_dir, source) = archive_with(&[("A.csv", "TIME,VALUE\n1,1\n")]);
        let err = source.fetch("A", 0.0, 2.0, Resolution::Reduced).await.unwrap_err();
        assert!(matches!(err, TelemetryError::UnsupportedResolution { .. }));
    }
}
