//! Plotly-format JSON figures
//!
//! A figure is `{"data": [...traces], "layout": {...}}` as consumed by
//! plotly.js / `plotly.io.from_json`. Each series becomes a `scattergl` line;
//! statistic series also get a filled min/max envelope; resolved limits are
//! drawn as horizontal dashed lines.

use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

use super::{write_file, ReportError};
use crate::analysis::ResolvedLimits;
use crate::filter::apply_mask;
use crate::mission_time::{to_datetime, MissionSeconds};
use crate::types::SensorSeries;

const WARNING_COLOR: &str = "rgba(200, 0, 0, 0.8)";
const CAUTION_COLOR: &str = "rgba(230, 160, 0, 0.8)";
const ENVELOPE_FILL: &str = "rgba(50, 50, 0, 0.3)";

/// Plotly date string for a mission time.
fn plot_time(t: MissionSeconds) -> String {
    to_datetime(t).format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn plot_times(times: &[MissionSeconds]) -> Vec<String> {
    times.iter().map(|&t| plot_time(t)).collect()
}

/// Builder for one figure.
#[derive(Debug, Clone)]
pub struct PlotFigure {
    title: String,
    y_label: String,
    traces: Vec<Value>,
    shapes: Vec<Value>,
}

impl PlotFigure {
    pub fn new(title: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            y_label: y_label.to_string(),
            traces: Vec::new(),
            shapes: Vec::new(),
        }
    }

    /// Add a series, keeping only samples where `mask` is true.
    ///
    /// Categorical series are skipped.
    pub fn add_series(&mut self, series: &SensorSeries, mask: Option<&[bool]>) -> &mut Self {
        let Some(values) = series.numeric_values() else {
            return self;
        };
        let all = vec![true; series.len()];
        let keep = mask.unwrap_or(&all);
        let times = apply_mask(&series.times, keep);

        if let Some(stats) = &series.stats {
            let mins = apply_mask(&stats.mins, keep);
            let maxes = apply_mask(&stats.maxes, keep);
            // Closed polygon: mins forward, maxes backward
            let x: Vec<String> = plot_times(&times)
                .into_iter()
                .chain(plot_times(&times).into_iter().rev())
                .collect();
            let y: Vec<f64> = mins.iter().copied().chain(maxes.iter().rev().copied()).collect();
            self.traces.push(json!({
                "type": "scattergl",
                "x": x,
                "y": y,
                "name": format!("{} min/max", series.msid),
                "fill": "toself",
                "fillcolor": ENVELOPE_FILL,
                "line": {"width": 0},
                "legendgroup": series.msid,
                "hoverinfo": "skip",
            }));
        }

        self.traces.push(json!({
            "type": "scattergl",
            "mode": "lines",
            "x": plot_times(&times),
            "y": apply_mask(values, keep),
            "name": series.msid,
            "legendgroup": series.msid,
        }));
        self
    }

    /// Draw a horizontal line at `y`.
    pub fn add_limit_line(&mut self, name: &str, y: f64, color: &str) -> &mut Self {
        self.shapes.push(json!({
            "type": "line",
            "xref": "paper",
            "x0": 0,
            "x1": 1,
            "y0": y,
            "y1": y,
            "line": {"color": color, "width": 2, "dash": "dash"},
            "name": name,
        }));
        self
    }

    /// Lines for every limit present in the sensor's limit record.
    pub fn add_limits(&mut self, limits: &ResolvedLimits) -> &mut Self {
        let r = limits.record;
        let lines = [
            ("Warning High", r.warning_high, WARNING_COLOR),
            ("Caution High", r.caution_high, CAUTION_COLOR),
            ("Caution Low", r.caution_low, CAUTION_COLOR),
            ("Warning Low", r.warning_low, WARNING_COLOR),
        ];
        for (name, value, color) in lines {
            if let Some(y) = value {
                self.add_limit_line(name, y, color);
            }
        }
        self
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "data": self.traces,
            "layout": {
                "hovermode": "closest",
                "template": "none",
                "title": {"text": self.title, "x": 0.5, "xanchor": "center"},
                "xaxis": {"type": "date"},
                "yaxis": {"title": {"text": self.y_label}, "automargin": true},
                "shapes": self.shapes,
            },
        })
    }

    /// Write the figure as pretty-printed JSON.
    pub fn export(&self, path: &Path) -> Result<(), ReportError> {
        let bytes = serde_json::to_vec_pretty(&self.to_json())?;
        write_file(path, &bytes)?;
        info!(path = %path.display(), traces = self.traces.len(), "Wrote plot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntervalStats, SafetyLimits, SentinelBounds};

    #[test]
    fn test_line_trace_respects_mask() {
        let series = SensorSeries::numeric("OOBTHR02", vec![0.0, 1.0, 2.0], vec![10.0, 20.0, 30.0]);
        let mut fig = PlotFigure::new("HRMA", "DEGF");
        fig.add_series(&series, Some(&[true, false, true][..]));
        let doc = fig.to_json();
        assert_eq!(doc["data"][0]["type"], "scattergl");
        assert_eq!(doc["data"][0]["y"], json!([10.0, 30.0]));
        assert_eq!(doc["data"][0]["x"][0], "1998-01-01 00:00:00.000");
    }

    #[test]
    fn test_statistic_series_gets_envelope() {
        let mut series = SensorSeries::numeric("T", vec![0.0, 1.0], vec![5.0, 6.0]);
        series.stats = Some(IntervalStats {
            mins: vec![4.0, 5.0],
            maxes: vec![7.0, 8.0],
            counts: vec![1, 1],
        });
        let mut fig = PlotFigure::new("T", "DEGC");
        fig.add_series(&series, None);
        let doc = fig.to_json();
        assert_eq!(fig.trace_count(), 2);
        assert_eq!(doc["data"][0]["fill"], "toself");
        assert_eq!(doc["data"][0]["y"], json!([4.0, 5.0, 8.0, 7.0]));
    }

    #[test]
    fn test_only_present_limits_drawn() {
        let mut limits = ResolvedLimits::sentinel_only(SentinelBounds::default());
        limits.record = SafetyLimits {
            warning_high: Some(60.0),
            ..Default::default()
        };
        let mut fig = PlotFigure::new("T", "DEGF");
        fig.add_limits(&limits);
        let doc = fig.to_json();
        assert_eq!(doc["layout"]["shapes"].as_array().unwrap().len(), 1);
        assert_eq!(doc["layout"]["shapes"][0]["y0"], 60.0);
    }

    #[test]
    fn test_export_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.plot.json");
        PlotFigure::new("T", "DEGF").export(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert!(parsed["data"].as_array().unwrap().is_empty());
    }
}
