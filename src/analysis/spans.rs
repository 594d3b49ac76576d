//! Violation spans: maximal runs of limit-exceeding samples

use serde::Serialize;

use crate::mission_time::{MissionSeconds, SECS_PER_HOUR};

/// One maximal run of consecutive violating samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViolationSpan {
    pub start: MissionSeconds,
    pub end: MissionSeconds,
    /// Index of the first violating sample (in the filtered series)
    pub start_index: usize,
    /// Index of the last violating sample, inclusive
    pub end_index: usize,
}

impl ViolationSpan {
    /// `end − start`; zero for a single-sample run.
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Partition `violations` into maximal runs of `true`.
///
/// `times` and `violations` must be aligned; extra entries in the longer
/// slice are ignored.
pub fn find_violation_spans(times: &[MissionSeconds], violations: &[bool]) -> Vec<ViolationSpan> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let n = times.len().min(violations.len());

    for (i, &violating) in violations[..n].iter().enumerate() {
        match (open, violating) {
            (None, true) => open = Some(i),
            (Some(first), false) => {
                spans.push(span(times, first, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(first) = open {
        spans.push(span(times, first, n - 1));
    }
    spans
}

fn span(times: &[MissionSeconds], first: usize, last: usize) -> ViolationSpan {
    ViolationSpan {
        start: times[first],
        end: times[last],
        start_index: first,
        end_index: last,
    }
}

/// Σ (end − start) over all spans, in hours.
pub fn total_hours(spans: &[ViolationSpan]) -> f64 {
    spans.iter().map(ViolationSpan::duration_secs).sum::<f64>() / SECS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_are_maximal() {
        let times = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        let v = [true, true, false, true, false, true];
        let spans = find_violation_spans(&times, &v);
        assert_eq!(spans.len(), 3);
        assert_eq!((spans[0].start, spans[0].end), (0.0, 10.0));
        assert_eq!((spans[1].start_index, spans[1].end_index), (3, 3));
        assert_eq!((spans[2].start, spans[2].end), (50.0, 50.0));
    }

    #[test]
    fn test_total_hours_sums_spans() {
        let times = [0.0, 3600.0, 7200.0, 9000.0, 10_800.0];
        let v = [true, true, false, true, true];
        let spans = find_violation_spans(&times, &v);
        assert!((total_hours(&spans) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_run_has_zero_duration() {
        let spans = find_violation_spans(&[5.0, 6.0], &[false, true]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].duration_secs(), 0.0);
        assert_eq!(total_hours(&spans), 0.0);
    }

    #[test]
    fn test_no_violations() {
        assert!(find_violation_spans(&[1.0, 2.0], &[false, false]).is_empty());
        assert!(find_violation_spans(&[], &[]).is_empty());
    }
}
