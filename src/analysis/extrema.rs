//! Global extrema over a filtered track

use serde::Serialize;

use crate::mission_time::MissionSeconds;

/// An extreme value and when it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremum {
    pub value: f64,
    pub time: MissionSeconds,
    /// Index into the filtered series
    pub index: usize,
}

/// Largest value; first occurrence on ties. NaN samples are ignored.
pub fn find_max(times: &[MissionSeconds], track: &[f64]) -> Option<Extremum> {
    find_by(times, track, |candidate, best| candidate > best)
}

/// Smallest value; first occurrence on ties. NaN samples are ignored.
pub fn find_min(times: &[MissionSeconds], track: &[f64]) -> Option<Extremum> {
    find_by(times, track, |candidate, best| candidate < best)
}

fn find_by(
    times: &[MissionSeconds],
    track: &[f64],
    better: impl Fn(f64, f64) -> bool,
) -> Option<Extremum> {
    let mut best: Option<Extremum> = None;
    for (index, (&time, &value)) in times.iter().zip(track).enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |b| better(value, b.value)) {
            best = Some(Extremum { value, time, index });
        }
    }
    best
}
