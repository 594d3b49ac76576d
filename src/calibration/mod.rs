//! Count-to-Temperature Converter
//!
//! Turns raw instrument counts into engineering temperatures using either a
//! TDB polynomial (`COEF0 + COEF1·x + … + COEFn·xⁿ`) or a point-pair table
//! (piecewise-linear between `(RAW_COUNT, ENG_UNIT_VALUE)` knots).
//!
//! Records are validated once when built from the tables; [`convert`] itself
//! is pure and infallible.

use thiserror::Error;
use tracing::debug;

use crate::tables::{PointPairRow, PolyCalRow, ReferenceTables};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("No calibration found for {0}")]
    NotFound(String),

    #[error("Unsupported polynomial degree {degree} for {msid}")]
    UnsupportedDegree { msid: String, degree: f64 },

    #[error("Polynomial for {msid} is missing COEF{power}")]
    MissingCoefficient { msid: String, power: usize },

    #[error("Point-pair knots for {0} are not monotonic in raw count")]
    NonMonotonicKnots(String),

    #[error("Point-pair table has no knots for {0}")]
    EmptyKnots(String),
}

/// A validated calibration for one MSID.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationRecord {
    /// Coefficients by ascending power, exactly `degree + 1` long
    Polynomial { coefficients: Vec<f64> },
    /// `(raw_count, eng_value)` knots, raw count strictly increasing
    PointPair { knots: Vec<(f64, f64)> },
}

/// Result of looking an MSID up in the calibration tables.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationLookup {
    Found(CalibrationRecord),
    NotFound,
}

impl CalibrationLookup {
    pub fn require(self, msid: &str) -> Result<CalibrationRecord, CalibrationError> {
        match self {
            CalibrationLookup::Found(record) => Ok(record),
            CalibrationLookup::NotFound => Err(CalibrationError::NotFound(msid.to_string())),
        }
    }
}

/// Which table a lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CalibrationMode {
    /// Polynomial table first, point-pair table second
    #[default]
    Auto,
    Polynomial,
    PointPair,
}

// ============================================================================
// Record Construction
// ============================================================================

/// Validate a polynomial row and truncate it to its degree.
pub fn polynomial_record(msid: &str, row: &PolyCalRow) -> Result<CalibrationRecord, CalibrationError> {
    let unsupported = || CalibrationError::UnsupportedDegree {
        msid: msid.to_string(),
        degree: row.degree,
    };

    if !row.degree.is_finite() || row.degree < 0.0 || row.degree.fract() != 0.0 {
        return Err(unsupported());
    }
    let degree = row.degree as usize;
    if degree >= row.coefficients.len() {
        return Err(unsupported());
    }

    let coefficients = row.coefficients[..=degree]
        .iter()
        .enumerate()
        .map(|(power, c)| {
            c.ok_or_else(|| CalibrationError::MissingCoefficient {
                msid: msid.to_string(),
                power,
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(CalibrationRecord::Polynomial { coefficients })
}

/// Sort knots by sequence number and orient them by increasing raw count.
pub fn point_pair_record(msid: &str, mut rows: Vec<PointPairRow>) -> Result<CalibrationRecord, CalibrationError> {
    if rows.is_empty() {
        return Err(CalibrationError::EmptyKnots(msid.to_string()));
    }
    rows.sort_by_key(|r| r.sequence);

    let mut knots: Vec<(f64, f64)> = rows.iter().map(|r| (r.raw_count, r.eng_value)).collect();
    if knots.len() > 1 && knots[0].0 > knots[knots.len() - 1].0 {
        knots.reverse();
    }
    if knots.windows(2).any(|w| !(w[1].0 > w[0].0)) {
        return Err(CalibrationError::NonMonotonicKnots(msid.to_string()));
    }

    Ok(CalibrationRecord::PointPair { knots })
}

/// Find and validate the calibration for an MSID.
///
/// `NotFound` when no consulted table has a record; an error when a record
/// exists but cannot be used.
pub fn lookup(
    tables: &ReferenceTables,
    msid: &str,
    mode: CalibrationMode,
) -> Result<CalibrationLookup, CalibrationError> {
    let poly = || tables.poly_cal.as_ref().and_then(|t| t.get(msid));
    let pairs = || tables.point_pair.as_ref().and_then(|t| t.knots(msid));

    let record = match mode {
        CalibrationMode::Polynomial => poly().map(|row| polynomial_record(msid, row)),
        CalibrationMode::PointPair => pairs().map(|rows| point_pair_record(msid, rows)),
        CalibrationMode::Auto => match poly() {
            Some(row) => Some(polynomial_record(msid, row)),
            None => pairs().map(|rows| point_pair_record(msid, rows)),
        },
    };

    match record {
        Some(r) => {
            let r = r?;
            debug!(msid, kind = r.kind(), "Calibration found");
            Ok(CalibrationLookup::Found(r))
        }
        None => Ok(CalibrationLookup::NotFound),
    }
}

impl CalibrationRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            CalibrationRecord::Polynomial { .. } => "polynomial",
            CalibrationRecord::PointPair { .. } => "point-pair",
        }
    }

    /// Convert one raw count.
    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            CalibrationRecord::Polynomial { coefficients } => evaluate_polynomial(coefficients, raw),
            CalibrationRecord::PointPair { knots } => interpolate(knots, raw),
        }
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert raw counts to engineering values. Output has the input's length.
pub fn convert(raw_counts: &[f64], record: &CalibrationRecord) -> Vec<f64> {
    raw_counts.iter().map(|&x| record.apply(x)).collect()
}

/// Horner evaluation of `Σ coefficients[i]·xⁱ`. Empty coefficients give 0.
pub fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Piecewise-linear interpolation, flat outside the first and last knot.
///
/// Knots must be strictly increasing in their first element.
pub fn interpolate(knots: &[(f64, f64)], x: f64) -> f64 {
    let (Some(&(x0, y0)), Some(&(xn, yn))) = (knots.first(), knots.last()) else {
        return f64::NAN;
    };
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= x0 {
        return y0;
    }
    if x >= xn {
        return yn;
    }

    // First knot strictly above x; guaranteed in 1..len by the clamps above
    let hi = knots.partition_point(|&(kx, _)| kx <= x);
    let (xa, ya) = knots[hi - 1];
    let (xb, yb) = knots[hi];
    ya + (yb - ya) * (x - xa) / (xb - xa)
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 1.8 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) / 1.8
}
