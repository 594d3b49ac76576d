//! Live telemetry REST backend.
//!
//! Queries `{base_url}?m={msid}&ts={start}&tp={stop}` with `&ap=t` for all
//! points. The body carries `data-fmt-1.times` (compact `YYYYDDDHHMMSSffffff`
//! stamps, as strings or integers) and `data-fmt-1.values`.
//!
//! Statistic resolutions are served from the service's derived statistic MSIDs
//! (`STAT_5MIN_MAX_<MSID>`, `STAT_1DAY_MIN_<MSID>`, ...).
//!
//! Every transport, status or body failure degrades to an empty series after
//! the configured retries. The caller sees "no data", never an error.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{TelemetryError, TelemetrySource};
use crate::config::RestConfig;
use crate::mission_time::{self, MissionSeconds};
use crate::types::{IntervalStats, Resolution, SensorSeries, SeriesValues};

pub struct RestSource {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl RestSource {
    pub fn new(config: &RestConfig) -> Result<Self, TelemetryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('?').to_string(),
            retries: config.retries,
        })
    }

    /// Query URL for one MSID over `[start, end]`.
    pub fn query_url(&self, msid: &str, start: MissionSeconds, end: MissionSeconds, all_points: bool) -> String {
        let mut url = format!(
            "{}?m={}&ts={}&tp={}",
            self.base_url,
            msid.trim().to_lowercase(),
            mission_time::format_calendar(start),
            mission_time::format_calendar(end)
        );
        if all_points {
            url.push_str("&ap=t");
        }
        url
    }

    async fn request(&self, url: &str) -> Result<Value, TelemetryError> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(TelemetryError::ServerError(resp.status()));
        }
        Ok(resp.json::<Value>().await?)
    }

    /// Fetch and parse one MSID, retrying on failure. `None` after the last
    /// failed attempt.
    async fn query(
        &self,
        msid: &str,
        start: MissionSeconds,
        end: MissionSeconds,
        all_points: bool,
    ) -> Option<(Vec<MissionSeconds>, SeriesValues)> {
        let url = self.query_url(msid, start, end, all_points);
        let attempts = self.retries + 1;

        for attempt in 1..=attempts {
            let outcome = match self.request(&url).await {
                Ok(body) => parse_rest_body(&body),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(parsed) => {
                    debug!(msid, samples = parsed.0.len(), "REST query complete");
                    return Some(parsed);
                }
                Err(e) => {
                    warn!(msid, attempt, attempts, error = %e, "REST query failed");
                }
            }
        }
        None
    }

    async fn fetch_statistics(
        &self,
        msid: &str,
        start: MissionSeconds,
        end: MissionSeconds,
        prefix: &str,
    ) -> Option<SensorSeries> {
        let upper = msid.trim().to_uppercase();
        let (times, means) = self.query(&format!("{prefix}_MEAN_{upper}"), start, end, true).await?;
        let (_, mins) = self.query(&format!("{prefix}_MIN_{upper}"), start, end, true).await?;
        let (_, maxes) = self.query(&format!("{prefix}_MAX_{upper}"), start, end, true).await?;

        let (SeriesValues::Numeric(means), SeriesValues::Numeric(mins), SeriesValues::Numeric(maxes)) =
            (means, mins, maxes)
        else {
            warn!(msid, "REST statistic MSIDs returned non-numeric values");
            return None;
        };

        // The three statistic MSIDs share window stamps; drop any ragged tail
        let n = times.len().min(mins.len()).min(maxes.len()).min(means.len());
        Some(SensorSeries {
            msid: msid.to_string(),
            times: times[..n].to_vec(),
            values: SeriesValues::Numeric(means[..n].to_vec()),
            stats: Some(IntervalStats {
                mins: mins[..n].to_vec(),
                maxes: maxes[..n].to_vec(),
                counts: Vec::new(),
            }),
            resolution: Resolution::Full,
        })
    }
}

/// Parse a REST response body into mission-second times and values.
///
/// Values are numeric when every entry is a number or numeric string,
/// categorical otherwise.
pub fn parse_rest_body(body: &Value) -> Result<(Vec<MissionSeconds>, SeriesValues), TelemetryError> {
    let data = body
        .get("data-fmt-1")
        .ok_or_else(|| TelemetryError::Body("missing 'data-fmt-1'".to_string()))?;
    let times = data
        .get("times")
        .and_then(Value::as_array)
        .ok_or_else(|| TelemetryError::Body("missing 'data-fmt-1.times'".to_string()))?;
    let values = data
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| TelemetryError::Body("missing 'data-fmt-1.values'".to_string()))?;

    if times.len() != values.len() {
        return Err(TelemetryError::Body(format!(
            "{} times but {} values",
            times.len(),
            values.len()
        )));
    }

    let times = times
        .iter()
        .map(|t| {
            let stamp = match t {
                Value::String(s) => s.clone(),
                Value::Number(n) => match n.as_u64() {
                    Some(u) => u.to_string(),
                    None => format!("{:.0}", n.as_f64().unwrap_or_default()),
                },
                other => return Err(TelemetryError::Body(format!("bad time entry {other}"))),
            };
            Ok(mission_time::parse_compact(&stamp)?)
        })
        .collect::<Result<Vec<_>, TelemetryError>>()?;

    let numeric: Option<Vec<f64>> = values
        .iter()
        .map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect();

    let values = match numeric {
        Some(v) => SeriesValues::Numeric(v),
        None => SeriesValues::Categorical(
            values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
    };

    Ok((times, values))
}

#[async_trait]
impl TelemetrySource for RestSource {
    async fn fetch(
        &self,
        msid: &str,
        start: MissionSeconds,
        end: MissionSeconds,
        resolution: Resolution,
    ) -> Result<SensorSeries, TelemetryError> {
        let series = match resolution {
            Resolution::Full | Resolution::Reduced => self
                .query(msid, start, end, resolution == Resolution::Full)
                .await
                .map(|(times, values)| SensorSeries {
                    msid: msid.to_string(),
                    times,
                    values,
                    stats: None,
                    resolution,
                }),
            Resolution::FiveMinute => self.fetch_statistics(msid, start, end, "STAT_5MIN").await,
            Resolution::Daily => self.fetch_statistics(msid, start, end, "STAT_1DAY").await,
        };

        Ok(match series {
            Some(mut s) => {
                s.resolution = resolution;
                s
            }
            None => {
                warn!(msid, %resolution, "No REST data, returning empty series");
                SensorSeries::empty(msid, resolution)
            }
        })
    }

    fn source_name(&self) -> &str {
        "REST"
    }
}
