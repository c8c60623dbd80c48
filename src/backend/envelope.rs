//! Response envelope of the Prometheus HTTP query API.
//!
//! The backend's JSON is first decoded into a loose wire form
//! (`WireEnvelope`) and then checked and converted into [`BackendEnvelope`].
//! Sample values stay as the decimal strings the backend sends; turning
//! them into numbers is the normalizer's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{GatewayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Vector,
    Matrix,
}

/// A `[timestamp, "value"]` pair exactly as the backend delivers it.
/// Timestamp is in (possibly fractional) seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample(pub f64, pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesSamples {
    /// Instant query: one sample per series.
    Instant(RawSample),
    /// Range query: samples in backend order.
    Range(Vec<RawSample>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendSeries {
    pub labels: BTreeMap<String, String>,
    pub samples: SeriesSamples,
}

impl BackendSeries {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn raw_samples(&self) -> &[RawSample] {
        match &self.samples {
            SeriesSamples::Instant(sample) => std::slice::from_ref(sample),
            SeriesSamples::Range(samples) => samples,
        }
    }
}

/// Decoded query response. `status` must be checked before `series` is
/// trusted; [`BackendEnvelope::into_series`] does that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct BackendEnvelope {
    pub status: QueryStatus,
    pub error_type: Option<String>,
    pub error: Option<String>,
    /// Absent when the backend sent no `data` block (error responses).
    pub result_type: Option<ResultType>,
    pub series: Vec<BackendSeries>,
    pub warnings: Vec<String>,
}

impl BackendEnvelope {
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Returns the series of a successful response, or the backend's own
    /// error report as [`GatewayError::Upstream`].
    pub fn into_series(self) -> Result<Vec<BackendSeries>> {
        match self.status {
            QueryStatus::Success => Ok(self.series),
            QueryStatus::Error => Err(GatewayError::Upstream {
                error_type: self.error_type.unwrap_or_else(|| "unknown".to_string()),
                message: self
                    .error
                    .unwrap_or_else(|| "backend returned status=error".to_string()),
            }),
        }
    }

    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<WireData>,
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireData {
    #[serde(rename = "resultType")]
    result_type: ResultType,
    result: Vec<WireSeries>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<RawSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<RawSample>>,
}

impl WireSeries {
    fn into_series(self, result_type: ResultType, index: usize) -> std::result::Result<BackendSeries, String> {
        let samples = match (result_type, self.value, self.values) {
            (ResultType::Vector, Some(value), None) => SeriesSamples::Instant(value),
            (ResultType::Matrix, None, Some(values)) => SeriesSamples::Range(values),
            (ResultType::Vector, _, _) => {
                return Err(format!("vector series #{} must carry exactly one 'value'", index))
            }
            (ResultType::Matrix, _, _) => {
                return Err(format!("matrix series #{} must carry exactly one 'values'", index))
            }
        };

        Ok(BackendSeries {
            labels: self.metric,
            samples,
        })
    }
}

impl TryFrom<WireEnvelope> for BackendEnvelope {
    type Error = String;

    fn try_from(wire: WireEnvelope) -> std::result::Result<Self, Self::Error> {
        if wire.status == QueryStatus::Success && wire.data.is_none() {
            return Err("successful response is missing 'data'".to_string());
        }

        let (result_type, series) = match wire.data {
            Some(data) => {
                let series = data
                    .result
                    .into_iter()
                    .enumerate()
                    .map(|(i, s)| s.into_series(data.result_type, i))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                (Some(data.result_type), series)
            }
            None => (None, Vec::new()),
        };

        Ok(BackendEnvelope {
            status: wire.status,
            error_type: wire.error_type,
            error: wire.error,
            result_type,
            series,
            warnings: wire.warnings,
        })
    }
}

impl From<BackendEnvelope> for WireEnvelope {
    fn from(envelope: BackendEnvelope) -> Self {
        let data = envelope.result_type.map(|result_type| WireData {
            result_type,
            result: envelope
                .series
                .into_iter()
                .map(|s| {
                    let (value, values) = match s.samples {
                        SeriesSamples::Instant(sample) => (Some(sample), None),
                        SeriesSamples::Range(samples) => (None, Some(samples)),
                    };
                    WireSeries {
                        metric: s.labels,
                        value,
                        values,
                    }
                })
                .collect(),
        });

        WireEnvelope {
            status: envelope.status,
            data,
            error_type: envelope.error_type,
            error: envelope.error,
            warnings: envelope.warnings,
        }
    }
}
