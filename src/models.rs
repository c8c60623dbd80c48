use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Rate window used when the caller does not supply one.
pub const DEFAULT_RATE_WINDOW: &str = "5m";

/// Metric families exposed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Memory,
    NetworkRx,
    NetworkTx,
    DiskRead,
    DiskWrite,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::NetworkRx,
        MetricKind::NetworkTx,
        MetricKind::DiskRead,
        MetricKind::DiskWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::NetworkRx => "network_rx",
            MetricKind::NetworkTx => "network_tx",
            MetricKind::DiskRead => "disk_read",
            MetricKind::DiskWrite => "disk_write",
        }
    }

    /// Backend series the metric is read from.
    pub fn series_name(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "container_cpu_usage_seconds_total",
            MetricKind::Memory => "container_memory_working_set_bytes",
            MetricKind::NetworkRx => "container_network_receive_bytes_total",
            MetricKind::NetworkTx => "container_network_transmit_bytes_total",
            MetricKind::DiskRead => "container_fs_reads_bytes_total",
            MetricKind::DiskWrite => "container_fs_writes_bytes_total",
        }
    }

    /// Counters need a rate transform; gauges are read as-is.
    pub fn is_counter(&self) -> bool {
        !matches!(self, MetricKind::Memory)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GatewayError::validation("Invalid metric type"))
    }
}

/// Query parameters of `GET /api/metrics`. Missing parameters decode as
/// empty strings and are rejected by the query builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricQueryRequest {
    pub namespace: String,
    pub deployment: String,
    pub metric: String,
    /// Comma separated container names; empty selects every container.
    pub containers: Option<String>,
    /// Rate window such as `5m`; defaults to [`DEFAULT_RATE_WINDOW`].
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Instant,
    Range,
}

/// Body of `POST /api/query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomQueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(rename = "type", default)]
    pub query_type: QueryType,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeploymentsParams {
    pub namespace: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContainersParams {
    pub namespace: Option<String>,
    pub deployment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub container: String,
    pub pod: String,
    #[serde(rename = "values")]
    pub samples: Vec<Sample>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContainersResponse {
    pub containers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub query: String,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub prometheus: String,
}
