//! Enumerates namespaces, deployments and containers known to the backend.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::backend::{BackendSeries, PrometheusClient};
use crate::Result;

/// Series whose presence proves that a label value exists.
pub const PROBE_SERIES: &str = "container_cpu_usage_seconds_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Namespace,
    Deployment,
    Container,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Namespace => "namespace",
            Dimension::Deployment => "deployment",
            Dimension::Container => "container",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Builds `group by (<label>) (<probe>{k="v",...})`. Scope matchers keep the
/// given order.
pub fn grouping_query(dimension: Dimension, scope: &[(&str, &str)]) -> String {
    let selector = if scope.is_empty() {
        PROBE_SERIES.to_string()
    } else {
        let matchers: Vec<String> = scope
            .iter()
            .map(|(name, value)| format!(r#"{}="{}""#, name, value))
            .collect();
        format!("{}{{{}}}", PROBE_SERIES, matchers.join(","))
    };
    format!("group by ({}) ({})", dimension.label(), selector)
}

/// Distinct non-empty values of `dimension` across `series`.
pub fn collect_values(dimension: Dimension, series: &[BackendSeries]) -> BTreeSet<String> {
    series
        .iter()
        .filter_map(|s| s.label(dimension.label()))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lists the values of `dimension` among series matching `scope`.
pub async fn discover(
    client: &PrometheusClient,
    dimension: Dimension,
    scope: &[(&str, &str)],
) -> Result<BTreeSet<String>> {
    let query = grouping_query(dimension, scope);
    let series = client.query_instant(&query).await?.into_series()?;
    let values = collect_values(dimension, &series);
    debug!(%dimension, found = values.len(), "discovered label values");
    Ok(values)
}
