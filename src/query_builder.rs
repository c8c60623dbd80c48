//! Translates a dashboard selection into a PromQL expression.

use crate::models::{MetricKind, MetricQueryRequest, DEFAULT_RATE_WINDOW};
use crate::{GatewayError, Result};

/// Which containers a metric query selects.
///
/// `OneOf` names are joined into a regex alternation without escaping, so
/// callers must pass plain container names; names containing regex
/// metacharacters match whatever the backend's regex engine makes of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerFilter {
    Any,
    OneOf(Vec<String>),
}

impl ContainerFilter {
    /// Parses the comma separated `containers` parameter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => ContainerFilter::Any,
            Some(list) => ContainerFilter::OneOf(list.split(',').map(str::to_string).collect()),
        }
    }

    pub fn matcher(&self) -> String {
        match self {
            ContainerFilter::Any => r#"container!="""#.to_string(),
            ContainerFilter::OneOf(names) => format!(r#"container=~"{}""#, names.join("|")),
        }
    }
}

/// A validated metric selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSelection {
    pub namespace: String,
    pub deployment: String,
    pub metric: MetricKind,
    pub containers: ContainerFilter,
    pub rate_window: String,
}

impl TryFrom<&MetricQueryRequest> for MetricSelection {
    type Error = GatewayError;

    fn try_from(req: &MetricQueryRequest) -> Result<Self> {
        if req.namespace.is_empty() || req.deployment.is_empty() || req.metric.is_empty() {
            return Err(GatewayError::validation(
                "Namespace, deployment, and metric parameters are required",
            ));
        }
        let metric = req.metric.parse()?;

        let rate_window = req
            .duration
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_RATE_WINDOW)
            .to_string();

        Ok(Self {
            namespace: req.namespace.clone(),
            deployment: req.deployment.clone(),
            metric,
            containers: ContainerFilter::parse(req.containers.as_deref()),
            rate_window,
        })
    }
}

impl MetricSelection {
    pub fn selector(&self) -> String {
        format!(
            r#"{}{{namespace="{}",deployment="{}",{}}}"#,
            self.metric.series_name(),
            self.namespace,
            self.deployment,
            self.containers.matcher()
        )
    }

    pub fn to_promql(&self) -> String {
        if self.metric.is_counter() {
            format!(
                "sum(rate({}[{}])) by (container, pod)",
                self.selector(),
                self.rate_window
            )
        } else {
            self.selector()
        }
    }
}

/// Validates `request` and renders its PromQL expression.
pub fn build(request: &MetricQueryRequest) -> Result<String> {
    MetricSelection::try_from(request).map(|selection| selection.to_promql())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(metric: &str) -> MetricQueryRequest {
        MetricQueryRequest {
            namespace: "default".into(),
            deployment: "nginx".into(),
            metric: metric.into(),
            containers: None,
            duration: None,
        }
    }

    #[test]
    fn cpu_uses_default_rate_window() {
        assert_eq!(
            build(&request("cpu")).unwrap(),
            r#"sum(rate(container_cpu_usage_seconds_total{namespace="default",deployment="nginx",container!=""}[5m])) by (container, pod)"#
        );
    }

    #[test]
    fn memory_is_an_untransformed_selector() {
        assert_eq!(
            build(&request("memory")).unwrap(),
            r#"container_memory_working_set_bytes{namespace="default",deployment="nginx",container!=""}"#
        );
    }

    #[test]
    fn every_counter_gets_rate_and_sum() {
        for kind in MetricKind::ALL {
            let query = build(&request(kind.as_str())).unwrap();
            assert!(query.contains(kind.series_name()));
            assert!(query.contains(r#"namespace="default""#));
            assert!(query.contains(r#"deployment="nginx""#));
            assert_eq!(
                query.starts_with("sum(rate("),
                kind.is_counter(),
                "unexpected shape for {}: {}",
                kind,
                query
            );
            assert_eq!(query.ends_with("by (container, pod)"), kind.is_counter());
        }
    }

    #[test]
    fn container_list_becomes_alternation() {
        let mut req = request("network_tx");
        req.containers = Some("api,auth,cache".into());
        req.duration = Some("1m".into());
        assert_eq!(
            build(&req).unwrap(),
            r#"sum(rate(container_network_transmit_bytes_total{namespace="default",deployment="nginx",container=~"api|auth|cache"}[1m])) by (container, pod)"#
        );
    }

    #[test]
    fn container_names_are_not_escaped() {
        let filter = ContainerFilter::parse(Some("web.v2,side+car"));
        assert_eq!(filter.matcher(), r#"container=~"web.v2|side+car""#);
    }

    #[test]
    fn empty_containers_and_duration_fall_back() {
        let mut req = request("disk_read");
        req.containers = Some(String::new());
        req.duration = Some(String::new());
        let selection = MetricSelection::try_from(&req).unwrap();
        assert_eq!(selection.containers, ContainerFilter::Any);
        assert_eq!(selection.rate_window, "5m");
    }

    #[test]
    fn rejects_missing_required_fields() {
        for field in ["namespace", "deployment", "metric"] {
            let mut req = request("cpu");
            match field {
                "namespace" => req.namespace.clear(),
                "deployment" => req.deployment.clear(),
                _ => req.metric.clear(),
            }
            assert!(matches!(build(&req), Err(GatewayError::Validation(_))), "{}", field);
        }
    }

    #[test]
    fn rejects_unknown_metric() {
        let err = build(&request("gpu")).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref m) if m == "Invalid metric type"));
    }
}
