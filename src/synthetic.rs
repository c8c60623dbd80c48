//! Fake container metrics for exercising the gateway without a cluster.
//!
//! A fixed set of namespaces, deployments and containers is expanded into
//! scrape targets once. Every scrape advances the counters by a random
//! amount and resamples the gauges, so `rate()` over the counters behaves
//! like it would against real cAdvisor data.

use std::sync::Mutex;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{GatewayError, Result};

pub const NAMESPACES: [&str; 5] = ["default", "kube-system", "production", "staging", "development"];
pub const DEPLOYMENTS: [&str; 6] = ["nginx", "api-server", "frontend", "backend", "redis", "postgresql"];

const LABELS: [&str; 4] = ["namespace", "pod", "container", "deployment"];
const POD_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const POD_SUFFIX_LEN: usize = 7;

pub fn containers_of(deployment: &str) -> &'static [&'static str] {
    match deployment {
        "nginx" => &["nginx-main", "nginx-sidecar", "nginx-exporter"],
        "api-server" => &["api", "auth", "cache", "logger"],
        "frontend" => &["react-app", "nginx-static", "node-exporter"],
        "backend" => &["spring-boot", "postgres-exporter", "redis-client"],
        "redis" => &["redis-server", "redis-sentinel", "redis-exporter"],
        "postgresql" => &["postgres", "pgbouncer", "backup-agent"],
        _ => &["main-container"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FamilyKind {
    Counter,
    Gauge,
}

struct Family {
    name: &'static str,
    help: &'static str,
    kind: FamilyKind,
    /// Per-scrape increment for counters, value for gauges.
    range: (f64, f64),
}

static FAMILIES: [Family; 8] = [
    Family {
        name: "container_cpu_usage_seconds_total",
        help: "Cumulative cpu time consumed in seconds",
        kind: FamilyKind::Counter,
        range: (0.1, 2.5),
    },
    Family {
        name: "container_cpu_cfs_throttled_seconds_total",
        help: "Total time duration the container has been throttled",
        kind: FamilyKind::Counter,
        range: (0.0, 0.5),
    },
    Family {
        name: "container_memory_working_set_bytes",
        help: "Current working set in bytes",
        kind: FamilyKind::Gauge,
        range: (100_000_000.0, 500_000_000.0),
    },
    Family {
        name: "container_memory_cache",
        help: "Number of bytes of page cache memory",
        kind: FamilyKind::Gauge,
        range: (10_000_000.0, 50_000_000.0),
    },
    Family {
        name: "container_network_receive_bytes_total",
        help: "Cumulative count of bytes received",
        kind: FamilyKind::Counter,
        range: (1_000.0, 10_000.0),
    },
    Family {
        name: "container_network_transmit_bytes_total",
        help: "Cumulative count of bytes transmitted",
        kind: FamilyKind::Counter,
        range: (500.0, 8_000.0),
    },
    Family {
        name: "container_fs_reads_bytes_total",
        help: "Cumulative count of bytes read",
        kind: FamilyKind::Counter,
        range: (100.0, 5_000.0),
    },
    Family {
        name: "container_fs_writes_bytes_total",
        help: "Cumulative count of bytes written",
        kind: FamilyKind::Counter,
        range: (50.0, 3_000.0),
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub namespace: String,
    pub deployment: String,
    pub container: String,
    pub pod: String,
}

impl Target {
    fn label_values(&self) -> [&str; 4] {
        [&self.namespace, &self.pod, &self.container, &self.deployment]
    }
}

/// One target per (namespace, deployment, container), each with its own pod.
pub fn topology<R: Rng>(rng: &mut R) -> Vec<Target> {
    let mut targets = Vec::new();
    for namespace in NAMESPACES {
        for deployment in DEPLOYMENTS {
            for container in containers_of(deployment) {
                targets.push(Target {
                    namespace: namespace.to_string(),
                    deployment: deployment.to_string(),
                    container: container.to_string(),
                    pod: pod_name(rng, deployment),
                });
            }
        }
    }
    targets
}

pub fn pod_name<R: Rng>(rng: &mut R, deployment: &str) -> String {
    let suffix: String = (0..POD_SUFFIX_LEN)
        .map(|_| POD_SUFFIX_CHARSET[rng.gen_range(0..POD_SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{}-{}", deployment, suffix)
}

enum Collector {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

pub struct SyntheticCluster {
    registry: Registry,
    targets: Vec<Target>,
    collectors: Vec<(&'static Family, Collector)>,
    rng: Mutex<StdRng>,
}

impl SyntheticCluster {
    pub fn new(seed: Option<u64>) -> Result<Self> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let targets = topology(&mut rng);

        let registry = Registry::new();
        let mut collectors = Vec::with_capacity(FAMILIES.len());
        for family in FAMILIES.iter() {
            let opts = Opts::new(family.name, family.help);
            let collector = match family.kind {
                FamilyKind::Counter => {
                    let vec = CounterVec::new(opts, &LABELS).map_err(registry_error)?;
                    registry.register(Box::new(vec.clone())).map_err(registry_error)?;
                    Collector::Counter(vec)
                }
                FamilyKind::Gauge => {
                    let vec = GaugeVec::new(opts, &LABELS).map_err(registry_error)?;
                    registry.register(Box::new(vec.clone())).map_err(registry_error)?;
                    Collector::Gauge(vec)
                }
            };
            collectors.push((family, collector));
        }

        Ok(Self {
            registry,
            targets,
            collectors,
            rng: Mutex::new(rng),
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Moves every series forward by one scrape interval.
    pub fn advance(&self) -> Result<()> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| GatewayError::Internal("synthetic RNG lock poisoned".to_string()))?;

        for target in &self.targets {
            let labels = target.label_values();
            for (family, collector) in &self.collectors {
                let (min, max) = family.range;
                let amount = rng.gen_range(min..max);
                match collector {
                    Collector::Counter(vec) => vec.with_label_values(&labels).inc_by(amount),
                    Collector::Gauge(vec) => vec.with_label_values(&labels).set(amount.round()),
                }
            }
        }
        Ok(())
    }

    /// Current state in the text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(registry_error)?;
        String::from_utf8(buffer).map_err(|e| GatewayError::Internal(e.to_string()))
    }

    pub fn scrape(&self) -> Result<String> {
        self.advance()?;
        self.render()
    }
}

fn registry_error(err: prometheus::Error) -> GatewayError {
    GatewayError::Internal(format!("synthetic registry: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn sample_value(text: &str, series: &str, container: &str, namespace: &str) -> f64 {
        text.lines()
            .filter(|line| line.starts_with(series) && !line.starts_with('#'))
            .filter(|line| line.contains(&format!("container=\"{}\"", container)))
            .find(|line| line.contains(&format!("namespace=\"{}\"", namespace)))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
            .unwrap()
    }

    #[test]
    fn topology_covers_every_container() {
        let mut rng = StdRng::seed_from_u64(7);
        let targets = topology(&mut rng);
        let per_namespace: usize = DEPLOYMENTS.iter().map(|d| containers_of(d).len()).sum();
        assert_eq!(targets.len(), NAMESPACES.len() * per_namespace);

        let pods: HashSet<_> = targets.iter().map(|t| t.pod.as_str()).collect();
        assert_eq!(pods.len(), targets.len());
    }

    #[test]
    fn pod_names_follow_deployment_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        let pod = pod_name(&mut rng, "redis");
        let suffix = pod.strip_prefix("redis-").unwrap();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn unknown_deployment_has_main_container() {
        assert_eq!(containers_of("cronjob"), &["main-container"]);
    }

    #[test]
    fn same_seed_same_topology() {
        let a = SyntheticCluster::new(Some(99)).unwrap();
        let b = SyntheticCluster::new(Some(99)).unwrap();
        assert_eq!(a.targets(), b.targets());
    }

    #[test]
    fn scrape_emits_every_family() {
        let cluster = SyntheticCluster::new(Some(3)).unwrap();
        let text = cluster.scrape().unwrap();
        for family in FAMILIES.iter() {
            assert!(text.contains(&format!("# TYPE {} ", family.name)), "{}", family.name);
        }
        assert!(text.contains(r#"deployment="postgresql""#));
        assert!(text.contains(r#"container="pgbouncer""#));
    }

    #[test]
    fn counters_only_grow_and_gauges_stay_in_range() {
        let cluster = SyntheticCluster::new(Some(11)).unwrap();
        let first = cluster.scrape().unwrap();
        let second = cluster.scrape().unwrap();

        let cpu = "container_cpu_usage_seconds_total";
        let before = sample_value(&first, cpu, "api", "staging");
        let after = sample_value(&second, cpu, "api", "staging");
        assert!(after >= before + 0.1, "{} -> {}", before, after);

        let memory = sample_value(&second, "container_memory_working_set_bytes", "redis-server", "production");
        assert!((100_000_000.0..=500_000_000.0).contains(&memory));
    }
}
