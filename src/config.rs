use std::env;

use crate::{GatewayError, Result};

pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";
pub const DEFAULT_GATEWAY_PORT: u16 = 3001;
pub const DEFAULT_EXPORTER_PORT: u16 = 8080;

/// Gateway settings, read once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub prometheus_url: String,
    pub port: u16,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let prometheus_url = lookup("PROMETHEUS_URL")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_PROMETHEUS_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let port = parse_port(lookup("PORT"), DEFAULT_GATEWAY_PORT)?;

        Ok(Self {
            prometheus_url,
            port,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub port: u16,
    /// Fixed RNG seed; random when unset.
    pub seed: Option<u64>,
}

impl ExporterConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = parse_port(lookup("PORT"), DEFAULT_EXPORTER_PORT)?;
        let seed = match lookup("EXPORTER_SEED").filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse().map_err(|e| {
                GatewayError::Internal(format!("Invalid EXPORTER_SEED '{}': {}", raw, e))
            })?),
            None => None,
        };

        Ok(Self { port, seed })
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_port(raw: Option<String>, default: u16) -> Result<u16> {
    match raw.filter(|p| !p.is_empty()) {
        Some(p) => p
            .parse()
            .map_err(|e| GatewayError::Internal(format!("Invalid PORT '{}': {}", p, e))),
        None => Ok(default),
    }
}
