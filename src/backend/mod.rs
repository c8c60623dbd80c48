//! Access to the metrics backend over the Prometheus HTTP query API.

pub mod client;
pub mod envelope;

pub use client::{PrometheusClient, RangeWindow, DASHBOARD_STEP_SECS, DASHBOARD_WINDOW_SECS};
pub use envelope::{BackendEnvelope, BackendSeries, QueryStatus, RawSample, ResultType, SeriesSamples};
