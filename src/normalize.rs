use crate::backend::{BackendSeries, RawSample};
use crate::models::{Dataset, Sample};

/// Pod label placeholder when the backend omits it.
pub const UNKNOWN_POD: &str = "unknown";

/// Converts backend series into datasets, one per series, in backend order.
pub fn normalize(series: &[BackendSeries]) -> Vec<Dataset> {
    series.iter().map(to_dataset).collect()
}

pub fn to_dataset(series: &BackendSeries) -> Dataset {
    Dataset {
        container: series.label("container").unwrap_or_default().to_string(),
        pod: series
            .label("pod")
            .filter(|pod| !pod.is_empty())
            .unwrap_or(UNKNOWN_POD)
            .to_string(),
        samples: series.raw_samples().iter().filter_map(to_sample).collect(),
    }
}

/// `None` when the value is not a finite decimal; such points are dropped.
pub fn to_sample(raw: &RawSample) -> Option<Sample> {
    let RawSample(seconds, value) = raw;
    let value: f64 = value.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(Sample {
        timestamp: (seconds * 1000.0).round() as i64,
        value,
    })
}
