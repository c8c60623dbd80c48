use std::process;

use metrics_gateway::{api::exporter, config::ExporterConfig, logging};
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logger("metrics_exporter") {
        eprintln!("{}", e);
        process::exit(1);
    }

    let result = match ExporterConfig::from_env() {
        Ok(config) => exporter::start_exporter(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Exporter stopped: {}", e);
        process::exit(1);
    }
}
