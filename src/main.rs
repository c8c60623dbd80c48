use std::process;

use metrics_gateway::{api::gateway, config::GatewayConfig, logging};
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logger("metrics_gateway") {
        eprintln!("{}", e);
        process::exit(1);
    }

    let result = match GatewayConfig::from_env() {
        Ok(config) => gateway::start_gateway(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Gateway stopped: {}", e);
        process::exit(1);
    }
}
