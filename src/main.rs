use std::env;
use std::sync::Arc;

use pbm_exporter::config::load_config;
use pbm_exporter::startup;
use pbm_exporter::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    // Version flags bypass all server startup, including config loading.
    if let Some(flag) = env::args().nth(1) {
        if flag == "--version" || flag == "-v" {
            println!("pbm-exporter version {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    }

    let config = Arc::new(load_config());
    init_logging(&config.log_level, &config.log_format);

    if let Err(e) = startup::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
