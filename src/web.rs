#![cfg(not(tarpaulin_include))]

use intake::{app, config::AppConfig};
use std::env;
use std::path::Path;

/// Main entry point for the intake dashboard
///
/// Usage: `intake-web [config.json]`. Without an argument the built-in
/// defaults are used; `INTAKE_BIND` and `INTAKE_STORE` override the listen
/// address and workbook path either way. Log level comes from `RUST_LOG`
/// (default `info`).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::load(args.get(1).map(Path::new))?;

    log::info!("Starting {} {}", config.app_name, config.version);
    app::run(config).await
}
