//! binsightd - waste scan service daemon
//!
//! This daemon:
//! 1. Loads configuration and the detection model
//! 2. Serves the scan API (/health, /detect, /chat)
//! 3. Runs until Ctrl-C

use anyhow::Result;
use std::sync::mpsc;
use std::sync::Arc;

use binsight::{ApiConfig, ApiServer, ScanConfig, ScanService};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("binsightd {} starting", env!("CARGO_PKG_VERSION"));
    let config = ScanConfig::load()?;

    let service = Arc::new(ScanService::build(config.clone())?);
    if !service.pipeline.has_model() {
        log::warn!("no detection model active; /detect will serve empty results");
    }

    let api_config = ApiConfig {
        addr: config.listen_addr.clone(),
    };
    let api_handle = ApiServer::new(api_config, service).spawn()?;
    log::info!("scan api listening on {}", api_handle.addr);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("binsightd waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping API server...");
    api_handle.stop()?;

    Ok(())
}
