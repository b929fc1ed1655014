use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::pipeline::PipelineSettings;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CONF_THRESHOLD: f32 = 0.30;
const DEFAULT_BOOST_FACTOR: f32 = 1.1;
const DEFAULT_BOOST_CAP: f32 = 0.95;
const DEFAULT_MAX_ITEMS: usize = 3;
const DEFAULT_INFER_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Deserialize, Default)]
struct ScanConfigFile {
    listen_addr: Option<String>,
    model: Option<ModelConfigFile>,
    pipeline: Option<PipelineConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    conf_threshold: Option<f32>,
    boost_factor: Option<f32>,
    boost_cap: Option<f32>,
    max_items: Option<usize>,
    infer_timeout_ms: Option<u64>,
}

/// Resolved daemon configuration.
///
/// Values come from the TOML file named by `BINSIGHT_CONFIG`, then defaults.
/// The only other environment input is `PORT`, which rewrites the port of
/// the listen address, matching common container platforms.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub listen_addr: String,
    /// Model file path or `stub:` reference; `None` probes the default
    /// filesystem candidates.
    pub model_ref: Option<String>,
    pub conf_threshold: f32,
    pub boost_factor: f32,
    pub boost_cap: f32,
    pub max_items: usize,
    pub infer_timeout: Duration,
}

impl ScanConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("BINSIGHT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ScanConfigFile) -> Self {
        let listen_addr = file
            .listen_addr
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let model_ref = file.model.and_then(|model| model.path);
        let pipeline = file.pipeline.unwrap_or_default();
        Self {
            listen_addr,
            model_ref,
            conf_threshold: pipeline.conf_threshold.unwrap_or(DEFAULT_CONF_THRESHOLD),
            boost_factor: pipeline.boost_factor.unwrap_or(DEFAULT_BOOST_FACTOR),
            boost_cap: pipeline.boost_cap.unwrap_or(DEFAULT_BOOST_CAP),
            max_items: pipeline.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            infer_timeout: Duration::from_millis(
                pipeline.infer_timeout_ms.unwrap_or(DEFAULT_INFER_TIMEOUT_MS),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            if !port.trim().is_empty() {
                let port: u16 = port
                    .parse()
                    .map_err(|_| anyhow!("PORT must be a TCP port number"))?;
                self.listen_addr = rewrite_port(&self.listen_addr, port);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.listen_addr.contains(':') {
            return Err(anyhow!("listen_addr must have the form host:port"));
        }
        if !self.conf_threshold.is_finite() || !(0.0..=1.0).contains(&self.conf_threshold) {
            return Err(anyhow!("conf_threshold must be within [0, 1]"));
        }
        if !self.boost_factor.is_finite() || self.boost_factor < 1.0 {
            return Err(anyhow!("boost_factor must be at least 1.0"));
        }
        if !self.boost_cap.is_finite() || self.boost_cap <= 0.0 || self.boost_cap > 1.0 {
            return Err(anyhow!("boost_cap must be within (0, 1]"));
        }
        if self.max_items == 0 {
            return Err(anyhow!("max_items must be greater than zero"));
        }
        if self.infer_timeout.as_millis() == 0 {
            return Err(anyhow!("infer_timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            conf_threshold: self.conf_threshold,
            boost_factor: self.boost_factor,
            boost_cap: self.boost_cap,
            max_items: self.max_items,
            infer_timeout: self.infer_timeout,
        }
    }
}

fn read_config_file(path: &Path) -> Result<ScanConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn rewrite_port(addr: &str, port: u16) -> String {
    match addr.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", addr, port),
    }
}
