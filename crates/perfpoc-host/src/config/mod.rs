//! Host config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use perfpoc_core::error::{PerfError, Result};

pub use schema::{
    AverageDurationSection, CategorySection, CountersSection, EmittersSection, HostConfig,
    InstantaneousSection, MonitorSection, OpsSection, RatePerSecondSection, SpeedModeName,
};

/// Config file read when `PERFPOC_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "perfpoc.yaml";

pub fn load_from_file(path: &str) -> Result<HostConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PerfError::Io(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<HostConfig> {
    let cfg: HostConfig = serde_yaml::from_str(s)
        .map_err(|e| PerfError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// `PERFPOC_CONFIG` if set, else `perfpoc.yaml` if present, else defaults.
pub fn load_default() -> Result<HostConfig> {
    if let Ok(path) = std::env::var("PERFPOC_CONFIG") {
        return load_from_file(&path);
    }
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        return load_from_file(DEFAULT_CONFIG_FILE);
    }
    tracing::debug!("no config file found, using defaults");
    let cfg = HostConfig::default();
    cfg.validate()?;
    Ok(cfg)
}
