use serde::Deserialize;
use perfpoc_core::error::{PerfError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub version: u32,

    #[serde(default)]
    pub category: CategorySection,

    #[serde(default)]
    pub counters: CountersSection,

    #[serde(default)]
    pub emitters: EmittersSection,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub ops: OpsSection,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: 1,
            category: CategorySection::default(),
            counters: CountersSection::default(),
            emitters: EmittersSection::default(),
            monitor: MonitorSection::default(),
            ops: OpsSection::default(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PerfError::UnsupportedVersion);
        }

        self.category.validate()?;
        self.emitters.validate()?;
        self.monitor.validate()?;
        self.ops.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySection {
    #[serde(default = "default_category_name")]
    pub name: String,

    #[serde(default = "default_category_description")]
    pub description: String,

    /// Check every declared counter's kind, not just category existence.
    #[serde(default = "default_true")]
    pub verify_counters: bool,
}

impl Default for CategorySection {
    fn default() -> Self {
        Self {
            name: default_category_name(),
            description: default_category_description(),
            verify_counters: true,
        }
    }
}

impl CategorySection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PerfError::BadConfig("category.name must not be empty".into()));
        }
        Ok(())
    }
}

fn default_category_name() -> String {
    "PerformanceCounterPoc".into()
}
fn default_category_description() -> String {
    "Demonstrates usage of various performance counter types.".into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountersSection {
    /// Where category definitions survive restarts. `null` keeps them in memory.
    #[serde(default = "default_state_file")]
    pub state_file: Option<String>,
}

impl Default for CountersSection {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

fn default_state_file() -> Option<String> {
    Some("perfpoc-counters.json".into())
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EmittersSection {
    #[serde(default)]
    pub instantaneous: InstantaneousSection,

    #[serde(default)]
    pub average_duration: AverageDurationSection,

    #[serde(default)]
    pub rate_per_second: RatePerSecondSection,
}

impl EmittersSection {
    pub fn validate(&self) -> Result<()> {
        if !self.instantaneous.enabled && !self.average_duration.enabled && !self.rate_per_second.enabled {
            return Err(PerfError::BadConfig("at least one emitter must be enabled".into()));
        }
        self.instantaneous.validate()?;
        self.average_duration.validate()?;
        self.rate_per_second.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstantaneousSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for InstantaneousSection {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: default_tick_ms(),
        }
    }
}

impl InstantaneousSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.tick_ms) {
            return Err(PerfError::BadConfig(
                "emitters.instantaneous.tick_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_tick_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AverageDurationSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_operation_ms")]
    pub max_operation_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for AverageDurationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_operation_ms: default_max_operation_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl AverageDurationSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=60000).contains(&self.max_operation_ms) {
            return Err(PerfError::BadConfig(
                "emitters.average_duration.max_operation_ms must be between 1 and 60000".into(),
            ));
        }
        if !(1..=60000).contains(&self.max_delay_ms) {
            return Err(PerfError::BadConfig(
                "emitters.average_duration.max_delay_ms must be between 1 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_operation_ms() -> u64 {
    450
}
fn default_max_delay_ms() -> u64 {
    50
}

/// Named speed of the rate emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedModeName {
    Slow,
    Medium,
    Fast,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatePerSecondSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_slow")]
    pub slow: u32,

    #[serde(default = "default_medium")]
    pub medium: u32,

    #[serde(default = "default_fast")]
    pub fast: u32,

    /// Pin one mode instead of following the clock schedule.
    #[serde(default)]
    pub fixed_mode: Option<SpeedModeName>,
}

impl Default for RatePerSecondSection {
    fn default() -> Self {
        Self {
            enabled: true,
            slow: default_slow(),
            medium: default_medium(),
            fast: default_fast(),
            fixed_mode: None,
        }
    }
}

impl RatePerSecondSection {
    pub fn validate(&self) -> Result<()> {
        for (name, ops) in [("slow", self.slow), ("medium", self.medium), ("fast", self.fast)] {
            if !(1..=1000).contains(&ops) {
                return Err(PerfError::BadConfig(format!(
                    "emitters.rate_per_second.{name} must be between 1 and 1000"
                )));
            }
        }
        Ok(())
    }
}

fn default_slow() -> u32 {
    5
}
fn default_medium() -> u32 {
    15
}
fn default_fast() -> u32 {
    40
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// 0 disables the periodic log of derived values.
    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            log_interval_ms: default_log_interval_ms(),
        }
    }
}

impl MonitorSection {
    pub fn validate(&self) -> Result<()> {
        if self.log_interval_ms != 0 && self.log_interval_ms < 100 {
            return Err(PerfError::BadConfig(
                "monitor.log_interval_ms must be 0 or at least 100".into(),
            ));
        }
        Ok(())
    }
}

fn default_log_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    /// Address for `/healthz`, `/readyz`, `/metrics`; unset disables the server.
    #[serde(default)]
    pub listen: Option<String>,
}

impl OpsSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(listen) = &self.listen {
            listen
                .parse::<std::net::SocketAddr>()
                .map_err(|e| PerfError::BadConfig(format!("ops.listen must be a valid SocketAddr: {e}")))?;
        }
        Ok(())
    }
}
