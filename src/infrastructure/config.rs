use crate::domain::calibration::CalibrationStrategy;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/telemetry";
const ENV_PREFIX: &str = "TELEMETRY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sensor: SensorSettings,
    #[serde(default)]
    pub sampling: SamplingSettings,
    #[serde(default)]
    pub calibration: CalibrationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorSettings {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SensorSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SamplingSettings {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

impl SamplingSettings {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationSettings {
    pub strategy: CalibrationStrategy,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            strategy: CalibrationStrategy::ThrustOnly,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    800
}

fn default_period_ms() -> u64 {
    1000
}

/// Load `config/telemetry.*`, then `TELEMETRY__SECTION__KEY` overrides.
pub fn load_telemetry_config() -> anyhow::Result<TelemetryConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read telemetry configuration")?;

    let config: TelemetryConfig = settings
        .try_deserialize()
        .context("Invalid telemetry configuration")?;
    config.validate()?;
    Ok(config)
}

impl TelemetryConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.sampling.period_ms == 0 {
            anyhow::bail!("sampling.period_ms must be greater than zero");
        }
        if self.sensor.request_timeout_ms == 0 {
            anyhow::bail!("sensor.request_timeout_ms must be greater than zero");
        }
        Ok(())
    }
}
