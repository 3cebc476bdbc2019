// Sensor client trait for the test-stand endpoint
use crate::domain::telemetry::RawReading;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("sensor unreachable: {0}")]
    Unreachable(String),
    #[error("sensor request timed out")]
    Timeout,
    #[error("sensor rejected request with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait SensorClient: Send + Sync {
    /// One sample for the periodic acquisition cycle
    async fn read_once(&self) -> Result<RawReading, SensorError>;

    /// One unthrottled sample taken while calibrating
    async fn read_raw_reference(&self) -> Result<RawReading, SensorError>;

    /// Command the ESC, in microseconds
    async fn write_throttle(&self, value: u16) -> Result<(), SensorError>;

    /// Push the thrust factor so the device applies it too
    async fn write_calibration_factor(&self, value: f64) -> Result<(), SensorError>;

    async fn start_sampling(&self) -> Result<(), SensorError>;

    async fn stop_sampling(&self) -> Result<(), SensorError>;
}
