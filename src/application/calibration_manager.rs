// Calibration manager - Use case for running a calibration workflow
use crate::application::sensor_client::{SensorClient, SensorError};
use crate::application::session::{SessionEvent, TelemetrySession};
use crate::domain::calibration::{
    CalibrationFactors, CalibrationStrategy, InvalidInput, KnownValues,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("calibration needs the sensor: {0}")]
    Sensor(#[from] SensorError),
}

#[derive(Clone)]
pub struct CalibrationManager {
    session: TelemetrySession,
    sensor: Arc<dyn SensorClient>,
    default_strategy: CalibrationStrategy,
    read_timeout: Duration,
}

impl CalibrationManager {
    pub fn new(
        session: TelemetrySession,
        sensor: Arc<dyn SensorClient>,
        default_strategy: CalibrationStrategy,
        read_timeout: Duration,
    ) -> Self {
        Self {
            session,
            sensor,
            default_strategy,
            read_timeout,
        }
    }

    /// Take a reference reading, compute a new factor set and install it.
    ///
    /// Nothing changes unless every step succeeds: the known values are
    /// checked, the reference is read, the factors are computed and the
    /// thrust factor is acknowledged by the device. Only then are the factors
    /// swapped in and both buffers cleared.
    ///
    /// Overlapping calls run one after the other, so the factor set committed
    /// last is always the one the device acknowledged last.
    pub async fn calibrate(
        &self,
        strategy: Option<CalibrationStrategy>,
        known: KnownValues,
    ) -> Result<CalibrationFactors, CalibrationError> {
        let strategy = strategy.unwrap_or(self.default_strategy);
        strategy.check_known(&known)?;

        let _command = self.session.command_lock().await;
        let raw = match tokio::time::timeout(self.read_timeout, self.sensor.read_raw_reference()).await
        {
            Ok(result) => result?,
            Err(_) => return Err(SensorError::Timeout.into()),
        };
        tracing::debug!(?raw, "Calibration reference reading");

        let factors = strategy.compute(&known, &raw)?;
        self.sensor.write_calibration_factor(factors.thrust()).await?;

        let mut session = self.session.lock().await;
        session.apply_calibration(factors);
        self.session.publish(SessionEvent::Calibrated(factors));
        drop(session);
        tracing::info!(?factors, "Calibration applied");

        Ok(factors)
    }
}
