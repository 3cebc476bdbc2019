// HTTP sensor client for the test-stand firmware
use crate::application::sensor_client::{SensorClient, SensorError};
use crate::domain::numeric::loose_f64;
use crate::domain::telemetry::RawReading;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpSensorClient {
    base_url: String,
    client: reqwest::Client,
}

/// Reading as the firmware sends it. Fields may be numbers or numeric
/// strings; missing or garbled fields become NaN.
#[derive(Debug, Deserialize)]
struct SensorPayload {
    #[serde(default = "missing", deserialize_with = "loose_f64")]
    thrust: f64,
    #[serde(default = "missing", deserialize_with = "loose_f64")]
    voltage: f64,
    #[serde(default = "missing", deserialize_with = "loose_f64")]
    current: f64,
    #[serde(default = "missing", deserialize_with = "loose_f64")]
    rpm: f64,
}

fn missing() -> f64 {
    f64::NAN
}

impl From<SensorPayload> for RawReading {
    fn from(payload: SensorPayload) -> Self {
        RawReading::new(payload.thrust, payload.voltage, payload.current, payload.rpm)
    }
}

impl HttpSensorClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build sensor HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_url(&self, path: &str, value: Option<&str>) -> String {
        match value {
            Some(value) => format!(
                "{}/{}?value={}",
                self.base_url,
                path,
                urlencoding::encode(value)
            ),
            None => format!("{}/{}", self.base_url, path),
        }
    }

    async fn send(&self, path: &str, value: Option<&str>) -> Result<reqwest::Response, SensorError> {
        let url = self.build_url(path, value);
        tracing::trace!("Sensor request: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(SensorError::Rejected(response.status().as_u16()));
        }
        Ok(response)
    }

    async fn read(&self, path: &str) -> Result<RawReading, SensorError> {
        let payload = self
            .send(path, None)
            .await?
            .json::<SensorPayload>()
            .await
            .map_err(transport_error)?;
        Ok(payload.into())
    }
}

fn transport_error(e: reqwest::Error) -> SensorError {
    if e.is_timeout() {
        SensorError::Timeout
    } else if e.is_decode() {
        SensorError::Unreachable(format!("malformed reading: {}", e))
    } else {
        SensorError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl SensorClient for HttpSensorClient {
    async fn read_once(&self) -> Result<RawReading, SensorError> {
        self.read("getData").await
    }

    async fn read_raw_reference(&self) -> Result<RawReading, SensorError> {
        self.read("getRawThrust").await
    }

    async fn write_throttle(&self, value: u16) -> Result<(), SensorError> {
        self.send("setThrottle", Some(value.to_string().as_str())).await?;
        Ok(())
    }

    async fn write_calibration_factor(&self, value: f64) -> Result<(), SensorError> {
        self.send("setCalibrationFactor", Some(value.to_string().as_str())).await?;
        Ok(())
    }

    async fn start_sampling(&self) -> Result<(), SensorError> {
        self.send("startSampling", None).await?;
        Ok(())
    }

    async fn stop_sampling(&self) -> Result<(), SensorError> {
        self.send("stopSampling", None).await?;
        Ok(())
    }
}
