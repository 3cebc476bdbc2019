// Telemetry data domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Digits kept when a value crosses the presentation boundary.
pub const DISPLAY_PRECISION: i32 = 2;

/// One uncalibrated sample from the test stand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawReading {
    pub thrust: f64,
    pub voltage: f64,
    pub current: f64,
    pub rpm: f64,
}

impl RawReading {
    pub fn new(thrust: f64, voltage: f64, current: f64, rpm: f64) -> Self {
        Self {
            thrust,
            voltage,
            current,
            rpm,
        }
    }
}

/// A fully processed sample. Values are kept at full precision; see
/// [`DerivedRecord::display`] for the rounded form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    pub timestamp: DateTime<Utc>,
    pub commanded_throttle: u16,
    pub thrust: f64,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub rpm: f64,
    pub efficiency: f64,
}

impl DerivedRecord {
    pub fn display(&self) -> DisplayRecord {
        DisplayRecord {
            timestamp: self.timestamp,
            throttle: self.commanded_throttle,
            thrust: round_display(self.thrust),
            voltage: round_display(self.voltage),
            current: round_display(self.current),
            power: round_display(self.power),
            rpm: round_display(self.rpm),
            efficiency: round_display(self.efficiency),
        }
    }
}

/// A derived record as charts, tables and printouts see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub timestamp: DateTime<Utc>,
    pub throttle: u16,
    pub thrust: f64,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub rpm: f64,
    pub efficiency: f64,
}

/// Round to [`DISPLAY_PRECISION`] decimals. NaN and infinities pass through.
pub fn round_display(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(DISPLAY_PRECISION);
    (value * scale).round() / scale
}
